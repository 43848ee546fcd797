use serde_json::Number;

use crate::node::{Node, NodeKind};

/// A value stored in the object graph.
///
/// Primitives compare by value. Nodes compare by identity, which makes
/// `PartialEq` the `===` of the graph and lets any value key a set or map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Node(Node),
}

impl Value {
    /// Number value with integral floats stored as integers, so `1.0` and `1`
    /// are one set member or map key. `-0.0` becomes `0`.
    pub fn number(n: Number) -> Value {
        match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 => Value::Number(integral(f).unwrap_or(n)),
            _ => Value::Number(n),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Value::Node(_))
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn into_node(self) -> Option<Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.as_node().map(Node::kind)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(node)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    /// Non-finite floats become `Null`, as in `serde_json`.
    fn from(f: f64) -> Self {
        Number::from_f64(f).map(Value::number).unwrap_or(Value::Null)
    }
}

fn integral(f: f64) -> Option<Number> {
    if (0.0..18_446_744_073_709_551_616.0).contains(&f) {
        Some(Number::from(f as u64))
    } else if (-9_223_372_036_854_775_808.0..0.0).contains(&f) {
        Some(Number::from(f as i64))
    } else {
        None
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_compare_by_value() {
        assert_eq!(Value::from("a"), Value::from("a".to_string()));
        assert_eq!(Value::from(1), Value::from(1u64));
        assert_ne!(Value::from(1), Value::from(1.5));
    }

    #[test]
    fn nodes_compare_by_identity() {
        let a = Node::object();
        assert_eq!(Value::from(a.clone()), Value::from(a));
        assert_ne!(Value::from(Node::object()), Value::from(Node::object()));
    }

    #[test]
    fn integral_floats_are_integers() {
        assert_eq!(Value::from(1.0), Value::from(1));
        assert_eq!(Value::from(-0.0), Value::from(0));
        assert_eq!(Value::from(-3.0), Value::from(-3i64));
        assert_eq!(Value::from(1.0).as_u64(), Some(1));
        assert_ne!(Value::from(1.5), Value::from(1));
        assert_eq!(Value::from(1e300).as_f64(), Some(1e300));
    }

    #[test]
    fn non_finite_float_is_null() {
        assert!(Value::from(f64::NAN).is_null());
    }
}
