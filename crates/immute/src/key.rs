use std::fmt;

use immute_value::Value;

/// Address of one member inside a draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Object property.
    Prop(String),
    /// Array element.
    Index(usize),
    /// Array length.
    Length,
    /// Map key or set member.
    Entry(Value),
}

impl Key {
    pub fn as_prop(&self) -> Option<&str> {
        match self {
            Key::Prop(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Prop(s) => f.write_str(s),
            Key::Index(i) => write!(f, "{i}"),
            Key::Length => f.write_str("length"),
            Key::Entry(v) => write!(f, "{}", v.to_json()),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Prop(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Prop(s)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

impl From<Value> for Key {
    fn from(v: Value) -> Self {
        Key::Entry(v)
    }
}

/// Renders a path as `/a/0/length`.
pub(crate) fn format_path(path: &[Key]) -> String {
    let mut out = String::new();
    for key in path {
        out.push('/');
        out.push_str(&key.to_string());
    }
    out
}
