use crate::node::NodeData;
use crate::value::Value;

/// Deep equality of observable shape.
///
/// - Primitives compare by value; identical nodes are equal without descent.
/// - Arrays compare element by element, in order.
/// - Objects and maps compare key by key, regardless of insertion order.
///   Map keys are matched by identity, like lookups are.
/// - Sets compare by membership: every member of `a` must have an identical
///   or deep-equal member in `b`.
///
/// Graphs with cycles that are not shared by identity do not terminate.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Node(na), Value::Node(nb)) => {
            if na.ptr_eq(nb) {
                return true;
            }
            let (da, db) = (na.data(), nb.data());
            data_equal(&da, &db)
        }
        _ => a == b,
    }
}

fn data_equal(a: &NodeData, b: &NodeData) -> bool {
    if a.len() != b.len() {
        return false;
    }
    match (a, b) {
        (NodeData::Array(xs), NodeData::Array(ys)) => {
            xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (NodeData::Object(xs), NodeData::Object(ys)) => xs
            .iter()
            .all(|(k, x)| ys.get(k).is_some_and(|y| deep_equal(x, y))),
        (NodeData::Map(xs), NodeData::Map(ys)) => xs
            .iter()
            .all(|(k, x)| ys.get(k).is_some_and(|y| deep_equal(x, y))),
        (NodeData::Set(xs), NodeData::Set(ys)) => xs
            .iter()
            .all(|x| ys.contains(x) || ys.iter().any(|y| deep_equal(x, y))),
        _ => false,
    }
}
