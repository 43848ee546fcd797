use std::collections::HashSet;

use crate::node::Node;
use crate::value::Value;

/// Freezes every node reachable from `value`.
///
/// Nodes for which `skip` returns `true` are left writable and not descended
/// into. Each node is visited once, so caller-built cycles are fine.
pub fn freeze_deep(value: &Value, skip: &dyn Fn(&Node) -> bool) {
    let mut seen = HashSet::new();
    let mut stack: Vec<Node> = value.as_node().cloned().into_iter().collect();
    while let Some(node) = stack.pop() {
        if !seen.insert(node.identity()) || skip(&node) {
            continue;
        }
        node.freeze();
        stack.extend(node.data().children().into_iter().filter_map(Value::into_node));
    }
}
