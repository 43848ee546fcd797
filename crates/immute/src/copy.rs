//! Shallow-Copy Policy.

use immute_value::{Node, NodeData};

use crate::store::{Container, Entry};

/// One-level duplicate of `original`. Nested nodes stay shared.
pub(crate) fn shallow_copy(original: &Node) -> Container {
    match &*original.data() {
        NodeData::Object(map) => Container::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), Entry::Value(v.clone())))
                .collect(),
        ),
        NodeData::Array(items) => {
            Container::Array(items.iter().cloned().map(Entry::Value).collect())
        }
        NodeData::Set(members) => Container::Set(
            members
                .iter()
                .map(|m| (m.clone(), Entry::Value(m.clone())))
                .collect(),
        ),
        NodeData::Map(entries) => Container::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), Entry::Value(v.clone())))
                .collect(),
        ),
    }
}
