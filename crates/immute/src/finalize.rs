//! Finalizer.
//!
//! Every draft created during an invocation leaves a record here. After the
//! mutation returns the records are processed newest first, so children
//! resolve before the parents that reference them. Resolution is memoized:
//! a draft reachable from several records, or written into several places,
//! resolves to one node.

use std::collections::HashMap;

use immute_value::{Node, NodeData, Value};
use indexmap::{IndexMap, IndexSet};

use crate::draft::Draft;
use crate::error::DraftError;
use crate::key::Key;
use crate::patch::Patch;
use crate::store::{Container, Entry, NodeId, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FinalizeRecord {
    /// A child drafted on read.
    Node(NodeId),
    /// A draft handed out by a container method (`pop`, `shift`, `splice`).
    Derived(NodeId),
    /// A draft written into another slot.
    Escaped(NodeId),
}

#[derive(Debug, Default)]
pub(crate) struct Finalizer {
    records: Vec<FinalizeRecord>,
}

impl Finalizer {
    pub(crate) fn push(&mut self, record: FinalizeRecord) {
        self.records.push(record);
    }
}

pub(crate) struct Finalized {
    pub state: Node,
    pub patches: Option<(Vec<Patch>, Vec<Patch>)>,
}

impl Draft {
    pub(crate) fn finalize(mut self) -> Result<Finalized, DraftError> {
        let records = std::mem::take(&mut self.finalizer.records);
        for record in records.iter().rev() {
            match *record {
                FinalizeRecord::Node(id) | FinalizeRecord::Derived(id) | FinalizeRecord::Escaped(id) => {
                    self.resolve(id)?;
                }
            }
        }
        let state = self.resolve(self.root)?;
        let patches = match self.recorder.take() {
            Some(recorder) => Some(recorder.finish(|entry| self.resolve_entry(entry))?),
            None => None,
        };
        tracing::debug!(
            drafts = self.store.len(),
            records = records.len(),
            patches = patches.as_ref().map_or(0, |(forward, _)| forward.len()),
            changed = !state.ptr_eq(&self.store.get(self.root).original),
            "finalized draft"
        );
        Ok(Finalized { state, patches })
    }

    fn resolve_entry(&mut self, entry: &Entry) -> Result<Value, DraftError> {
        match entry {
            Entry::Value(value) => Ok(value.clone()),
            Entry::Draft(id) | Entry::Written(id) => Ok(Value::Node(self.resolve(*id)?)),
        }
    }

    /// Resolves a draft to its original (untouched, or changed and changed
    /// back) or to a new node built from its copy.
    fn resolve(&mut self, id: NodeId) -> Result<Node, DraftError> {
        let node = self.store.get_mut(id);
        match &node.state {
            Resolution::Done(result) => return Ok(result.clone()),
            Resolution::InProgress => {
                return Err(DraftError::InvariantViolation(format!(
                    "draft {id} was reached again while it was being finalized"
                )))
            }
            Resolution::Pending => {}
        }
        if !node.dirty {
            node.state = Resolution::Done(node.original.clone());
            return Ok(node.original.clone());
        }
        let Some(copy) = node.copy.take() else {
            return Err(DraftError::InvariantViolation(format!("dirty draft {id} has no copy")));
        };
        node.state = Resolution::InProgress;

        let data = match copy {
            Container::Object(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (key, entry) in &map {
                    out.insert(key.clone(), self.resolve_entry(entry)?);
                }
                NodeData::Object(out)
            }
            Container::Array(items) => NodeData::Array(
                items
                    .iter()
                    .map(|entry| self.resolve_entry(entry))
                    .collect::<Result<_, _>>()?,
            ),
            Container::Set(members) => {
                let mut out = IndexSet::with_capacity(members.len());
                for entry in members.values() {
                    out.insert(self.resolve_entry(entry)?);
                }
                NodeData::Set(out)
            }
            Container::Map(entries) => {
                let mut out = IndexMap::with_capacity(entries.len());
                for (key, entry) in &entries {
                    out.insert(key.clone(), self.resolve_entry(entry)?);
                }
                NodeData::Map(out)
            }
        };

        let node = self.store.get_mut(id);
        let result = if unchanged(&node.original, &data, node.assigned.as_ref()) {
            node.original.clone()
        } else {
            Node::new(data)
        };
        tracing::trace!(draft = id, reused = result.ptr_eq(&node.original), "resolved draft");
        node.state = Resolution::Done(result.clone());
        Ok(result)
    }
}

/// Shallow net-effect comparison of resolved content against the original.
///
/// Objects only need their assigned keys checked: any other key that changed
/// either changed the length or is itself assigned.
fn unchanged(original: &Node, data: &NodeData, assigned: Option<&HashMap<Key, bool>>) -> bool {
    let before = original.data();
    if before.len() != data.len() {
        return false;
    }
    match (&*before, data) {
        (NodeData::Object(old), NodeData::Object(new)) => match assigned {
            Some(keys) => keys.keys().all(|key| match key {
                Key::Prop(k) => old.get(k) == new.get(k),
                _ => true,
            }),
            None => new.iter().all(|(k, v)| old.get(k) == Some(v)),
        },
        (NodeData::Array(old), NodeData::Array(new)) => old == new,
        (NodeData::Set(old), NodeData::Set(new)) => new.iter().all(|m| old.contains(m)),
        (NodeData::Map(old), NodeData::Map(new)) => new.iter().all(|(k, v)| old.get(k) == Some(v)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unchanged_objects_compare_assigned_keys() {
        let original = Node::from_json(&json!({"a": 1, "b": 2})).unwrap();
        let same = NodeData::Object(
            [("b".to_string(), Value::from(2)), ("a".to_string(), Value::from(1))]
                .into_iter()
                .collect(),
        );
        let mut assigned = HashMap::new();
        assigned.insert(Key::from("a"), true);
        assert!(unchanged(&original, &same, Some(&assigned)));
        let changed = NodeData::Object(
            [("a".to_string(), Value::from(5)), ("b".to_string(), Value::from(2))]
                .into_iter()
                .collect(),
        );
        assert!(!unchanged(&original, &changed, Some(&assigned)));
    }

    #[test]
    fn arrays_compare_element_identity() {
        let child = Value::from(Node::object());
        let original = Node::array_from([child.clone()]);
        assert!(unchanged(&original, &NodeData::Array(vec![child]), None));
        assert!(!unchanged(
            &original,
            &NodeData::Array(vec![Value::from(Node::object())]),
            None
        ));
    }

    #[test]
    fn sets_and_maps_compare_membership() {
        let set = Node::set_from([Value::from(1), Value::from(2)]);
        let reordered = NodeData::Set([Value::from(2), Value::from(1)].into_iter().collect());
        assert!(unchanged(&set, &reordered, None));
        let map = Node::map_from([(Value::from(1), Value::from("a"))]);
        let other = NodeData::Map([(Value::from(1), Value::from("b"))].into_iter().collect());
        assert!(!unchanged(&map, &other, None));
    }
}
