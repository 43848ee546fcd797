//! Node Store: draft metadata for every node touched during one invocation.
//!
//! Drafts live in an arena indexed by [`NodeId`]; parents are referenced by
//! id, so the child-to-parent back links never own anything.

use std::collections::HashMap;

use immute_value::{Node, NodeIdentity, NodeKind, Value};
use indexmap::IndexMap;

use crate::copy::shallow_copy;
use crate::error::DraftError;
use crate::key::Key;

pub(crate) type NodeId = usize;

/// One slot of a shallow copy: a plain value or a nested draft.
///
/// `Draft` slots were bound when the child was read, so changes under them
/// are recorded through this slot. `Written` slots hold a draft stored by a
/// recorded write whose forward patch already carries the final value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Entry {
    Value(Value),
    Draft(NodeId),
    Written(NodeId),
}

impl Entry {
    pub(crate) fn as_draft(&self) -> Option<NodeId> {
        match self {
            Entry::Draft(id) | Entry::Written(id) => Some(*id),
            Entry::Value(_) => None,
        }
    }

    /// Same slot content, ignoring how a draft got there.
    pub(crate) fn same(&self, other: &Entry) -> bool {
        match (self.as_draft(), other.as_draft()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self == other,
            _ => false,
        }
    }

    /// A draft moved by a recorded element write becomes a written slot.
    pub(crate) fn into_written(self) -> Entry {
        match self {
            Entry::Draft(id) => Entry::Written(id),
            other => other,
        }
    }
}

/// Editable shallow copy of a node.
///
/// Set members are keyed by identity; a draft member is keyed by its original.
#[derive(Debug, Clone)]
pub(crate) enum Container {
    Object(IndexMap<String, Entry>),
    Array(Vec<Entry>),
    Set(IndexMap<Value, Entry>),
    Map(IndexMap<Value, Entry>),
}

impl Container {
    pub(crate) fn len(&self) -> usize {
        match self {
            Container::Object(map) => map.len(),
            Container::Array(items) => items.len(),
            Container::Set(members) => members.len(),
            Container::Map(entries) => entries.len(),
        }
    }

    pub(crate) fn slot(&self, key: &Key) -> Option<&Entry> {
        match (self, key) {
            (Container::Object(map), Key::Prop(k)) => map.get(k),
            (Container::Array(items), Key::Index(i)) => items.get(*i),
            (Container::Set(members), Key::Entry(k)) => members.get(k),
            (Container::Map(entries), Key::Entry(k)) => entries.get(k),
            _ => None,
        }
    }

    /// Rebinds an existing slot. Absent slots are left alone.
    pub(crate) fn bind(&mut self, key: &Key, entry: Entry) {
        let slot = match (self, key) {
            (Container::Object(map), Key::Prop(k)) => map.get_mut(k),
            (Container::Array(items), Key::Index(i)) => items.get_mut(*i),
            (Container::Set(members), Key::Entry(k)) => members.get_mut(k),
            (Container::Map(entries), Key::Entry(k)) => entries.get_mut(k),
            _ => None,
        };
        if let Some(slot) = slot {
            *slot = entry;
        }
    }

    pub(crate) fn entries(&self) -> Box<dyn Iterator<Item = &Entry> + '_> {
        match self {
            Container::Object(map) => Box::new(map.values()),
            Container::Array(items) => Box::new(items.iter()),
            Container::Set(members) => Box::new(members.values()),
            Container::Map(entries) => Box::new(entries.values()),
        }
    }
}

/// Finalization progress of a draft.
#[derive(Debug, Clone)]
pub(crate) enum Resolution {
    Pending,
    InProgress,
    Done(Node),
}

#[derive(Debug)]
pub(crate) struct DraftNode {
    pub kind: NodeKind,
    pub original: Node,
    pub copy: Option<Container>,
    pub dirty: bool,
    /// Keys written since the node became dirty. `true` for writes, removed
    /// again on delete.
    pub assigned: Option<HashMap<Key, bool>>,
    pub state: Resolution,
    pub parent: Option<NodeId>,
    pub parent_key: Option<Key>,
}

impl DraftNode {
    pub(crate) fn new(original: Node, parent: Option<(NodeId, Key)>) -> Self {
        let (parent, parent_key) = match parent {
            Some((id, key)) => (Some(id), Some(key)),
            None => (None, None),
        };
        Self {
            kind: original.kind(),
            original,
            copy: None,
            dirty: false,
            assigned: None,
            state: Resolution::Pending,
            parent,
            parent_key,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match &self.copy {
            Some(copy) => copy.len(),
            None => self.original.len(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct NodeStore {
    nodes: Vec<DraftNode>,
    by_original: HashMap<NodeIdentity, NodeId>,
}

impl NodeStore {
    pub(crate) fn insert(&mut self, node: DraftNode) -> NodeId {
        let id = self.nodes.len();
        self.by_original.insert(node.original.identity(), id);
        self.nodes.push(node);
        id
    }

    pub(crate) fn lookup(&self, original: &Node) -> Option<NodeId> {
        self.by_original.get(&original.identity()).copied()
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        id < self.nodes.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> &DraftNode {
        &self.nodes[id]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut DraftNode {
        &mut self.nodes[id]
    }

    /// Materializes the shallow copy of `id` if it does not exist yet.
    pub(crate) fn ensure_copy(&mut self, id: NodeId) -> &mut Container {
        let DraftNode { copy, original, .. } = &mut self.nodes[id];
        copy.get_or_insert_with(|| shallow_copy(original))
    }

    pub(crate) fn object_mut(&mut self, id: NodeId) -> Result<&mut IndexMap<String, Entry>, DraftError> {
        match self.ensure_copy(id) {
            Container::Object(map) => Ok(map),
            _ => Err(copy_mismatch(id, NodeKind::Object)),
        }
    }

    pub(crate) fn array_mut(&mut self, id: NodeId) -> Result<&mut Vec<Entry>, DraftError> {
        match self.ensure_copy(id) {
            Container::Array(items) => Ok(items),
            _ => Err(copy_mismatch(id, NodeKind::Array)),
        }
    }

    pub(crate) fn set_mut(&mut self, id: NodeId) -> Result<&mut IndexMap<Value, Entry>, DraftError> {
        match self.ensure_copy(id) {
            Container::Set(members) => Ok(members),
            _ => Err(copy_mismatch(id, NodeKind::Set)),
        }
    }

    pub(crate) fn map_mut(&mut self, id: NodeId) -> Result<&mut IndexMap<Value, Entry>, DraftError> {
        match self.ensure_copy(id) {
            Container::Map(entries) => Ok(entries),
            _ => Err(copy_mismatch(id, NodeKind::Map)),
        }
    }
}

fn copy_mismatch(id: NodeId, expected: NodeKind) -> DraftError {
    DraftError::InvariantViolation(format!("copy of draft {id} is not a {expected}"))
}
