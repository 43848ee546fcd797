//! Shared object-graph nodes.
//!
//! A [`Node`] is a reference-counted container (object, array, set or map)
//! whose identity is its allocation. Cloning a `Node` clones the reference,
//! never the content, which is what makes structural sharing observable:
//! two positions hold "the same" subtree exactly when [`Node::ptr_eq`] says so.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use crate::error::NodeError;
use crate::value::Value;

/// Container flavor of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Object,
    Array,
    Set,
    Map,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Object => "object",
            NodeKind::Array => "array",
            NodeKind::Set => "set",
            NodeKind::Map => "map",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content of a node. Every flavor keeps insertion order.
#[derive(Debug, Clone)]
pub enum NodeData {
    Object(IndexMap<String, Value>),
    Array(Vec<Value>),
    Set(IndexSet<Value>),
    Map(IndexMap<Value, Value>),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Object(_) => NodeKind::Object,
            NodeData::Array(_) => NodeKind::Array,
            NodeData::Set(_) => NodeKind::Set,
            NodeData::Map(_) => NodeKind::Map,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            NodeData::Object(map) => map.len(),
            NodeData::Array(items) => items.len(),
            NodeData::Set(members) => members.len(),
            NodeData::Map(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every value directly held by this node (map keys included).
    pub fn children(&self) -> Vec<Value> {
        match self {
            NodeData::Object(map) => map.values().cloned().collect(),
            NodeData::Array(items) => items.clone(),
            NodeData::Set(members) => members.iter().cloned().collect(),
            NodeData::Map(entries) => entries
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect(),
        }
    }
}

/// Stable identity of a node for the lifetime of its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdentity(usize);

struct Inner {
    data: RefCell<NodeData>,
    frozen: Cell<bool>,
}

/// A reference to a shared container.
#[derive(Clone)]
pub struct Node(Rc<Inner>);

impl Node {
    pub fn new(data: NodeData) -> Self {
        Node(Rc::new(Inner {
            data: RefCell::new(data),
            frozen: Cell::new(false),
        }))
    }

    pub fn object() -> Self {
        Self::new(NodeData::Object(IndexMap::new()))
    }

    pub fn array() -> Self {
        Self::new(NodeData::Array(Vec::new()))
    }

    pub fn set() -> Self {
        Self::new(NodeData::Set(IndexSet::new()))
    }

    pub fn map() -> Self {
        Self::new(NodeData::Map(IndexMap::new()))
    }

    pub fn object_from<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::new(NodeData::Object(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn array_from<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Self::new(NodeData::Array(items.into_iter().collect()))
    }

    pub fn set_from<I: IntoIterator<Item = Value>>(members: I) -> Self {
        Self::new(NodeData::Set(members.into_iter().collect()))
    }

    pub fn map_from<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Self {
        Self::new(NodeData::Map(entries.into_iter().collect()))
    }

    /// `true` when both references point at the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity(Rc::as_ptr(&self.0) as usize)
    }

    pub fn kind(&self) -> NodeKind {
        self.0.data.borrow().kind()
    }

    /// Read access to the node content.
    ///
    /// Writes through this node fail with [`NodeError::Borrowed`] while the
    /// guard is alive.
    pub fn data(&self) -> Ref<'_, NodeData> {
        self.0.data.borrow()
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.0.frozen.get()
    }

    /// Shallow freeze. See [`crate::freeze_deep`] for the recursive variant.
    pub fn freeze(&self) {
        self.0.frozen.set(true);
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// Object member.
    pub fn get(&self, key: &str) -> Option<Value> {
        match &*self.data() {
            NodeData::Object(map) => map.get(key).cloned(),
            _ => None,
        }
    }

    /// Array element.
    pub fn at(&self, index: usize) -> Option<Value> {
        match &*self.data() {
            NodeData::Array(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    /// Map entry.
    pub fn map_get(&self, key: &Value) -> Option<Value> {
        match &*self.data() {
            NodeData::Map(entries) => entries.get(key).cloned(),
            _ => None,
        }
    }

    /// Set membership or map key presence.
    pub fn contains(&self, value: &Value) -> bool {
        match &*self.data() {
            NodeData::Set(members) => members.contains(value),
            NodeData::Map(entries) => entries.contains_key(value),
            _ => false,
        }
    }

    /// Object keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        match &*self.data() {
            NodeData::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Array elements, set members or map values, in order.
    pub fn values(&self) -> Vec<Value> {
        match &*self.data() {
            NodeData::Object(map) => map.values().cloned().collect(),
            NodeData::Array(items) => items.clone(),
            NodeData::Set(members) => members.iter().cloned().collect(),
            NodeData::Map(entries) => entries.values().cloned().collect(),
        }
    }

    /// Object member that is itself a node.
    pub fn child(&self, key: &str) -> Option<Node> {
        self.get(key).and_then(|v| v.as_node().cloned())
    }

    /// Array element that is itself a node.
    pub fn child_at(&self, index: usize) -> Option<Node> {
        self.at(index).and_then(|v| v.as_node().cloned())
    }

    // ── Writes ────────────────────────────────────────────────────────────

    fn write(&self) -> Result<RefMut<'_, NodeData>, NodeError> {
        let data = self.0.data.try_borrow_mut().map_err(|_| NodeError::Borrowed)?;
        if self.is_frozen() {
            return Err(NodeError::FrozenWriteViolation { kind: data.kind() });
        }
        Ok(data)
    }

    /// Object member write. Returns the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>, NodeError> {
        match &mut *self.write()? {
            NodeData::Object(map) => Ok(map.insert(key.into(), value.into())),
            other => Err(mismatch(NodeKind::Object, other)),
        }
    }

    /// Object member removal.
    pub fn remove(&self, key: &str) -> Result<Option<Value>, NodeError> {
        match &mut *self.write()? {
            NodeData::Object(map) => Ok(map.shift_remove(key)),
            other => Err(mismatch(NodeKind::Object, other)),
        }
    }

    /// Array append. Returns the new length.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize, NodeError> {
        match &mut *self.write()? {
            NodeData::Array(items) => {
                items.push(value.into());
                Ok(items.len())
            }
            other => Err(mismatch(NodeKind::Array, other)),
        }
    }

    pub fn pop(&self) -> Result<Option<Value>, NodeError> {
        match &mut *self.write()? {
            NodeData::Array(items) => Ok(items.pop()),
            other => Err(mismatch(NodeKind::Array, other)),
        }
    }

    /// Array element write; writing past the end pads with `Null`.
    pub fn set_at(&self, index: usize, value: impl Into<Value>) -> Result<Option<Value>, NodeError> {
        match &mut *self.write()? {
            NodeData::Array(items) => {
                if index < items.len() {
                    return Ok(Some(std::mem::replace(&mut items[index], value.into())));
                }
                items.resize(index, Value::Null);
                items.push(value.into());
                Ok(None)
            }
            other => Err(mismatch(NodeKind::Array, other)),
        }
    }

    /// Set insertion. Returns `false` when the member was already present.
    pub fn add(&self, value: impl Into<Value>) -> Result<bool, NodeError> {
        match &mut *self.write()? {
            NodeData::Set(members) => Ok(members.insert(value.into())),
            other => Err(mismatch(NodeKind::Set, other)),
        }
    }

    /// Set removal.
    pub fn delete(&self, value: &Value) -> Result<bool, NodeError> {
        match &mut *self.write()? {
            NodeData::Set(members) => Ok(members.shift_remove(value)),
            other => Err(mismatch(NodeKind::Set, other)),
        }
    }

    pub fn map_insert(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<Option<Value>, NodeError> {
        match &mut *self.write()? {
            NodeData::Map(entries) => Ok(entries.insert(key.into(), value.into())),
            other => Err(mismatch(NodeKind::Map, other)),
        }
    }

    pub fn map_remove(&self, key: &Value) -> Result<Option<Value>, NodeError> {
        match &mut *self.write()? {
            NodeData::Map(entries) => Ok(entries.shift_remove(key)),
            other => Err(mismatch(NodeKind::Map, other)),
        }
    }

    /// Empties the node whatever its kind.
    pub fn clear(&self) -> Result<(), NodeError> {
        match &mut *self.write()? {
            NodeData::Object(map) => map.clear(),
            NodeData::Array(items) => items.clear(),
            NodeData::Set(members) => members.clear(),
            NodeData::Map(entries) => entries.clear(),
        }
        Ok(())
    }
}

fn mismatch(expected: NodeKind, found: &NodeData) -> NodeError {
    NodeError::KindMismatch { expected, found: found.kind() }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.data.try_borrow() {
            Ok(data) => match &*data {
                NodeData::Object(map) => f.debug_map().entries(map.iter()).finish(),
                NodeData::Array(items) => f.debug_list().entries(items.iter()).finish(),
                NodeData::Set(members) => f.debug_set().entries(members.iter()).finish(),
                NodeData::Map(entries) => f.debug_map().entries(entries.iter()).finish(),
            },
            Err(_) => f.write_str("<borrowed node>"),
        }
    }
}
