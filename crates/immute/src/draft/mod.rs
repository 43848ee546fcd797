//! Interception Layer.
//!
//! A [`Draft`] is the context of one `create` invocation. Callers never touch
//! nodes of the original graph directly; they address them through
//! [`DraftRef`] handles and every read, write and container method goes
//! through the context, which copies lazily, records patches and propagates
//! changes to the root.

mod array;
mod map;
mod object;
mod set;

pub use array::{default_order, ArrayDraft};
pub use map::MapDraft;
pub use object::ObjectDraft;
pub use set::SetDraft;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use immute_value::{Node, NodeData, NodeKind, Value};

use crate::error::DraftError;
use crate::finalize::{FinalizeRecord, Finalizer};
use crate::key::Key;
use crate::options::{CreateOptions, MutablePredicate};
use crate::patch::{PatchRecorder, Recorded};
use crate::store::{Container, DraftNode, Entry, NodeId, NodeStore};

static NEXT_SCOPE: AtomicU64 = AtomicU64::new(1);

/// Handle to one draft node. Only valid with the [`Draft`] that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DraftRef {
    scope: u64,
    id: NodeId,
}

/// What reads return and writes accept: a nested draft or a plain value.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftValue {
    Draft(DraftRef),
    Value(Value),
}

impl DraftValue {
    pub fn as_draft(&self) -> Option<DraftRef> {
        match self {
            DraftValue::Draft(r) => Some(*r),
            DraftValue::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            DraftValue::Value(v) => Some(v),
            DraftValue::Draft(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            DraftValue::Value(v) => Some(v),
            DraftValue::Draft(_) => None,
        }
    }
}

impl From<DraftRef> for DraftValue {
    fn from(r: DraftRef) -> Self {
        DraftValue::Draft(r)
    }
}

impl From<Value> for DraftValue {
    fn from(v: Value) -> Self {
        DraftValue::Value(v)
    }
}

macro_rules! impl_from_plain {
    ($($t:ty),*) => {
        $(
            impl From<$t> for DraftValue {
                fn from(v: $t) -> Self {
                    DraftValue::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_from_plain!(Node, bool, &str, String, f64, i32, i64, u32, u64, usize);

/// Answer to an own-property query on a draft.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub value: DraftValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

/// Per-invocation draft context: Node Store, finalize records and the
/// optional patch recorder.
pub struct Draft {
    pub(crate) scope: u64,
    pub(crate) root: NodeId,
    pub(crate) store: NodeStore,
    pub(crate) finalizer: Finalizer,
    pub(crate) recorder: Option<PatchRecorder>,
    mutable: Option<MutablePredicate>,
    /// Nodes the caller wrote in as plain values. They are handed back as-is.
    introduced: HashSet<Node>,
    /// Set while replaying patches: written nodes stay draftable so later
    /// patches can reach into them.
    adopt_written: bool,
}

impl Draft {
    pub(crate) fn new(base: Node, options: &CreateOptions) -> Self {
        let mut store = NodeStore::default();
        let root = store.insert(DraftNode::new(base, None));
        Self {
            scope: NEXT_SCOPE.fetch_add(1, Ordering::Relaxed),
            root,
            store,
            finalizer: Finalizer::default(),
            recorder: options.enable_patches.then(PatchRecorder::default),
            mutable: options.mutable.clone(),
            introduced: HashSet::new(),
            adopt_written: false,
        }
    }

    pub(crate) fn replaying(mut self) -> Self {
        self.adopt_written = true;
        self
    }

    /// Handle of the root node.
    pub fn root(&self) -> DraftRef {
        self.handle(self.root)
    }

    pub fn kind(&self, target: DraftRef) -> Result<NodeKind, DraftError> {
        let id = self.id_of(target)?;
        Ok(self.store.get(id).kind)
    }

    /// `true` once the node or one of its descendants has been changed.
    pub fn is_modified(&self, target: DraftRef) -> Result<bool, DraftError> {
        let id = self.id_of(target)?;
        Ok(self.store.get(id).dirty)
    }

    /// The pristine node the draft was created over.
    pub fn original(&self, target: DraftRef) -> Result<Node, DraftError> {
        let id = self.id_of(target)?;
        Ok(self.store.get(id).original.clone())
    }

    /// Materialized snapshot of the draft's current logical value.
    ///
    /// Unmodified drafts return their original; modified ones return fresh
    /// nodes that later writes do not affect.
    pub fn current(&self, target: DraftRef) -> Result<Node, DraftError> {
        let id = self.id_of(target)?;
        Ok(self.snapshot(id))
    }

    pub fn len(&self, target: DraftRef) -> Result<usize, DraftError> {
        let id = self.id_of(target)?;
        Ok(self.store.get(id).len())
    }

    pub fn is_empty(&self, target: DraftRef) -> Result<bool, DraftError> {
        Ok(self.len(target)? == 0)
    }

    /// Member read. Nested nodes come back as drafts.
    pub fn get(&mut self, target: DraftRef, key: impl Into<Key>) -> Result<Option<DraftValue>, DraftError> {
        let id = self.id_of(target)?;
        self.read(id, &key.into())
    }

    /// Member write, dispatched on the draft kind.
    pub fn set(
        &mut self,
        target: DraftRef,
        key: impl Into<Key>,
        value: impl Into<DraftValue>,
    ) -> Result<(), DraftError> {
        let id = self.id_of(target)?;
        let kind = self.store.get(id).kind;
        match (kind, key.into()) {
            (NodeKind::Object, Key::Prop(k)) => self.object_set(id, k, value.into()),
            (NodeKind::Array, Key::Index(i)) => self.array_set(id, i, value.into()),
            (NodeKind::Array, Key::Length) => {
                let len = length_arg(&value.into())?;
                self.array_set_len(id, len)
            }
            (NodeKind::Map, Key::Entry(k)) => self.map_set(id, k, value.into()),
            (NodeKind::Set, _) => Err(DraftError::UnsupportedOperation("set members are written with add")),
            (kind, key) => Err(DraftError::InvalidKey { kind, key }),
        }
    }

    /// Member delete. Returns `false` when there was nothing to delete.
    pub fn delete(&mut self, target: DraftRef, key: impl Into<Key>) -> Result<bool, DraftError> {
        let id = self.id_of(target)?;
        let kind = self.store.get(id).kind;
        match (kind, key.into()) {
            (NodeKind::Object, Key::Prop(k)) => self.object_delete(id, k),
            (NodeKind::Array, Key::Index(i)) => self.array_delete(id, i),
            (NodeKind::Array, Key::Length) => Err(DraftError::UnsupportedOperation("array length cannot be deleted")),
            (NodeKind::Map, Key::Entry(k)) => self.map_delete(id, k),
            (NodeKind::Set, Key::Entry(v)) => self.set_delete(id, DraftValue::Value(v)),
            (kind, key) => Err(DraftError::InvalidKey { kind, key }),
        }
    }

    /// Existence check against the current logical value.
    pub fn has(&self, target: DraftRef, key: impl Into<Key>) -> Result<bool, DraftError> {
        let id = self.id_of(target)?;
        let key = key.into();
        self.check_key(id, &key)?;
        Ok(key == Key::Length || self.entry_at(id, &key).is_some())
    }

    /// Keys in order: properties, indices, map keys or set members.
    pub fn keys(&self, target: DraftRef) -> Result<Vec<Key>, DraftError> {
        let id = self.id_of(target)?;
        let node = self.store.get(id);
        let keys = match &node.copy {
            Some(Container::Object(map)) => map.keys().cloned().map(Key::Prop).collect(),
            Some(Container::Array(items)) => (0..items.len()).map(Key::Index).collect(),
            Some(Container::Set(entries) | Container::Map(entries)) => {
                entries.keys().cloned().map(Key::Entry).collect()
            }
            None => match &*node.original.data() {
                NodeData::Object(map) => map.keys().cloned().map(Key::Prop).collect(),
                NodeData::Array(items) => (0..items.len()).map(Key::Index).collect(),
                NodeData::Set(members) => members.iter().cloned().map(Key::Entry).collect(),
                NodeData::Map(entries) => entries.keys().cloned().map(Key::Entry).collect(),
            },
        };
        Ok(keys)
    }

    /// Own-property query. Array `length` is the only non-configurable,
    /// non-enumerable member.
    pub fn descriptor(
        &mut self,
        target: DraftRef,
        key: impl Into<Key>,
    ) -> Result<Option<PropertyDescriptor>, DraftError> {
        let id = self.id_of(target)?;
        let key = key.into();
        let fixed = key == Key::Length;
        Ok(self.read(id, &key)?.map(|value| PropertyDescriptor {
            value,
            writable: true,
            enumerable: !fixed,
            configurable: !fixed,
        }))
    }

    /// Nested draft under `key`.
    pub fn child(&mut self, target: DraftRef, key: impl Into<Key>) -> Result<DraftRef, DraftError> {
        let key = key.into();
        match self.get(target, key.clone())? {
            Some(DraftValue::Draft(child)) => Ok(child),
            _ => Err(DraftError::NotDraftable(key)),
        }
    }

    /// Nested draft reached by walking `path` from `target`.
    pub fn child_at(&mut self, target: DraftRef, path: &[Key]) -> Result<DraftRef, DraftError> {
        path.iter()
            .try_fold(target, |current, key| self.child(current, key.clone()))
    }

    /// Drafts keep the prototype of their original.
    pub fn set_prototype(&mut self, target: DraftRef, _prototype: Option<Node>) -> Result<(), DraftError> {
        self.id_of(target)?;
        Err(DraftError::UnsupportedOperation("setting the prototype of a draft"))
    }

    /// Descriptor-based definition is not a draft operation; use [`Draft::set`].
    pub fn define_property(
        &mut self,
        target: DraftRef,
        _key: impl Into<Key>,
        _descriptor: PropertyDescriptor,
    ) -> Result<(), DraftError> {
        self.id_of(target)?;
        Err(DraftError::UnsupportedOperation("defining a property on a draft"))
    }

    pub fn object(&mut self, target: DraftRef) -> Result<ObjectDraft<'_>, DraftError> {
        let id = self.expect_kind(target, NodeKind::Object)?;
        Ok(ObjectDraft::new(self, id))
    }

    pub fn array(&mut self, target: DraftRef) -> Result<ArrayDraft<'_>, DraftError> {
        let id = self.expect_kind(target, NodeKind::Array)?;
        Ok(ArrayDraft::new(self, id))
    }

    pub fn set_view(&mut self, target: DraftRef) -> Result<SetDraft<'_>, DraftError> {
        let id = self.expect_kind(target, NodeKind::Set)?;
        Ok(SetDraft::new(self, id))
    }

    pub fn map(&mut self, target: DraftRef) -> Result<MapDraft<'_>, DraftError> {
        let id = self.expect_kind(target, NodeKind::Map)?;
        Ok(MapDraft::new(self, id))
    }

    // ── Internals shared by the typed views ──────────────────────────────

    pub(crate) fn handle(&self, id: NodeId) -> DraftRef {
        DraftRef { scope: self.scope, id }
    }

    pub(crate) fn id_of(&self, target: DraftRef) -> Result<NodeId, DraftError> {
        if target.scope != self.scope || !self.store.contains(target.id) {
            return Err(DraftError::ForeignHandle);
        }
        Ok(target.id)
    }

    fn expect_kind(&self, target: DraftRef, expected: NodeKind) -> Result<NodeId, DraftError> {
        let id = self.id_of(target)?;
        let found = self.store.get(id).kind;
        if found != expected {
            return Err(DraftError::KindMismatch { expected, found });
        }
        Ok(id)
    }

    fn check_key(&self, id: NodeId, key: &Key) -> Result<(), DraftError> {
        let kind = self.store.get(id).kind;
        let valid = matches!(
            (kind, key),
            (NodeKind::Object, Key::Prop(_))
                | (NodeKind::Array, Key::Index(_) | Key::Length)
                | (NodeKind::Set | NodeKind::Map, Key::Entry(_))
        );
        if !valid {
            return Err(DraftError::InvalidKey { kind, key: key.clone() });
        }
        Ok(())
    }

    fn is_mutable(&self, node: &Node) -> bool {
        self.mutable.as_ref().is_some_and(|m| m(node))
    }

    /// Current slot content without wrapping.
    pub(crate) fn entry_at(&self, id: NodeId, key: &Key) -> Option<Entry> {
        let node = self.store.get(id);
        if let Some(copy) = &node.copy {
            return copy.slot(key).cloned();
        }
        let original = &node.original;
        let value = match key {
            Key::Prop(k) => original.get(k),
            Key::Index(i) => original.at(*i),
            Key::Entry(k) => match node.kind {
                NodeKind::Map => original.map_get(k),
                NodeKind::Set => original.contains(k).then(|| k.clone()),
                _ => None,
            },
            Key::Length => None,
        };
        value.map(Entry::Value)
    }

    pub(crate) fn read(&mut self, id: NodeId, key: &Key) -> Result<Option<DraftValue>, DraftError> {
        self.check_key(id, key)?;
        if *key == Key::Length {
            let len = self.store.get(id).len();
            return Ok(Some(DraftValue::Value(Value::from(len))));
        }
        Ok(self
            .entry_at(id, key)
            .map(|entry| self.wrap_member(id, key, entry)))
    }

    fn draftable(&self, node: &Node) -> bool {
        !self.introduced.contains(node) && !self.is_mutable(node)
    }

    /// Turns a slot read from `host` into what the caller sees, drafting
    /// nested nodes on first access.
    ///
    /// A node that already has a draft returns that draft and the slot is not
    /// rebound: the first parent link stays the canonical owner. Set members
    /// are drafted under their own identity.
    fn wrap_member(&mut self, host: NodeId, key: &Key, entry: Entry) -> DraftValue {
        let node = match entry {
            Entry::Draft(id) | Entry::Written(id) => return DraftValue::Draft(self.handle(id)),
            Entry::Value(Value::Node(node)) if self.draftable(&node) => node,
            Entry::Value(value) => return DraftValue::Value(value),
        };
        if let Some(existing) = self.store.lookup(&node) {
            return DraftValue::Draft(self.handle(existing));
        }
        let child = self.store.insert(DraftNode::new(node, Some((host, key.clone()))));
        self.store.ensure_copy(host).bind(key, Entry::Draft(child));
        self.finalizer.push(FinalizeRecord::Node(child));
        tracing::trace!(draft = child, parent = host, key = %key, "drafted child node");
        DraftValue::Draft(self.handle(child))
    }

    /// Wraps a value a container method removed from `host`. Nested nodes
    /// become drafts with no parent link.
    pub(crate) fn detach_member(&mut self, host: NodeId, entry: Entry) -> DraftValue {
        let id = match entry {
            Entry::Draft(id) | Entry::Written(id) => id,
            Entry::Value(Value::Node(node)) if self.draftable(&node) => {
                match self.store.lookup(&node) {
                    Some(existing) => existing,
                    None => self.store.insert(DraftNode::new(node, None)),
                }
            }
            Entry::Value(value) => return DraftValue::Value(value),
        };
        self.finalizer.push(FinalizeRecord::Derived(id));
        tracing::trace!(draft = id, from = host, "derived draft from container method");
        DraftValue::Draft(self.handle(id))
    }

    /// Converts a written value into a slot entry.
    ///
    /// Drafts become [`Entry::Written`] slots. They are rejected when `host`
    /// lies inside their own subtree.
    pub(crate) fn admit(&self, host: NodeId, value: DraftValue) -> Result<Entry, DraftError> {
        match value {
            DraftValue::Value(value) => Ok(Entry::Value(value)),
            DraftValue::Draft(target) => {
                let id = self.id_of(target)?;
                if self.reaches(id, host) {
                    return Err(DraftError::UnsupportedOperation("assigning a draft into its own subtree"));
                }
                Ok(Entry::Written(id))
            }
        }
    }

    fn reaches(&self, from: NodeId, target: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(copy) = &self.store.get(id).copy {
                stack.extend(copy.entries().filter_map(Entry::as_draft));
            }
        }
        false
    }

    /// Bookkeeping after `entry` was stored into `host`: drafts get an escape
    /// record, plain nodes become caller-owned unless patches are replaying.
    pub(crate) fn note_written(&mut self, host: NodeId, entry: &Entry) {
        match entry {
            Entry::Draft(draft) | Entry::Written(draft) => {
                tracing::trace!(draft = *draft, host, "draft written into another slot");
                self.finalizer.push(FinalizeRecord::Escaped(*draft));
            }
            Entry::Value(Value::Node(node)) if !self.adopt_written && self.store.lookup(node).is_none() => {
                self.introduced.insert(node.clone());
            }
            Entry::Value(_) => {}
        }
    }

    pub(crate) fn mark_changed(&mut self, id: NodeId, key: Option<Key>) {
        let node = self.store.get_mut(id);
        node.dirty = true;
        let assigned = node.assigned.get_or_insert_with(HashMap::new);
        if let Some(key) = key {
            assigned.insert(key, true);
        }
    }

    pub(crate) fn unassign(&mut self, id: NodeId, key: &Key) {
        if let Some(assigned) = self.store.get_mut(id).assigned.as_mut() {
            assigned.remove(key);
        }
    }

    /// Appends a forward/inverse pair. `build` only runs when patches are on.
    pub(crate) fn record(&mut self, build: impl FnOnce(&Self) -> (Recorded, Recorded)) {
        self.record_all(|d| vec![build(d)]);
    }

    /// Appends the pairs of one mutation; propagation prefixes all of them.
    pub(crate) fn record_all(&mut self, build: impl FnOnce(&Self) -> Vec<(Recorded, Recorded)>) {
        if self.recorder.is_none() {
            return;
        }
        let pairs = build(self);
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.push_all(pairs);
        }
    }

    pub(crate) fn snapshot(&self, id: NodeId) -> Node {
        let node = self.store.get(id);
        let copy = match &node.copy {
            Some(copy) if node.dirty => copy,
            _ => return node.original.clone(),
        };
        let data = match copy {
            Container::Object(map) => NodeData::Object(
                map.iter()
                    .map(|(k, e)| (k.clone(), self.snapshot_entry(e)))
                    .collect(),
            ),
            Container::Array(items) => {
                NodeData::Array(items.iter().map(|e| self.snapshot_entry(e)).collect())
            }
            Container::Set(members) => {
                NodeData::Set(members.values().map(|e| self.snapshot_entry(e)).collect())
            }
            Container::Map(entries) => NodeData::Map(
                entries
                    .iter()
                    .map(|(k, e)| (k.clone(), self.snapshot_entry(e)))
                    .collect(),
            ),
        };
        Node::new(data)
    }

    pub(crate) fn snapshot_entry(&self, entry: &Entry) -> Value {
        match entry {
            Entry::Value(value) => value.clone(),
            Entry::Draft(id) | Entry::Written(id) => Value::Node(self.snapshot(*id)),
        }
    }

    /// Like [`Draft::snapshot_entry`], wrapped back into an entry for a
    /// recorded patch argument.
    pub(crate) fn snapshot_arg(&self, entry: &Entry) -> Entry {
        Entry::Value(self.snapshot_entry(entry))
    }

    /// Identity of a set member as the set stores it.
    pub(crate) fn member_key(&self, value: &DraftValue) -> Result<Value, DraftError> {
        match value {
            DraftValue::Draft(target) => {
                let id = self.id_of(*target)?;
                Ok(Value::Node(self.store.get(id).original.clone()))
            }
            DraftValue::Value(value) => Ok(value.clone()),
        }
    }
}

fn length_arg(value: &DraftValue) -> Result<usize, DraftError> {
    value
        .as_value()
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or(DraftError::UnsupportedOperation("array length must be a non-negative integer"))
}
