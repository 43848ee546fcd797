//! Change Propagation.

use immute_value::NodeKind;

use crate::draft::Draft;
use crate::error::DraftError;
use crate::key::Key;
use crate::store::{Container, Entry, NodeId};

impl Draft {
    /// Marks every ancestor of `id` dirty and threads the parent keys into the
    /// paths of the most recent mutation's patch pairs.
    ///
    /// Only slots bound on read carry the chain. If a draft no longer sits in
    /// such a slot, the mutation happened on a detached subtree, or on one
    /// that a recorded write already carries in full: the pairs are dropped
    /// and propagation stops.
    pub(crate) fn propagate(&mut self, id: NodeId) -> Result<(), DraftError> {
        let mut current = id;
        loop {
            let node = self.store.get(current);
            let Some(parent) = node.parent else {
                if current != self.root {
                    self.detached(id, current);
                }
                return Ok(());
            };
            let Some(key) = node.parent_key.clone() else {
                return Err(DraftError::InvariantViolation(format!(
                    "draft {current} has a parent link but no parent key"
                )));
            };
            let Some(key) = self.locate(parent, current, key) else {
                self.detached(id, current);
                return Ok(());
            };
            self.store.get_mut(current).parent_key = Some(key.clone());
            self.mark_changed(parent, Some(key.clone()));
            tracing::trace!(draft = current, parent, key = %key, "propagated change");
            let in_set = self.store.get(parent).kind == NodeKind::Set;
            if let Some(recorder) = self.recorder.as_mut() {
                if in_set {
                    recorder.prepend_member(key, current);
                } else {
                    recorder.prepend(key);
                }
            }
            current = parent;
        }
    }

    /// Key under which `child` currently sits in `parent`. Array elements may
    /// have moved since the link was made, so arrays are scanned.
    fn locate(&self, parent: NodeId, child: NodeId, key: Key) -> Option<Key> {
        let copy = self.store.get(parent).copy.as_ref()?;
        let wanted = Entry::Draft(child);
        if copy.slot(&key) == Some(&wanted) {
            return Some(key);
        }
        match copy {
            Container::Array(items) => items.iter().position(|e| *e == wanted).map(Key::Index),
            _ => None,
        }
    }

    fn detached(&mut self, origin: NodeId, at: NodeId) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.discard_last();
        }
        tracing::trace!(draft = origin, detached_at = at, "change on a detached draft is not recorded");
    }
}
