use std::mem;

use immute_value::Value;

use crate::draft::{Draft, DraftRef, DraftValue};
use crate::error::DraftError;
use crate::key::Key;
use crate::patch::{Operation, Recorded};
use crate::store::{Entry, NodeId};

/// Typed view over a set draft.
///
/// Members are compared by identity. Node members read through the view are
/// drafted under their original identity, so `has` keeps answering for them
/// and a changed member replaces the original in the result. Inverse patches
/// name members as they appear in the result, so undoing an `add` removes
/// exactly the member that was added.
pub struct SetDraft<'a> {
    draft: &'a mut Draft,
    id: NodeId,
}

impl<'a> SetDraft<'a> {
    pub(crate) fn new(draft: &'a mut Draft, id: NodeId) -> Self {
        Self { draft, id }
    }

    pub fn target(&self) -> DraftRef {
        self.draft.handle(self.id)
    }

    pub fn len(&self) -> usize {
        self.draft.store.get(self.id).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has(&self, value: impl Into<DraftValue>) -> Result<bool, DraftError> {
        let member = self.draft.member_key(&value.into())?;
        Ok(self.draft.entry_at(self.id, &Key::Entry(member)).is_some())
    }

    /// Returns `false` when the member was already present.
    pub fn add(&mut self, value: impl Into<DraftValue>) -> Result<bool, DraftError> {
        self.draft.set_add(self.id, value.into())
    }

    pub fn delete(&mut self, value: impl Into<DraftValue>) -> Result<bool, DraftError> {
        self.draft.set_delete(self.id, value.into())
    }

    pub fn clear(&mut self) -> Result<(), DraftError> {
        self.draft.set_clear(self.id)
    }

    /// Members in insertion order, node members as drafts.
    pub fn values(&mut self) -> Result<Vec<DraftValue>, DraftError> {
        let keys = self.draft.keys(self.target())?;
        keys.iter()
            .filter_map(|key| self.draft.read(self.id, key).transpose())
            .collect()
    }

    /// Draft of the node member `member`.
    pub fn child(&mut self, member: impl Into<Value>) -> Result<DraftRef, DraftError> {
        let target = self.target();
        self.draft.child(target, Key::Entry(member.into()))
    }
}

impl Draft {
    pub(crate) fn set_add(&mut self, id: NodeId, value: DraftValue) -> Result<bool, DraftError> {
        let member = self.member_key(&value)?;
        if self.entry_at(id, &Key::Entry(member.clone())).is_some() {
            return Ok(false);
        }
        let entry = self.admit(id, value)?;
        self.store.set_mut(id)?.insert(member, entry.clone());
        self.mark_changed(id, None);
        self.record(|_| {
            (
                Recorded::here(Operation::Add, vec![entry.clone()]),
                Recorded::here(Operation::Delete, vec![entry.clone()]),
            )
        });
        self.note_written(id, &entry);
        self.propagate(id)?;
        Ok(true)
    }

    pub(crate) fn set_delete(&mut self, id: NodeId, value: DraftValue) -> Result<bool, DraftError> {
        let member = self.member_key(&value)?;
        if self.entry_at(id, &Key::Entry(member.clone())).is_none() {
            return Ok(false);
        }
        let Some(removed) = self.store.set_mut(id)?.shift_remove(&member) else {
            return Ok(false);
        };
        self.mark_changed(id, None);
        let (forward, inverse) = self.release_member(&member, &removed);
        self.record(|_| {
            (
                Recorded::here(Operation::Delete, vec![forward]),
                Recorded::here(Operation::Add, vec![inverse]),
            )
        });
        self.propagate(id)?;
        Ok(true)
    }

    pub(crate) fn set_clear(&mut self, id: NodeId) -> Result<(), DraftError> {
        if self.store.get(id).len() == 0 {
            return Ok(());
        }
        let members = mem::take(self.store.set_mut(id)?);
        self.mark_changed(id, None);
        let restored: Vec<Entry> = members
            .iter()
            .map(|(member, entry)| self.release_member(member, entry).1)
            .collect();
        self.record(|_| {
            (
                Recorded::here(Operation::Clear, vec![]),
                Recorded::here(Operation::Construct, restored),
            )
        });
        self.propagate(id)
    }

    /// Patch arguments naming a member that leaves its set.
    ///
    /// A member drafted in place is named by its original going forward, and
    /// by a snapshot of its current value going back; inverse paths recorded
    /// through it so far are pinned to that snapshot.
    fn release_member(&mut self, member: &Value, removed: &Entry) -> (Entry, Entry) {
        let Entry::Draft(child) = removed else {
            return (removed.clone(), removed.clone());
        };
        let forward = Entry::Value(member.clone());
        if self.recorder.is_none() {
            return (forward, removed.clone());
        }
        let snapshot = Value::Node(self.snapshot(*child));
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.pin_member(*child, &Key::Entry(snapshot.clone()));
        }
        (forward, Entry::Value(snapshot))
    }
}
