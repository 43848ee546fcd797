use crate::draft::{Draft, DraftRef, DraftValue};
use crate::error::DraftError;
use crate::key::Key;
use crate::patch::{Operation, Recorded};
use crate::store::NodeId;

/// Typed view over an object draft.
pub struct ObjectDraft<'a> {
    draft: &'a mut Draft,
    id: NodeId,
}

impl<'a> ObjectDraft<'a> {
    pub(crate) fn new(draft: &'a mut Draft, id: NodeId) -> Self {
        Self { draft, id }
    }

    pub fn target(&self) -> DraftRef {
        self.draft.handle(self.id)
    }

    pub fn get(&mut self, key: &str) -> Result<Option<DraftValue>, DraftError> {
        self.draft.read(self.id, &Key::from(key))
    }

    pub fn child(&mut self, key: &str) -> Result<DraftRef, DraftError> {
        let target = self.target();
        self.draft.child(target, key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<DraftValue>) -> Result<(), DraftError> {
        self.draft.object_set(self.id, key.to_owned(), value.into())
    }

    pub fn delete(&mut self, key: &str) -> Result<bool, DraftError> {
        self.draft.object_delete(self.id, key.to_owned())
    }

    pub fn has(&self, key: &str) -> bool {
        self.draft.entry_at(self.id, &Key::from(key)).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.draft
            .keys(self.target())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|key| key.as_prop().map(str::to_owned))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.draft.store.get(self.id).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Draft {
    pub(crate) fn object_set(&mut self, id: NodeId, name: String, value: DraftValue) -> Result<(), DraftError> {
        let entry = self.admit(id, value)?;
        let key = Key::Prop(name.clone());
        let prev = self.entry_at(id, &key);
        if prev.as_ref().is_some_and(|prev| prev.same(&entry)) {
            return Ok(());
        }
        self.store.object_mut(id)?.insert(name, entry.clone());
        self.mark_changed(id, Some(key.clone()));
        self.record(|d| {
            let inverse = match &prev {
                Some(prev) => Recorded::new(Operation::Set, [key.clone()], vec![d.snapshot_arg(prev)]),
                None => Recorded::new(Operation::Delete, [key.clone()], vec![]),
            };
            (Recorded::new(Operation::Set, [key.clone()], vec![entry.clone()]), inverse)
        });
        self.note_written(id, &entry);
        self.propagate(id)
    }

    pub(crate) fn object_delete(&mut self, id: NodeId, name: String) -> Result<bool, DraftError> {
        let key = Key::Prop(name);
        let Some(prev) = self.entry_at(id, &key) else {
            return Ok(false);
        };
        if let Key::Prop(name) = &key {
            self.store.object_mut(id)?.shift_remove(name);
        }
        self.unassign(id, &key);
        self.mark_changed(id, None);
        self.record(|d| {
            (
                Recorded::new(Operation::Delete, [key.clone()], vec![]),
                Recorded::new(Operation::Set, [key.clone()], vec![d.snapshot_arg(&prev)]),
            )
        });
        self.propagate(id)?;
        Ok(true)
    }
}
