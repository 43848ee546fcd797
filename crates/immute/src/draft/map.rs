use std::mem;

use immute_value::Value;

use crate::draft::{Draft, DraftRef, DraftValue};
use crate::error::DraftError;
use crate::key::Key;
use crate::patch::{Operation, Recorded};
use crate::store::{Entry, NodeId};

/// Typed view over a map draft. Keys are matched by identity; node values
/// are drafted under their key.
pub struct MapDraft<'a> {
    draft: &'a mut Draft,
    id: NodeId,
}

impl<'a> MapDraft<'a> {
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

    pub fn get(&mut self, key: impl Into<Value>) -> Result<Option<DraftValue>, DraftError> {
        self.draft.read(self.id, &Key::Entry(key.into()))
    }

    pub fn child(&mut self, key: impl Into<Value>) -> Result<DraftRef, DraftError> {
        let target = self.target();
        self.draft.child(target, Key::Entry(key.into()))
    }

    pub fn has(&self, key: impl Into<Value>) -> bool {
        self.draft.entry_at(self.id, &Key::Entry(key.into())).is_some()
    }

    pub fn set(&mut self, key: impl Into<Value>, value: impl Into<DraftValue>) -> Result<(), DraftError> {
        self.draft.map_set(self.id, key.into(), value.into())
    }

    pub fn delete(&mut self, key: impl Into<Value>) -> Result<bool, DraftError> {
        self.draft.map_delete(self.id, key.into())
    }

    pub fn clear(&mut self) -> Result<(), DraftError> {
        self.draft.map_clear(self.id)
    }

    pub fn keys(&self) -> Vec<Value> {
        self.draft
            .keys(self.target())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|key| match key {
                Key::Entry(value) => Some(value),
                _ => None,
            })
            .collect()
    }
}

impl Draft {
    pub(crate) fn map_set(&mut self, id: NodeId, key: Value, value: DraftValue) -> Result<(), DraftError> {
        let entry = self.admit(id, value)?;
        let slot = Key::Entry(key.clone());
        let prev = self.entry_at(id, &slot);
        if prev.as_ref().is_some_and(|prev| prev.same(&entry)) {
            return Ok(());
        }
        self.store.map_mut(id)?.insert(key.clone(), entry.clone());
        self.mark_changed(id, Some(slot));
        self.record(|d| {
            let key = Entry::Value(key);
            let inverse = match &prev {
                Some(prev) => Recorded::here(Operation::Set, vec![key.clone(), d.snapshot_arg(prev)]),
                None => Recorded::here(Operation::Delete, vec![key.clone()]),
            };
            (Recorded::here(Operation::Set, vec![key, entry.clone()]), inverse)
        });
        self.note_written(id, &entry);
        self.propagate(id)
    }

    pub(crate) fn map_delete(&mut self, id: NodeId, key: Value) -> Result<bool, DraftError> {
        let slot = Key::Entry(key.clone());
        if self.entry_at(id, &slot).is_none() {
            return Ok(false);
        }
        let Some(removed) = self.store.map_mut(id)?.shift_remove(&key) else {
            return Ok(false);
        };
        self.unassign(id, &slot);
        self.mark_changed(id, None);
        self.record(|d| {
            let key = Entry::Value(key);
            (
                Recorded::here(Operation::Delete, vec![key.clone()]),
                Recorded::here(Operation::Set, vec![key, d.snapshot_arg(&removed)]),
            )
        });
        self.propagate(id)?;
        Ok(true)
    }

    pub(crate) fn map_clear(&mut self, id: NodeId) -> Result<(), DraftError> {
        if self.store.get(id).len() == 0 {
            return Ok(());
        }
        let entries = mem::take(self.store.map_mut(id)?);
        self.mark_changed(id, None);
        self.record(|d| {
            let mut prior = Vec::with_capacity(entries.len() * 2);
            for (key, entry) in &entries {
                prior.push(Entry::Value(key.clone()));
                prior.push(d.snapshot_arg(entry));
            }
            (
                Recorded::here(Operation::Clear, vec![]),
                Recorded::here(Operation::Construct, prior),
            )
        });
        self.propagate(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::{create, CreateOptions, DraftValue, Operation, Patch};
    use immute_value::{Node, Value};
    use serde_json::json;

    fn base() -> Node {
        let map = Node::map_from([
            (Value::from(1), Value::from("one")),
            (Value::from("nested"), Value::from_json(&json!({"n": 0}))),
        ]);
        Node::object_from([("map", Value::from(map))])
    }

    #[test]
    fn set_and_delete_record_key_value_args() {
        let base = base();
        let outcome = create(
            &base,
            |draft| {
                let root = draft.root();
                let map = draft.child(root, "map")?;
                let mut view = draft.map(map)?;
                view.set(1, "uno")?;
                view.set(4, 4)?;
                assert!(view.delete(4)?);
                assert!(!view.delete(4)?);
                assert!(view.has(1));
                Ok(())
            },
            &CreateOptions::default().with_patches(true),
        )
        .unwrap();
        let map = outcome.state.child("map").unwrap();
        assert_eq!(map.map_get(&Value::from(1)), Some(Value::from("uno")));
        let path = vec!["map".into()];
        assert_eq!(
            outcome.patches.unwrap(),
            vec![
                Patch::new(Operation::Set, path.clone(), vec![Value::from(1), Value::from("uno")]),
                Patch::new(Operation::Set, path.clone(), vec![Value::from(4), Value::from(4)]),
                Patch::new(Operation::Delete, path.clone(), vec![Value::from(4)]),
            ]
        );
        assert_eq!(
            outcome.inverse_patches.unwrap(),
            vec![
                Patch::new(Operation::Set, path.clone(), vec![Value::from(1), Value::from("one")]),
                Patch::new(Operation::Delete, path.clone(), vec![Value::from(4)]),
                Patch::new(Operation::Set, path, vec![Value::from(4), Value::from(4)]),
            ]
        );
    }

    #[test]
    fn node_values_are_drafted_under_their_key() {
        let base = base();
        let outcome = create(
            &base,
            |draft| {
                let root = draft.root();
                let map = draft.child(root, "map")?;
                let nested = draft.map(map)?.child("nested")?;
                draft.set(nested, "n", 1)?;
                Ok(())
            },
            &CreateOptions::default().with_patches(true),
        )
        .unwrap();
        let patches = outcome.patches.unwrap();
        assert_eq!(
            patches[0].path,
            vec!["map".into(), crate::Key::Entry(Value::from("nested")), "n".into()]
        );
        let nested = outcome.state.child("map").unwrap().map_get(&Value::from("nested")).unwrap();
        assert_eq!(nested.to_json(), json!({"n": 1}));
    }

    #[test]
    fn clear_inverts_to_construct_pairs() {
        let base = base();
        let outcome = create(
            &base,
            |draft| {
                let root = draft.root();
                let map = draft.child(root, "map")?;
                draft.map(map)?.clear()?;
                assert_eq!(draft.map(map)?.keys(), Vec::<Value>::new());
                assert_eq!(draft.map(map)?.get(1)?, None::<DraftValue>);
                Ok(())
            },
            &CreateOptions::default().with_patches(true),
        )
        .unwrap();
        let inverse = outcome.inverse_patches.unwrap();
        assert_eq!(inverse[0].op, Operation::Construct);
        assert_eq!(inverse[0].args.len(), 4);
        assert_eq!(inverse[0].args[0], Value::from(1));
        assert_eq!(inverse[0].args[2], Value::from("nested"));
    }
}
