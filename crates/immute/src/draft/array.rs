use std::cmp::Ordering;

use immute_value::Value;

use crate::draft::{Draft, DraftRef, DraftValue};
use crate::error::DraftError;
use crate::key::Key;
use crate::patch::{Operation, Recorded};
use crate::store::{Entry, NodeId};

/// Typed view over an array draft, with the intercepted sequence methods.
pub struct ArrayDraft<'a> {
    draft: &'a mut Draft,
    id: NodeId,
}

impl<'a> ArrayDraft<'a> {
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

    pub fn get(&mut self, index: usize) -> Result<Option<DraftValue>, DraftError> {
        self.draft.read(self.id, &Key::Index(index))
    }

    pub fn child(&mut self, index: usize) -> Result<DraftRef, DraftError> {
        let target = self.target();
        self.draft.child(target, index)
    }

    /// Element write. Writing past the end pads the gap with `Null`.
    pub fn set(&mut self, index: usize, value: impl Into<DraftValue>) -> Result<(), DraftError> {
        self.draft.array_set(self.id, index, value.into())
    }

    /// Leaves a `Null` hole; the length is unchanged.
    pub fn delete(&mut self, index: usize) -> Result<bool, DraftError> {
        self.draft.array_delete(self.id, index)
    }

    pub fn set_len(&mut self, len: usize) -> Result<(), DraftError> {
        self.draft.array_set_len(self.id, len)
    }

    /// Returns the new length.
    pub fn push(&mut self, value: impl Into<DraftValue>) -> Result<usize, DraftError> {
        self.draft.array_push(self.id, vec![value.into()])
    }

    pub fn push_many<I, V>(&mut self, values: I) -> Result<usize, DraftError>
    where
        I: IntoIterator<Item = V>,
        V: Into<DraftValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.draft.array_push(self.id, values)
    }

    pub fn pop(&mut self) -> Result<Option<DraftValue>, DraftError> {
        self.draft.array_pop(self.id)
    }

    pub fn shift(&mut self) -> Result<Option<DraftValue>, DraftError> {
        self.draft.array_shift(self.id)
    }

    /// Returns the new length.
    pub fn unshift(&mut self, value: impl Into<DraftValue>) -> Result<usize, DraftError> {
        self.draft.array_unshift(self.id, vec![value.into()])
    }

    pub fn unshift_many<I, V>(&mut self, values: I) -> Result<usize, DraftError>
    where
        I: IntoIterator<Item = V>,
        V: Into<DraftValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.draft.array_unshift(self.id, values)
    }

    /// Removes `delete_count` elements at `start` and inserts `values` there.
    /// Both bounds are clamped to the array. Returns the removed elements.
    pub fn splice(
        &mut self,
        start: usize,
        delete_count: usize,
        values: Vec<DraftValue>,
    ) -> Result<Vec<DraftValue>, DraftError> {
        self.draft.array_splice(self.id, start, delete_count, values)
    }

    pub fn reverse(&mut self) -> Result<(), DraftError> {
        self.draft.array_reverse(self.id)
    }

    /// Stable sort with [`default_order`].
    pub fn sort(&mut self) -> Result<(), DraftError> {
        self.sort_by(default_order)
    }

    /// Stable sort. `compare` sees the current value of every element, nested
    /// drafts included.
    pub fn sort_by<F>(&mut self, compare: F) -> Result<(), DraftError>
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        self.draft.array_sort_by(self.id, compare)
    }

    /// Writes `value` into `start..end`. Negative bounds count from the end;
    /// `None` means the length.
    pub fn fill(&mut self, value: impl Into<DraftValue>, start: i64, end: Option<i64>) -> Result<(), DraftError> {
        self.draft.array_fill(self.id, value.into(), start, end)
    }

    /// Copies `start..end` over the elements at `target`, without changing the
    /// length. Bounds follow [`ArrayDraft::fill`].
    pub fn copy_within(&mut self, target: i64, start: i64, end: Option<i64>) -> Result<(), DraftError> {
        self.draft.array_copy_within(self.id, target, start, end)
    }
}

/// Order used by [`ArrayDraft::sort`]: booleans, then numbers, then strings,
/// then nodes, with `Null` holes last. Nodes keep their relative order.
pub fn default_order(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            Value::Node(_) => 3,
            Value::Null => 4,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(_), Value::Number(_)) => {
            let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Resolves a possibly negative bound against `len`.
fn relative(index: i64, len: usize) -> usize {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if index < 0 { (len_i + index).max(0) } else { index.min(len_i) };
    usize::try_from(resolved).unwrap_or(0)
}

impl Draft {
    fn admit_all(&self, id: NodeId, values: Vec<DraftValue>) -> Result<Vec<Entry>, DraftError> {
        values.into_iter().map(|v| self.admit(id, v)).collect()
    }

    fn note_written_all(&mut self, id: NodeId, entries: &[Entry]) {
        for entry in entries {
            self.note_written(id, entry);
        }
    }

    fn snapshot_args(&self, entries: &[Entry]) -> Vec<Entry> {
        entries.iter().map(|e| self.snapshot_arg(e)).collect()
    }

    pub(crate) fn array_set(&mut self, id: NodeId, index: usize, value: DraftValue) -> Result<(), DraftError> {
        let entry = self.admit(id, value)?;
        let key = Key::Index(index);
        let len = self.store.get(id).len();
        let prev = self.entry_at(id, &key);
        if prev.as_ref().is_some_and(|prev| prev.same(&entry)) {
            return Ok(());
        }
        let items = self.store.array_mut(id)?;
        if index < len {
            items[index] = entry.clone();
        } else {
            items.resize(index, Entry::Value(Value::Null));
            items.push(entry.clone());
        }
        self.mark_changed(id, Some(key.clone()));
        self.record(|d| {
            let inverse = match &prev {
                Some(prev) => Recorded::new(Operation::Set, [key.clone()], vec![d.snapshot_arg(prev)]),
                None => Recorded::new(Operation::Set, [Key::Length], vec![Entry::Value(Value::from(len))]),
            };
            (Recorded::new(Operation::Set, [key.clone()], vec![entry.clone()]), inverse)
        });
        self.note_written(id, &entry);
        self.propagate(id)
    }

    pub(crate) fn array_delete(&mut self, id: NodeId, index: usize) -> Result<bool, DraftError> {
        let key = Key::Index(index);
        let hole = Entry::Value(Value::Null);
        let prev = match self.entry_at(id, &key) {
            Some(prev) if prev != hole => prev,
            _ => return Ok(false),
        };
        self.store.array_mut(id)?[index] = hole;
        self.mark_changed(id, Some(key.clone()));
        self.record(|d| {
            (
                Recorded::new(Operation::Delete, [key.clone()], vec![]),
                Recorded::new(Operation::Set, [key.clone()], vec![d.snapshot_arg(&prev)]),
            )
        });
        self.propagate(id)?;
        Ok(true)
    }

    pub(crate) fn array_set_len(&mut self, id: NodeId, new_len: usize) -> Result<(), DraftError> {
        let len = self.store.get(id).len();
        if new_len == len {
            return Ok(());
        }
        let items = self.store.array_mut(id)?;
        let removed = if new_len < len {
            items.split_off(new_len)
        } else {
            items.resize(new_len, Entry::Value(Value::Null));
            Vec::new()
        };
        self.mark_changed(id, Some(Key::Length));
        self.record(|d| {
            let inverse = if new_len < len {
                Recorded::here(Operation::Push, d.snapshot_args(&removed))
            } else {
                Recorded::new(Operation::Set, [Key::Length], vec![Entry::Value(Value::from(len))])
            };
            (
                Recorded::new(Operation::Set, [Key::Length], vec![Entry::Value(Value::from(new_len))]),
                inverse,
            )
        });
        self.propagate(id)
    }

    pub(crate) fn array_push(&mut self, id: NodeId, values: Vec<DraftValue>) -> Result<usize, DraftError> {
        let entries = self.admit_all(id, values)?;
        let len = self.store.get(id).len();
        if entries.is_empty() {
            return Ok(len);
        }
        self.store.array_mut(id)?.extend(entries.iter().cloned());
        self.mark_changed(id, None);
        self.record(|_| {
            (
                Recorded::here(Operation::Push, entries.clone()),
                Recorded::here(
                    Operation::Splice,
                    vec![Entry::Value(Value::from(len)), Entry::Value(Value::from(entries.len()))],
                ),
            )
        });
        self.note_written_all(id, &entries);
        self.propagate(id)?;
        Ok(len + entries.len())
    }

    pub(crate) fn array_pop(&mut self, id: NodeId) -> Result<Option<DraftValue>, DraftError> {
        if self.store.get(id).len() == 0 {
            return Ok(None);
        }
        let Some(removed) = self.store.array_mut(id)?.pop() else {
            return Ok(None);
        };
        self.mark_changed(id, None);
        self.record(|d| {
            (
                Recorded::here(Operation::Pop, vec![]),
                Recorded::here(Operation::Push, vec![d.snapshot_arg(&removed)]),
            )
        });
        self.propagate(id)?;
        Ok(Some(self.detach_member(id, removed)))
    }

    pub(crate) fn array_shift(&mut self, id: NodeId) -> Result<Option<DraftValue>, DraftError> {
        if self.store.get(id).len() == 0 {
            return Ok(None);
        }
        let removed = self.store.array_mut(id)?.remove(0);
        self.mark_changed(id, None);
        self.record(|d| {
            (
                Recorded::here(Operation::Shift, vec![]),
                Recorded::here(Operation::Unshift, vec![d.snapshot_arg(&removed)]),
            )
        });
        self.propagate(id)?;
        Ok(Some(self.detach_member(id, removed)))
    }

    pub(crate) fn array_unshift(&mut self, id: NodeId, values: Vec<DraftValue>) -> Result<usize, DraftError> {
        let entries = self.admit_all(id, values)?;
        let len = self.store.get(id).len();
        if entries.is_empty() {
            return Ok(len);
        }
        self.store.array_mut(id)?.splice(0..0, entries.iter().cloned());
        self.mark_changed(id, None);
        self.record(|_| {
            (
                Recorded::here(Operation::Unshift, entries.clone()),
                Recorded::here(
                    Operation::Splice,
                    vec![Entry::Value(Value::from(0)), Entry::Value(Value::from(entries.len()))],
                ),
            )
        });
        self.note_written_all(id, &entries);
        self.propagate(id)?;
        Ok(len + entries.len())
    }

    pub(crate) fn array_splice(
        &mut self,
        id: NodeId,
        start: usize,
        delete_count: usize,
        values: Vec<DraftValue>,
    ) -> Result<Vec<DraftValue>, DraftError> {
        let entries = self.admit_all(id, values)?;
        let len = self.store.get(id).len();
        let start = start.min(len);
        let delete_count = delete_count.min(len - start);
        if delete_count == 0 && entries.is_empty() {
            return Ok(Vec::new());
        }
        let removed: Vec<Entry> = self
            .store
            .array_mut(id)?
            .splice(start..start + delete_count, entries.iter().cloned())
            .collect();
        self.mark_changed(id, None);
        self.record(|d| {
            let mut forward = vec![
                Entry::Value(Value::from(start)),
                Entry::Value(Value::from(delete_count)),
            ];
            forward.extend(entries.iter().cloned());
            let mut inverse = vec![
                Entry::Value(Value::from(start)),
                Entry::Value(Value::from(entries.len())),
            ];
            inverse.extend(d.snapshot_args(&removed));
            (
                Recorded::here(Operation::Splice, forward),
                Recorded::here(Operation::Splice, inverse),
            )
        });
        self.note_written_all(id, &entries);
        self.propagate(id)?;
        Ok(removed
            .into_iter()
            .map(|entry| self.detach_member(id, entry))
            .collect())
    }

    fn array_entries(&self, id: NodeId) -> Vec<Entry> {
        let len = self.store.get(id).len();
        (0..len).filter_map(|i| self.entry_at(id, &Key::Index(i))).collect()
    }

    /// Replaces the elements with `next`, which has the same length, and
    /// records one element `Set` pair per changed slot. Drafts that land in a
    /// changed slot are carried by that pair.
    fn array_rewrite(&mut self, id: NodeId, current: Vec<Entry>, next: Vec<Entry>) -> Result<bool, DraftError> {
        let changed: Vec<(usize, Entry)> = next
            .into_iter()
            .enumerate()
            .filter(|(i, entry)| !current[*i].same(entry))
            .map(|(i, entry)| (i, entry.into_written()))
            .collect();
        if changed.is_empty() {
            return Ok(false);
        }
        let items = self.store.array_mut(id)?;
        for (i, entry) in &changed {
            items[*i] = entry.clone();
        }
        for (i, _) in &changed {
            self.mark_changed(id, Some(Key::Index(*i)));
        }
        self.record_all(|d| {
            changed
                .iter()
                .map(|(i, entry)| {
                    (
                        Recorded::new(Operation::Set, [Key::Index(*i)], vec![entry.clone()]),
                        Recorded::new(Operation::Set, [Key::Index(*i)], vec![d.snapshot_arg(&current[*i])]),
                    )
                })
                .collect()
        });
        self.propagate(id)?;
        Ok(true)
    }

    pub(crate) fn array_sort_by<F>(&mut self, id: NodeId, mut compare: F) -> Result<(), DraftError>
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        let current = self.array_entries(id);
        let mut keyed: Vec<(Value, Entry)> = current
            .iter()
            .map(|entry| (self.snapshot_entry(entry), entry.clone()))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| compare(a, b));
        let next = keyed.into_iter().map(|(_, entry)| entry).collect();
        self.array_rewrite(id, current, next).map(drop)
    }

    pub(crate) fn array_fill(
        &mut self,
        id: NodeId,
        value: DraftValue,
        start: i64,
        end: Option<i64>,
    ) -> Result<(), DraftError> {
        let entry = self.admit(id, value)?;
        let current = self.array_entries(id);
        let len = current.len();
        let start = relative(start, len);
        let end = end.map_or(len, |end| relative(end, len));
        let mut next = current.clone();
        for slot in next.iter_mut().take(end).skip(start) {
            *slot = entry.clone();
        }
        if self.array_rewrite(id, current, next)? {
            self.note_written(id, &entry);
        }
        Ok(())
    }

    pub(crate) fn array_copy_within(
        &mut self,
        id: NodeId,
        target: i64,
        start: i64,
        end: Option<i64>,
    ) -> Result<(), DraftError> {
        let current = self.array_entries(id);
        let len = current.len();
        let to = relative(target, len);
        let from = relative(start, len);
        let end = end.map_or(len, |end| relative(end, len));
        let count = end.saturating_sub(from).min(len - to);
        let mut next = current.clone();
        next[to..to + count].clone_from_slice(&current[from..from + count]);
        self.array_rewrite(id, current, next).map(drop)
    }

    pub(crate) fn array_reverse(&mut self, id: NodeId) -> Result<(), DraftError> {
        if self.store.get(id).len() < 2 {
            return Ok(());
        }
        self.store.array_mut(id)?.reverse();
        self.mark_changed(id, None);
        self.record(|_| {
            (
                Recorded::here(Operation::Reverse, vec![]),
                Recorded::here(Operation::Reverse, vec![]),
            )
        });
        self.propagate(id)
    }
}
