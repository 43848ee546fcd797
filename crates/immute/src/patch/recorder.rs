use std::collections::VecDeque;

use immute_value::Value;

use crate::error::DraftError;
use crate::key::Key;
use crate::patch::{Operation, Patch};
use crate::store::{Entry, NodeId};

/// One path segment of a recorded patch.
///
/// Inverse paths through a drafted set member name the member as it will
/// appear in the result, which is only known once the draft is resolved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Key(Key),
    Member(NodeId),
}

/// A patch as recorded during drafting.
///
/// The path starts relative to the mutated node and grows at the front as the
/// change propagates towards the root. Arguments may still reference drafts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Recorded {
    pub op: Operation,
    pub path: VecDeque<Segment>,
    pub args: Vec<Entry>,
}

impl Recorded {
    pub(crate) fn new(op: Operation, path: impl IntoIterator<Item = Key>, args: Vec<Entry>) -> Self {
        Self {
            op,
            path: path.into_iter().map(Segment::Key).collect(),
            args,
        }
    }

    /// Patch on the mutated container itself.
    pub(crate) fn here(op: Operation, args: Vec<Entry>) -> Self {
        Self {
            op,
            path: VecDeque::new(),
            args,
        }
    }
}

/// Forward and inverse logs, kept pairwise aligned.
///
/// One mutation may record several pairs; `open` is where the pairs of the
/// most recent mutation start, and path prefixes apply to all of them.
#[derive(Debug, Default)]
pub(crate) struct PatchRecorder {
    patches: Vec<Recorded>,
    inverse: Vec<Recorded>,
    open: usize,
}

impl PatchRecorder {
    pub(crate) fn push(&mut self, forward: Recorded, inverse: Recorded) {
        self.push_all(vec![(forward, inverse)]);
    }

    pub(crate) fn push_all(&mut self, pairs: Vec<(Recorded, Recorded)>) {
        self.open = self.patches.len();
        for (forward, inverse) in pairs {
            self.patches.push(forward);
            self.inverse.push(inverse);
        }
    }

    /// Prepends `key` to the paths of the most recent mutation.
    pub(crate) fn prepend(&mut self, key: Key) {
        self.prepend_segments(Segment::Key(key.clone()), Segment::Key(key));
    }

    /// Prepends a set member: forward paths name it by `key`, inverse paths
    /// by whatever `member` resolves to.
    pub(crate) fn prepend_member(&mut self, key: Key, member: NodeId) {
        self.prepend_segments(Segment::Key(key), Segment::Member(member));
    }

    fn prepend_segments(&mut self, forward: Segment, inverse: Segment) {
        let open = self.open;
        for patch in self.patches.iter_mut().skip(open) {
            patch.path.push_front(forward.clone());
        }
        for patch in self.inverse.iter_mut().skip(open) {
            patch.path.push_front(inverse.clone());
        }
    }

    /// Pins inverse paths recorded so far through `member` to `key`.
    pub(crate) fn pin_member(&mut self, member: NodeId, key: &Key) {
        for segment in self.inverse.iter_mut().flat_map(|p| p.path.iter_mut()) {
            if *segment == Segment::Member(member) {
                *segment = Segment::Key(key.clone());
            }
        }
    }

    /// Drops the pairs of the most recent mutation.
    pub(crate) fn discard_last(&mut self) {
        self.patches.truncate(self.open);
        self.inverse.truncate(self.open);
    }

    /// Turns both logs into public patches, resolving draft arguments and
    /// member segments with `resolve`.
    pub(crate) fn finish(
        self,
        mut resolve: impl FnMut(&Entry) -> Result<Value, DraftError>,
    ) -> Result<(Vec<Patch>, Vec<Patch>), DraftError> {
        let mut convert = |recorded: Vec<Recorded>| -> Result<Vec<Patch>, DraftError> {
            recorded
                .into_iter()
                .map(|r| {
                    let path = r
                        .path
                        .into_iter()
                        .map(|segment| match segment {
                            Segment::Key(key) => Ok(key),
                            Segment::Member(id) => resolve(&Entry::Draft(id)).map(Key::Entry),
                        })
                        .collect::<Result<_, _>>()?;
                    let args = r.args.iter().map(&mut resolve).collect::<Result<_, _>>()?;
                    Ok(Patch::new(r.op, path, args))
                })
                .collect()
        };
        let patches = convert(self.patches)?;
        let inverse = convert(self.inverse)?;
        Ok((patches, inverse))
    }
}
