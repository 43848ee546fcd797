mod common;

use common::assertions::{assert_replays, assert_shared};
use common::fixtures::node;
use immute::{create, CreateOptions, Draft, DraftError, DraftValue, Node};
use proptest::prelude::*;
use serde_json::json;

/// One step of a random mutation against the document built by [`base`].
#[derive(Debug, Clone)]
enum Step {
    SetA(&'static str, u32),
    DeleteA(&'static str),
    SetY(usize, u32),
    PushY(u32),
    PopY,
    ShiftY,
    UnshiftY(u32),
    SpliceY(usize, usize, Vec<u32>),
    ReverseY,
    SetLenY(usize),
    SortY,
    FillY(u32, i64),
    CopyWithinY(i64, i64),
    SetK(usize, u32),
    PushB(u32),
    PopB,
    MoveBToY,
    RepushB(u32),
    SetC(&'static str),
}

impl Step {
    fn touches(&self, branch: &str) -> bool {
        match self {
            Step::SetA(..)
            | Step::DeleteA(_)
            | Step::SetY(..)
            | Step::PushY(_)
            | Step::PopY
            | Step::ShiftY
            | Step::UnshiftY(_)
            | Step::SpliceY(..)
            | Step::ReverseY
            | Step::SetLenY(_)
            | Step::SortY
            | Step::FillY(..)
            | Step::CopyWithinY(..) => branch == "a",
            Step::SetK(..) | Step::PushB(_) | Step::PopB | Step::RepushB(_) => branch == "b",
            Step::MoveBToY => branch == "a" || branch == "b",
            Step::SetC(_) => branch == "c",
        }
    }
}

fn base() -> Node {
    node(json!({
        "a": {"x": 1, "y": [1, 2, 3]},
        "b": [{"k": 1, "l": []}, {"k": 2, "l": []}],
        "c": "s",
        "d": {"untouched": [true]}
    }))
}

fn step() -> impl Strategy<Value = Step> {
    let key = prop_oneof![Just("x"), Just("z")];
    prop_oneof![
        (key.clone(), 0u32..100).prop_map(|(k, n)| Step::SetA(k, n)),
        key.prop_map(Step::DeleteA),
        (0usize..6, 0u32..100).prop_map(|(i, n)| Step::SetY(i, n)),
        (0u32..100).prop_map(Step::PushY),
        Just(Step::PopY),
        Just(Step::ShiftY),
        (0u32..100).prop_map(Step::UnshiftY),
        (0usize..6, 0usize..4, prop::collection::vec(0u32..100, 0..3))
            .prop_map(|(s, d, items)| Step::SpliceY(s, d, items)),
        Just(Step::ReverseY),
        (0usize..6).prop_map(Step::SetLenY),
        Just(Step::SortY),
        (0u32..100, -4i64..4).prop_map(|(n, start)| Step::FillY(n, start)),
        (-4i64..4, -4i64..4).prop_map(|(target, start)| Step::CopyWithinY(target, start)),
        (0usize..3, 0u32..100).prop_map(|(i, n)| Step::SetK(i, n)),
        (0u32..100).prop_map(Step::PushB),
        Just(Step::PopB),
        Just(Step::MoveBToY),
        (0u32..100).prop_map(Step::RepushB),
        prop_oneof![Just("s"), Just("t")].prop_map(Step::SetC),
    ]
}

fn apply(draft: &mut Draft, step: &Step) -> Result<(), DraftError> {
    let root = draft.root();
    match step {
        Step::SetA(key, n) => {
            let a = draft.child(root, "a")?;
            draft.set(a, *key, *n)
        }
        Step::DeleteA(key) => {
            let a = draft.child(root, "a")?;
            draft.delete(a, *key).map(drop)
        }
        Step::SetY(index, n) => {
            let y = draft.child_at(root, &["a".into(), "y".into()])?;
            draft.set(y, *index, *n)
        }
        Step::PushY(n) => {
            let y = draft.child_at(root, &["a".into(), "y".into()])?;
            draft.array(y)?.push(*n).map(drop)
        }
        Step::PopY => {
            let y = draft.child_at(root, &["a".into(), "y".into()])?;
            draft.array(y)?.pop().map(drop)
        }
        Step::ShiftY => {
            let y = draft.child_at(root, &["a".into(), "y".into()])?;
            draft.array(y)?.shift().map(drop)
        }
        Step::UnshiftY(n) => {
            let y = draft.child_at(root, &["a".into(), "y".into()])?;
            draft.array(y)?.unshift(*n).map(drop)
        }
        Step::SpliceY(start, delete_count, items) => {
            let y = draft.child_at(root, &["a".into(), "y".into()])?;
            let items = items.iter().copied().map(DraftValue::from).collect();
            draft.array(y)?.splice(*start, *delete_count, items).map(drop)
        }
        Step::ReverseY => {
            let y = draft.child_at(root, &["a".into(), "y".into()])?;
            draft.array(y)?.reverse()
        }
        Step::SetLenY(len) => {
            let y = draft.child_at(root, &["a".into(), "y".into()])?;
            draft.array(y)?.set_len(*len)
        }
        Step::SortY => {
            let y = draft.child_at(root, &["a".into(), "y".into()])?;
            draft.array(y)?.sort_by(|a, b| b.as_f64().partial_cmp(&a.as_f64()).unwrap_or(std::cmp::Ordering::Equal))
        }
        Step::FillY(n, start) => {
            let y = draft.child_at(root, &["a".into(), "y".into()])?;
            draft.array(y)?.fill(*n, *start, None)
        }
        Step::CopyWithinY(target, start) => {
            let y = draft.child_at(root, &["a".into(), "y".into()])?;
            draft.array(y)?.copy_within(*target, *start, None)
        }
        Step::SetK(index, n) => {
            let b = draft.child(root, "b")?;
            // Caller-pushed items come back as plain nodes and are skipped.
            match draft.get(b, *index)? {
                Some(DraftValue::Draft(item)) => draft.set(item, "k", *n),
                _ => Ok(()),
            }
        }
        Step::PushB(n) => {
            let b = draft.child(root, "b")?;
            draft.array(b)?.push(node(json!({"k": n}))).map(drop)
        }
        Step::PopB => {
            let b = draft.child(root, "b")?;
            draft.array(b)?.pop().map(drop)
        }
        Step::MoveBToY => {
            let b = draft.child(root, "b")?;
            let Some(item) = draft.array(b)?.pop()? else {
                return Ok(());
            };
            let y = draft.child_at(root, &["a".into(), "y".into()])?;
            draft.array(y)?.push(item).map(drop)
        }
        Step::RepushB(n) => {
            let b = draft.child(root, "b")?;
            let last = match draft.len(b)?.checked_sub(1) {
                Some(index) => draft.get(b, index)?,
                None => None,
            };
            let Some(DraftValue::Draft(item)) = last else {
                return Ok(());
            };
            draft.array(b)?.pop()?;
            draft.array(b)?.push(item)?;
            let list = draft.child(item, "l")?;
            draft.array(list)?.push(*n).map(drop)
        }
        Step::SetC(value) => draft.set(root, "c", *value),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn random_mutations_obey_the_draft_laws(steps in prop::collection::vec(step(), 0..12)) {
        let base = base();
        let before = base.to_json();
        let outcome = create(
            &base,
            |draft| steps.iter().try_for_each(|s| apply(draft, s)),
            &CreateOptions::default().with_patches(true),
        )
        .unwrap_or_else(|e| panic!("mutation failed for {steps:?}: {e}"));

        prop_assert_eq!(base.to_json(), before);
        assert_replays(&base, &outcome);
        assert_shared(&base, &outcome.state, &["d"]);
        for branch in ["a", "b"] {
            if !steps.iter().any(|s| s.touches(branch)) {
                assert_shared(&base, &outcome.state, &[branch]);
            }
        }
        if steps.is_empty() {
            prop_assert!(outcome.state.ptr_eq(&base));
        }
    }
}
