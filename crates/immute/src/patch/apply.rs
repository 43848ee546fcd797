use immute_value::{Node, NodeKind, Value};

use crate::create::run;
use crate::draft::{Draft, DraftRef, DraftValue};
use crate::error::DraftError;
use crate::key::{format_path, Key};
use crate::options::CreateOptions;
use crate::patch::{Operation, Patch};

/// Replays `patches` on `base` through a draft, so untouched subtrees of
/// `base` are shared with the result.
///
/// Nodes written by one patch can be the target of a later one, so logs of
/// consecutive invocations can be joined and replayed in one pass.
///
/// Inverse patches are listed in recording order; to undo, pass them
/// reversed (`inverse.iter().rev()`).
pub fn apply_patches<'a, I>(base: &Node, patches: I) -> Result<Node, DraftError>
where
    I: IntoIterator<Item = &'a Patch>,
{
    let options = CreateOptions::default();
    let outcome = run(
        Draft::new(base.clone(), &options).replaying(),
        |draft| {
            let root = draft.root();
            for patch in patches {
                apply_patch(draft, root, patch).map_err(|e| match e {
                    DraftError::InvalidPatch(_) | DraftError::Node(_) => e,
                    other => DraftError::InvalidPatch(format!("{patch}: {other}")),
                })?;
            }
            Ok(())
        },
        &options,
    )?;
    Ok(outcome.state)
}

fn apply_patch(draft: &mut Draft, root: DraftRef, patch: &Patch) -> Result<(), DraftError> {
    let args = &patch.args;
    match (patch.op, args.len()) {
        (Operation::Set, 2) => {
            let target = draft.child_at(root, &patch.path)?;
            draft.map(target)?.set(args[0].clone(), args[1].clone())
        }
        (Operation::Set, 1) => {
            let (target, key) = member_target(draft, root, patch)?;
            draft.set(target, key, args[0].clone())
        }
        (Operation::Delete, 1) => {
            let target = draft.child_at(root, &patch.path)?;
            match draft.kind(target)? {
                NodeKind::Map => draft.map(target)?.delete(args[0].clone()).map(drop),
                NodeKind::Set => draft.set_view(target)?.delete(args[0].clone()).map(drop),
                kind => Err(invalid(patch, &format!("cannot delete an entry from {kind}"))),
            }
        }
        (Operation::Delete, 0) => {
            let (target, key) = member_target(draft, root, patch)?;
            draft.delete(target, key).map(drop)
        }
        (Operation::Add, 1) => {
            let target = draft.child_at(root, &patch.path)?;
            draft.set_view(target)?.add(args[0].clone()).map(drop)
        }
        (Operation::Clear, 0) => {
            let target = draft.child_at(root, &patch.path)?;
            clear(draft, target)
        }
        (Operation::Construct, _) => {
            let target = draft.child_at(root, &patch.path)?;
            clear(draft, target)?;
            construct(draft, target, patch)
        }
        (Operation::Push, _) => {
            let target = draft.child_at(root, &patch.path)?;
            draft.array(target)?.push_many(values(args)).map(drop)
        }
        (Operation::Unshift, _) => {
            let target = draft.child_at(root, &patch.path)?;
            draft.array(target)?.unshift_many(values(args)).map(drop)
        }
        (Operation::Pop, 0) => {
            let target = draft.child_at(root, &patch.path)?;
            draft.array(target)?.pop().map(drop)
        }
        (Operation::Shift, 0) => {
            let target = draft.child_at(root, &patch.path)?;
            draft.array(target)?.shift().map(drop)
        }
        (Operation::Splice, n) if n >= 2 => {
            let target = draft.child_at(root, &patch.path)?;
            let start = index_arg(patch, 0)?;
            let delete_count = index_arg(patch, 1)?;
            let items = args[2..].iter().cloned().map(DraftValue::Value).collect();
            draft.array(target)?.splice(start, delete_count, items).map(drop)
        }
        (Operation::Reverse, 0) => {
            let target = draft.child_at(root, &patch.path)?;
            draft.array(target)?.reverse()
        }
        (op, n) => Err(invalid(patch, &format!("{op} does not take {n} arguments"))),
    }
}

fn member_target(draft: &mut Draft, root: DraftRef, patch: &Patch) -> Result<(DraftRef, Key), DraftError> {
    let Some((key, parent)) = patch.path.split_last() else {
        return Err(invalid(patch, "member operation needs a non-empty path"));
    };
    Ok((draft.child_at(root, parent)?, key.clone()))
}

fn clear(draft: &mut Draft, target: DraftRef) -> Result<(), DraftError> {
    match draft.kind(target)? {
        NodeKind::Set => draft.set_view(target)?.clear(),
        NodeKind::Map => draft.map(target)?.clear(),
        found => Err(DraftError::KindMismatch { expected: NodeKind::Map, found }),
    }
}

fn construct(draft: &mut Draft, target: DraftRef, patch: &Patch) -> Result<(), DraftError> {
    match draft.kind(target)? {
        NodeKind::Set => {
            let mut set = draft.set_view(target)?;
            for member in &patch.args {
                set.add(member.clone())?;
            }
            Ok(())
        }
        NodeKind::Map => {
            if patch.args.len() % 2 != 0 {
                return Err(invalid(patch, "map construct needs key/value pairs"));
            }
            let mut map = draft.map(target)?;
            for pair in patch.args.chunks(2) {
                map.set(pair[0].clone(), pair[1].clone())?;
            }
            Ok(())
        }
        found => Err(DraftError::KindMismatch { expected: NodeKind::Map, found }),
    }
}

fn values(args: &[Value]) -> Vec<DraftValue> {
    args.iter().cloned().map(DraftValue::Value).collect()
}

fn index_arg(patch: &Patch, at: usize) -> Result<usize, DraftError> {
    patch.args[at]
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(patch, "splice bounds must be non-negative integers"))
}

fn invalid(patch: &Patch, reason: &str) -> DraftError {
    DraftError::InvalidPatch(format!("{} {}: {reason}", patch.op, format_path(&patch.path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(json: serde_json::Value) -> Node {
        Node::from_json(&json).unwrap()
    }

    #[test]
    fn replays_member_and_container_operations() {
        let base = node(json!({"a": {"b": 1}, "list": [1, 2, 3], "keep": {}}));
        let patches = vec![
            Patch::new(Operation::Set, vec!["a".into(), "b".into()], vec![Value::from(2)]),
            Patch::new(Operation::Push, vec!["list".into()], vec![Value::from(4)]),
            Patch::new(Operation::Splice, vec!["list".into()], vec![Value::from(0), Value::from(1)]),
            Patch::new(Operation::Reverse, vec!["list".into()], vec![]),
            Patch::new(Operation::Delete, vec!["a".into(), "b".into()], vec![]),
        ];
        let result = apply_patches(&base, &patches).unwrap();
        assert_eq!(result.to_json(), json!({"a": {}, "list": [4, 3, 2], "keep": {}}));
        assert!(result.child("keep").unwrap().ptr_eq(&base.child("keep").unwrap()));
        assert_eq!(base.to_json(), json!({"a": {"b": 1}, "list": [1, 2, 3], "keep": {}}));
    }

    #[test]
    fn replays_map_and_set_operations() {
        let base = Node::object_from([
            ("m", Value::from(Node::map_from([(Value::from(1), Value::from("a"))]))),
            ("s", Value::from(Node::set())),
        ]);
        let patches = vec![
            Patch::new(Operation::Set, vec!["m".into()], vec![Value::from(2), Value::from("b")]),
            Patch::new(Operation::Delete, vec!["m".into()], vec![Value::from(1)]),
            Patch::new(Operation::Add, vec!["s".into()], vec![Value::from("x")]),
            Patch::new(Operation::Construct, vec!["s".into()], vec![Value::from("y"), Value::from("z")]),
        ];
        let result = apply_patches(&base, &patches).unwrap();
        assert_eq!(result.child("m").unwrap().to_json(), json!([[2, "b"]]));
        assert_eq!(result.child("s").unwrap().to_json(), json!(["y", "z"]));
    }

    #[test]
    fn array_length_patch_truncates() {
        let base = node(json!([1, 2, 3]));
        let patch = Patch::new(Operation::Set, vec![Key::Length], vec![Value::from(1)]);
        let result = apply_patches(&base, [&patch]).unwrap();
        assert_eq!(result.to_json(), json!([1]));
    }

    #[test]
    fn joined_logs_replay_into_written_nodes() {
        let base = node(json!({}));
        let options = CreateOptions::default().with_patches(true);
        let first = crate::create(
            &base,
            |draft| {
                let root = draft.root();
                draft.set(root, "a", node(json!({"list": []})))
            },
            &options,
        )
        .unwrap();
        let second = crate::create(
            &first.state,
            |draft| {
                let list = draft.child_at(draft.root(), &["a".into(), "list".into()])?;
                draft.array(list)?.push(1).map(drop)
            },
            &options,
        )
        .unwrap();
        let joined: Vec<Patch> = first.patches.unwrap().into_iter().chain(second.patches.unwrap()).collect();
        let replayed = apply_patches(&base, &joined).unwrap();
        assert_eq!(replayed.to_json(), json!({"a": {"list": [1]}}));
        assert_eq!(first.state.to_json(), json!({"a": {"list": []}}));
    }

    #[test]
    fn replay_leaves_patch_arguments_untouched() {
        let base = node(json!({}));
        let written = node(json!({"list": []}));
        let patches = vec![
            Patch::new(Operation::Set, vec!["a".into()], vec![Value::from(written.clone())]),
            Patch::new(Operation::Push, vec!["a".into(), "list".into()], vec![Value::from(1)]),
        ];
        let replayed = apply_patches(&base, &patches).unwrap();
        assert_eq!(replayed.to_json(), json!({"a": {"list": [1]}}));
        assert_eq!(written.to_json(), json!({"list": []}));
        assert!(!replayed.child("a").unwrap().ptr_eq(&written));
    }

    #[test]
    fn malformed_patches_are_rejected() {
        let base = node(json!({"a": 1}));
        let bad_path = Patch::new(Operation::Push, vec!["a".into()], vec![Value::from(1)]);
        assert!(matches!(apply_patches(&base, [&bad_path]), Err(DraftError::InvalidPatch(_))));
        let bad_arity = Patch::new(Operation::Reverse, vec![], vec![Value::from(1)]);
        assert!(matches!(apply_patches(&base, [&bad_arity]), Err(DraftError::InvalidPatch(_))));
        let empty_path = Patch::new(Operation::Set, vec![], vec![Value::from(1)]);
        assert!(matches!(apply_patches(&base, [&empty_path]), Err(DraftError::InvalidPatch(_))));
    }
}
