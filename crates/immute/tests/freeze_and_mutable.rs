mod common;

use common::assertions::at;
use common::fixtures::node;
use immute::{create, CreateOptions, DraftValue, Node, NodeError, NodeKind, Value};
use serde_json::json;

fn plain(value: Option<DraftValue>) -> Node {
    value
        .and_then(DraftValue::into_value)
        .and_then(Value::into_node)
        .unwrap_or_else(|| panic!("expected a plain node"))
}

fn frozen_write(kind: NodeKind) -> NodeError {
    NodeError::FrozenWriteViolation { kind }
}

#[test]
fn freeze_covers_new_and_shared_nodes() {
    let base = node(json!({"bar": {"a": 1}, "list": [{"id": 1}]}));
    let state = create(
        &base,
        |draft| {
            let root = draft.root();
            let list = draft.child(root, "list")?;
            draft.array(list)?.push(node(json!({"id": 2})))?;
            let bar = draft.child(root, "bar")?;
            draft.set(bar, "a", 2)
        },
        &CreateOptions::default().with_freeze(true),
    )
    .unwrap_or_else(|e| panic!("create failed: {e}"))
    .state;

    assert_eq!(state.to_json(), json!({"bar": {"a": 2}, "list": [{"id": 1}, {"id": 2}]}));
    assert!(!base.is_frozen());
    assert_eq!(at(&state, &["bar"]).insert("a", 3), Err(frozen_write(NodeKind::Object)));
    let list = at(&state, &["list"]);
    assert_eq!(list.push(Node::object()), Err(frozen_write(NodeKind::Array)));
    for index in 0..2 {
        let item = list.child_at(index).unwrap();
        assert_eq!(item.insert("id", 3), Err(frozen_write(NodeKind::Object)));
    }

    // Drafting a frozen state works; only the new nodes are writable.
    let next = create(
        &state,
        |draft| {
            let root = draft.root();
            let list = draft.child(root, "list")?;
            draft.array(list)?.push(node(json!({"id": 3})))?;
            let bar = draft.child(root, "bar")?;
            draft.set(bar, "a", 5)
        },
        &CreateOptions::default(),
    )
    .unwrap_or_else(|e| panic!("create over frozen state failed: {e}"))
    .state;
    let next_list = at(&next, &["list"]);
    assert!(next_list.child_at(0).unwrap().insert("id", 3).is_err());
    assert!(next_list.child_at(1).unwrap().insert("id", 3).is_err());
    assert_eq!(next_list.push(Node::object()), Ok(4));
    assert_eq!(at(&next, &["bar"]).insert("a", 4), Ok(Some(Value::from(5))));
}

#[test]
fn frozen_sets_and_maps_reject_writes() {
    let base = Node::object_from([
        ("set", Value::from(Node::set_from([Value::from(1), Value::from(2), Value::from(3)]))),
        (
            "map",
            Value::from(Node::map_from([
                (Value::from(1), Value::from(1)),
                (Value::from(2), Value::from(2)),
            ])),
        ),
    ]);
    let state = create(
        &base,
        |draft| {
            let root = draft.root();
            let set = draft.child(root, "set")?;
            draft.set_view(set)?.delete(2)?;
            let map = draft.child(root, "map")?;
            draft.map(map)?.delete(2)?;
            Ok(())
        },
        &CreateOptions::default().with_freeze(true),
    )
    .unwrap_or_else(|e| panic!("create failed: {e}"))
    .state;

    assert_eq!(state.to_json(), json!({"set": [1, 3], "map": [[1, 1]]}));
    let set = at(&state, &["set"]);
    assert_eq!(set.add(4), Err(frozen_write(NodeKind::Set)));
    assert_eq!(set.delete(&Value::from(1)), Err(frozen_write(NodeKind::Set)));
    assert_eq!(set.clear(), Err(frozen_write(NodeKind::Set)));
    let map = at(&state, &["map"]);
    assert_eq!(map.map_insert(4, 4), Err(frozen_write(NodeKind::Map)));
    assert_eq!(map.clear(), Err(frozen_write(NodeKind::Map)));
}

#[test]
fn mutable_node_is_written_in_place() {
    let base = node(json!({"foo": {"bar": "str"}, "foobar": {}}));
    let foobar = base.child("foobar").unwrap();
    let target = foobar.clone();
    let outcome = create(
        &base,
        |draft| {
            let root = draft.root();
            let foobar = plain(draft.get(root, "foobar")?);
            foobar.insert("text", "new text")?;
            Ok(())
        },
        &CreateOptions::default()
            .with_patches(true)
            .with_mutable(move |n| n.ptr_eq(&target)),
    )
    .unwrap_or_else(|e| panic!("create failed: {e}"));

    assert!(outcome.state.ptr_eq(&base));
    assert_eq!(outcome.patches, Some(Vec::new()));
    assert_eq!(foobar.to_json(), json!({"text": "new text"}));
}

#[test]
fn mutable_nodes_beside_drafted_ones() {
    let base = Node::object_from([
        ("foo", Value::from(node(json!({"bar": "str"})))),
        ("obj", Value::from(Node::object())),
        ("arr", Value::from(Node::array())),
        ("set", Value::from(Node::set())),
        ("map", Value::from(Node::map())),
    ]);
    let mutable: Vec<Node> = ["obj", "arr", "set", "map"]
        .iter()
        .map(|k| base.child(k).unwrap())
        .collect();
    let predicate = mutable.clone();
    let state = create(
        &base,
        |draft| {
            let root = draft.root();
            let foo = draft.child(root, "foo")?;
            draft.set(foo, "bar", "new str")?;
            plain(draft.get(root, "obj")?).insert("text", "new text")?;
            plain(draft.get(root, "arr")?).push("new text")?;
            plain(draft.get(root, "set")?).add("new text")?;
            plain(draft.get(root, "map")?).map_insert(1, "new text")?;
            Ok(())
        },
        &CreateOptions::default()
            .with_freeze(true)
            .with_mutable(move |n| predicate.iter().any(|m| m.ptr_eq(n))),
    )
    .unwrap_or_else(|e| panic!("create failed: {e}"))
    .state;

    assert_eq!(
        state.to_json(),
        json!({
            "foo": {"bar": "new str"},
            "obj": {"text": "new text"},
            "arr": ["new text"],
            "set": ["new text"],
            "map": [[1, "new text"]]
        })
    );
    assert!(!state.ptr_eq(&base));
    assert!(!at(&state, &["foo"]).ptr_eq(&at(&base, &["foo"])));
    assert!(state.is_frozen());
    for (key, original) in ["obj", "arr", "set", "map"].iter().zip(&mutable) {
        let kept = state.child(key).unwrap();
        assert!(kept.ptr_eq(original), "{key} should be the mutable node itself");
        assert!(!kept.is_frozen(), "{key} should stay writable");
    }
}

#[test]
fn caller_written_nodes_stay_the_callers() {
    let base = Node::object_from([
        ("foo", Value::from(node(json!({"bar": "str"})))),
        ("foobar", Value::from(Node::object())),
        ("arr", Value::from(node(json!([{}])))),
        ("set", Value::from(Node::set_from([Value::from(Node::object())]))),
        ("map", Value::from(Node::map_from([(Value::from(1), Value::from(Node::object()))]))),
    ]);
    let fresh: Vec<Node> = (0..4).map(|_| Node::object()).collect();
    let written = fresh.clone();
    let outcome = create(
        &base,
        |draft| {
            let root = draft.root();

            draft.set(root, "foobar", written[0].clone())?;
            plain(draft.get(root, "foobar")?).insert("text", "new text0")?;
            written[0].insert("text", "new text1")?;

            let arr = draft.child(root, "arr")?;
            let mut list = draft.array(arr)?;
            list.pop()?;
            list.push(written[1].clone())?;
            plain(list.get(0)?).insert("text", "new text")?;

            let set = draft.child(root, "set")?;
            let mut set = draft.set_view(set)?;
            set.clear()?;
            set.add(written[2].clone())?;
            let member = set.values()?.into_iter().next();
            plain(member).insert("text", "new text")?;

            let map = draft.child(root, "map")?;
            let mut map = draft.map(map)?;
            map.delete(1)?;
            map.set(1, written[3].clone())?;
            plain(map.get(1)?).insert("text", "new text")?;
            Ok(())
        },
        &CreateOptions::default(),
    )
    .unwrap_or_else(|e| panic!("create failed: {e}"));
    let state = &outcome.state;

    assert_eq!(
        state.to_json(),
        json!({
            "foo": {"bar": "str"},
            "foobar": {"text": "new text1"},
            "arr": [{"text": "new text"}],
            "set": [{"text": "new text"}],
            "map": [[1, {"text": "new text"}]]
        })
    );
    assert!(at(state, &["foo"]).ptr_eq(&at(&base, &["foo"])));
    assert!(at(state, &["foobar"]).ptr_eq(&fresh[0]));
    assert!(at(state, &["arr"]).child_at(0).unwrap().ptr_eq(&fresh[1]));
    let set_member = at(state, &["set"]).values().remove(0);
    assert!(set_member.as_node().unwrap().ptr_eq(&fresh[2]));
    let map_value = at(state, &["map"]).map_get(&Value::from(1)).unwrap();
    assert!(map_value.as_node().unwrap().ptr_eq(&fresh[3]));
}
