use immute::{apply_patches, deep_equal, Node, Outcome, Value};

/// Checks both patch laws for an outcome produced with patches enabled:
/// forward patches take `base` to the state, inverse patches applied in
/// reverse take the state back to `base`.
pub fn assert_replays(base: &Node, outcome: &Outcome) {
    let patches = outcome
        .patches
        .as_ref()
        .unwrap_or_else(|| panic!("outcome has no patches"));
    let inverse = outcome
        .inverse_patches
        .as_ref()
        .unwrap_or_else(|| panic!("outcome has no inverse patches"));
    assert_eq!(patches.len(), inverse.len(), "patch logs differ in length");

    let forward = apply_patches(base, patches).unwrap_or_else(|e| panic!("forward replay failed: {e}"));
    assert!(
        deep_equal(&Value::from(forward.clone()), &Value::from(outcome.state.clone())),
        "forward replay diverged\n  replayed: {}\n  state:    {}",
        forward.to_json(),
        outcome.state.to_json()
    );

    let undone = apply_patches(&outcome.state, inverse.iter().rev())
        .unwrap_or_else(|e| panic!("inverse replay failed: {e}"));
    assert!(
        deep_equal(&Value::from(undone.clone()), &Value::from(base.clone())),
        "inverse replay diverged\n  undone: {}\n  base:   {}",
        undone.to_json(),
        base.to_json()
    );
}

/// The node reached by following object keys from `root`.
pub fn at(root: &Node, path: &[&str]) -> Node {
    path.iter().fold(root.clone(), |node, key| {
        node.child(key)
            .unwrap_or_else(|| panic!("no node at {key:?} in {}", node.to_json()))
    })
}

pub fn assert_shared(base: &Node, state: &Node, path: &[&str]) {
    assert!(at(base, path).ptr_eq(&at(state, path)), "{path:?} should be shared with the base");
}

pub fn assert_copied(base: &Node, state: &Node, path: &[&str]) {
    assert!(!at(base, path).ptr_eq(&at(state, path)), "{path:?} should be a new node");
}
