//! Draft throughput on large documents.
//!
//! Run:  cargo run --example perf --release -p immute

use std::time::Instant;

use immute::{apply_patches, create, CreateOptions, Node, Value};

// ── harness ───────────────────────────────────────────────────────────────────

fn bench<F: FnMut()>(n: u32, mut f: F) -> u64 {
    let warmup = std::cmp::max(5, n / 10);
    for _ in 0..warmup {
        f();
    }
    let start = Instant::now();
    for _ in 0..n {
        f();
    }
    let elapsed = start.elapsed();
    (n as f64 / elapsed.as_secs_f64()) as u64
}

fn fmt(n: u64) -> String {
    let s = n.to_string();
    let mut out = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.chars().rev().collect()
}

fn row(label: &str, ops: u64) {
    println!("  {:<24}  {:>12} op/s", label, fmt(ops));
}

// ── documents ─────────────────────────────────────────────────────────────────

/// `{"0": {"i": 0}, "1": {"i": 1}, ...}`
fn wide_object(n: usize) -> Node {
    Node::object_from((0..n).map(|i| {
        let item = Node::object_from([("i", Value::from(i))]);
        (i.to_string(), Value::from(item))
    }))
}

/// `{"b": {"c": 2}, "a": [{"0": 0}, {"1": 1}, ...]}`
fn long_array(n: usize) -> Node {
    let items = (0..n).map(|i| Value::from(Node::object_from([(i.to_string(), Value::from(i))])));
    Node::object_from([
        ("b", Value::from(Node::object_from([("c", Value::from(2))]))),
        ("a", Value::from(Node::array_from(items))),
    ])
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() {
    println!("\n  immute  draft benchmarks\n");
    println!("  {:<24}  {:>12}", "operation", "ops/sec");
    println!("  {}", "-".repeat(40));

    let wide = wide_object(100_000);
    row(
        "wide_object_nested_set",
        bench(50, || {
            let outcome = create(
                &wide,
                |draft| {
                    let first = draft.child(draft.root(), "0")?;
                    draft.set(first, "c", Node::object_from([("i", Value::from(0))]))
                },
                &CreateOptions::default(),
            );
            assert!(outcome.is_ok());
        }),
    );

    let long = long_array(100_000);
    let options = CreateOptions::default().with_patches(true);
    row(
        "long_array_push",
        bench(50, || {
            let outcome = create(
                &long,
                |draft| {
                    let root = draft.root();
                    let b = draft.child(root, "b")?;
                    draft.set(b, "c", 3)?;
                    let a = draft.child(root, "a")?;
                    draft.array(a)?.push(Node::object_from([("1", Value::from(1))])).map(drop)
                },
                &options,
            );
            assert!(outcome.is_ok());
        }),
    );

    let small = long_array(100);
    let recorded = create(
        &small,
        |draft| {
            let a = draft.child(draft.root(), "a")?;
            let mut list = draft.array(a)?;
            list.reverse()?;
            list.splice(10, 20, Vec::new())?;
            list.push(0)?;
            Ok(())
        },
        &options,
    );
    if let Ok(outcome) = recorded {
        let patches = outcome.patches.unwrap_or_default();
        row(
            "apply_patches_small",
            bench(10_000, || {
                assert!(apply_patches(&small, &patches).is_ok());
            }),
        );
    }

    println!();
}
