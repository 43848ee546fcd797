use std::fmt;

use immute_value::Value;

use crate::key::{format_path, Key};

/// Operation vocabulary of recorded patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Delete,
    Set,
    Clear,
    Add,
    Pop,
    Push,
    Shift,
    Unshift,
    Splice,
    Reverse,
    /// Rebuilds a cleared set or map from its prior contents.
    Construct,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Delete => "delete",
            Operation::Set => "set",
            Operation::Clear => "clear",
            Operation::Add => "add",
            Operation::Pop => "pop",
            Operation::Push => "push",
            Operation::Shift => "shift",
            Operation::Unshift => "unshift",
            Operation::Splice => "splice",
            Operation::Reverse => "reverse",
            Operation::Construct => "construct",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded edit.
///
/// Member operations (`Set`/`Delete` on objects and arrays) have a path that
/// ends with the member key. Container operations have a path to the
/// container itself; map `Set`/`Delete` carry the key as their first argument
/// and set `Add`/`Delete` carry the member.
///
/// | op          | args                                    |
/// |-------------|-----------------------------------------|
/// | `Set`       | `[value]`, or `[key, value]` on a map   |
/// | `Delete`    | `[]`, or `[key]` / `[member]`           |
/// | `Add`       | `[member]`                              |
/// | `Push`      | values appended                         |
/// | `Unshift`   | values prepended                        |
/// | `Splice`    | `[start, delete_count, ..inserted]`     |
/// | `Construct` | set members, or `k1, v1, k2, v2, ..`    |
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub op: Operation,
    pub path: Vec<Key>,
    pub args: Vec<Value>,
}

impl Patch {
    pub fn new(op: Operation, path: Vec<Key>, args: Vec<Value>) -> Self {
        Self { op, path, args }
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, format_path(&self.path))?;
        if !self.args.is_empty() {
            let args: Vec<_> = self.args.iter().map(Value::to_json).collect();
            write!(f, " {}", serde_json::Value::Array(args))?;
        }
        Ok(())
    }
}
