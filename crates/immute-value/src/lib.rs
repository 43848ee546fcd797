//! immute-value - the object graph the immute draft engine works on.
//!
//! Values are JSON-like primitives plus shared container [`Node`]s (objects,
//! arrays, sets and maps). Nodes are compared by identity, so "did this
//! subtree change" is a pointer comparison.

pub mod equal;
pub mod error;
pub mod freeze;
pub mod json;
pub mod node;
pub mod value;

pub use equal::deep_equal;
pub use error::NodeError;
pub use freeze::freeze_deep;
pub use node::{Node, NodeData, NodeIdentity, NodeKind};
pub use value::Value;
