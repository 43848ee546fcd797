use thiserror::Error;

use crate::node::NodeKind;

/// Errors raised by direct (non-draft) access to a [`Node`](crate::Node).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NodeError {
    /// A write hit a node that was frozen by `freeze_deep` or `Node::freeze`.
    #[error("cannot write to frozen {kind} node")]
    FrozenWriteViolation { kind: NodeKind },
    #[error("expected {expected} node, found {found}")]
    KindMismatch { expected: NodeKind, found: NodeKind },
    #[error("value is not an object, array, set or map")]
    NotANode,
    /// The node is currently borrowed through `Node::data`.
    #[error("node is borrowed and cannot be written")]
    Borrowed,
}
