use immute_value::{NodeError, NodeKind};
use thiserror::Error;

use crate::key::Key;

#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    /// Prototype changes, descriptor definitions and writes that would make
    /// the result cyclic.
    #[error("unsupported draft operation: {0}")]
    UnsupportedOperation(&'static str),
    /// Internal state is inconsistent. Indicates a bug in the engine.
    #[error("draft invariant violated: {0}")]
    InvariantViolation(String),
    #[error("expected {expected} draft, found {found}")]
    KindMismatch { expected: NodeKind, found: NodeKind },
    #[error("key {key} is not valid for a {kind} draft")]
    InvalidKey { kind: NodeKind, key: Key },
    #[error("value at {0} is not a draftable node")]
    NotDraftable(Key),
    #[error("draft handle belongs to another invocation")]
    ForeignHandle,
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
    #[error(transparent)]
    Node(#[from] NodeError),
}
