//! immute - copy-on-write drafts over shared object graphs.
//!
//! [`create`] hands a [`Draft`] of a base graph to a closure. The closure
//! reads and writes through [`DraftRef`] handles; only the nodes it actually
//! touches are copied, and the finalized result shares every untouched
//! subtree with the base by identity. With patches enabled the invocation
//! also returns forward and inverse [`Patch`] logs that [`apply_patches`]
//! can replay.
//!
//! ```
//! use immute::{create, CreateOptions, Node};
//! use serde_json::json;
//!
//! let base = Node::from_json(&json!({"a": 1, "b": {"c": 2}})).unwrap();
//! let outcome = create(
//!     &base,
//!     |draft| {
//!         let root = draft.root();
//!         draft.set(root, "a", 2)
//!     },
//!     &CreateOptions::default().with_patches(true),
//! )
//! .unwrap();
//!
//! assert_eq!(outcome.state.to_json(), json!({"a": 2, "b": {"c": 2}}));
//! assert!(outcome.state.child("b").unwrap().ptr_eq(&base.child("b").unwrap()));
//! assert_eq!(outcome.patches.unwrap().len(), 1);
//! ```

mod copy;
mod create;
mod draft;
mod error;
mod finalize;
mod key;
mod options;
pub mod patch;
mod propagate;
mod store;

pub use create::{create, Outcome};
pub use draft::{default_order, ArrayDraft, Draft, DraftRef, DraftValue, MapDraft, ObjectDraft, PropertyDescriptor, SetDraft};
pub use error::DraftError;
pub use immute_value::{deep_equal, Node, NodeError, NodeKind, Value};
pub use key::Key;
pub use options::{CreateOptions, MutablePredicate};
pub use patch::{apply_patches, Operation, Patch};
