//! Patch Recorder and replay.

mod apply;
mod recorder;
mod types;

pub use apply::apply_patches;
pub(crate) use recorder::{PatchRecorder, Recorded};
pub use types::{Operation, Patch};
