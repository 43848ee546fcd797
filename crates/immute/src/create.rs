use immute_value::{freeze_deep, Node, Value};

use crate::draft::Draft;
use crate::error::DraftError;
use crate::options::CreateOptions;
use crate::patch::Patch;

/// Result of [`create`].
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The new state. Identical to the base when nothing changed.
    pub state: Node,
    /// Forward patches, present when patches were enabled.
    pub patches: Option<Vec<Patch>>,
    /// Inverse patches in recording order, present when patches were enabled.
    pub inverse_patches: Option<Vec<Patch>>,
}

/// Runs `mutate` against a draft of `base` and returns the finalized state.
///
/// `base` is never written. An error returned by `mutate` aborts the
/// invocation; nothing is finalized.
pub fn create<F>(base: &Node, mutate: F, options: &CreateOptions) -> Result<Outcome, DraftError>
where
    F: FnOnce(&mut Draft) -> Result<(), DraftError>,
{
    run(Draft::new(base.clone(), options), mutate, options)
}

pub(crate) fn run<F>(mut draft: Draft, mutate: F, options: &CreateOptions) -> Result<Outcome, DraftError>
where
    F: FnOnce(&mut Draft) -> Result<(), DraftError>,
{
    if let Err(error) = mutate(&mut draft) {
        tracing::debug!(error = %error, "mutation aborted, draft discarded");
        return Err(error);
    }
    let finalized = draft.finalize()?;
    if options.enable_freeze {
        freeze_deep(&Value::Node(finalized.state.clone()), &|node| options.is_mutable(node));
    }
    let (patches, inverse_patches) = match finalized.patches {
        Some((forward, inverse)) => (Some(forward), Some(inverse)),
        None => (None, None),
    };
    Ok(Outcome {
        state: finalized.state,
        patches,
        inverse_patches,
    })
}
