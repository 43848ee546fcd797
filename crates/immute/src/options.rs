use std::fmt;
use std::rc::Rc;

use immute_value::Node;
use serde::Deserialize;

/// Opt-out predicate: nodes it accepts are never drafted and are read and
/// written in place.
pub type MutablePredicate = Rc<dyn Fn(&Node) -> bool>;

/// Options for [`crate::create`].
///
/// The boolean flags deserialize from config files (snake_case or the
/// camelCase spelling); the `mutable` predicate can only be set from code.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateOptions {
    /// Record forward and inverse patches.
    #[serde(alias = "enablePatches")]
    pub enable_patches: bool,
    /// Deep-freeze the result before returning it.
    #[serde(alias = "enableFreeze")]
    pub enable_freeze: bool,
    #[serde(skip)]
    pub mutable: Option<MutablePredicate>,
}

impl CreateOptions {
    pub fn with_patches(mut self, enable: bool) -> Self {
        self.enable_patches = enable;
        self
    }

    pub fn with_freeze(mut self, enable: bool) -> Self {
        self.enable_freeze = enable;
        self
    }

    pub fn with_mutable(mut self, predicate: impl Fn(&Node) -> bool + 'static) -> Self {
        self.mutable = Some(Rc::new(predicate));
        self
    }

    pub(crate) fn is_mutable(&self, node: &Node) -> bool {
        self.mutable.as_ref().is_some_and(|m| m(node))
    }
}

impl fmt::Debug for CreateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateOptions")
            .field("enable_patches", &self.enable_patches)
            .field("enable_freeze", &self.enable_freeze)
            .field("mutable", &self.mutable.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}
