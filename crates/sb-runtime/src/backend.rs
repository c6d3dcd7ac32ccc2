use std::fmt;
use std::sync::Arc;

use sb_core::{BackendFailure, Bindings, SbValue};

/// Scripting capability behind the evaluator: given code text, a diagnostic
/// label and bindings, produce a value or fail.
///
/// Implementations run on whichever thread calls them and should check
/// [`crate::interrupt_requested`] often enough for time limits to bite.
pub trait ScriptBackend: Send + Sync {
    fn eval(&self, code: &str, label: &str, bindings: &Bindings)
        -> Result<SbValue, BackendFailure>;
}

/// Shared reference to a constructed backend.
#[derive(Clone)]
pub struct EngineHandle {
    name: String,
    backend: Arc<dyn ScriptBackend>,
}

impl EngineHandle {
    pub fn new(name: impl Into<String>, backend: Arc<dyn ScriptBackend>) -> Self {
        Self {
            name: name.into(),
            backend,
        }
    }

    /// Registry identifier the backend was resolved under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> &Arc<dyn ScriptBackend> {
        &self.backend
    }

    pub fn ptr_eq(&self, other: &EngineHandle) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
