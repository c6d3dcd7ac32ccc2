use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use sb_core::BackendFailure;

use crate::backend::{EngineHandle, ScriptBackend};

pub const PREFERRED_BACKEND: &str = "rhai";
pub const FALLBACK_BACKEND: &str = "rhai-raw";

pub type BackendFactory =
    Arc<dyn Fn() -> Result<Arc<dyn ScriptBackend>, BackendFailure> + Send + Sync>;

/// Backends known to the host, by identifier.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Arc<dyn ScriptBackend>, BackendFailure> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    fn construct(&self, name: &str) -> Option<EngineHandle> {
        let factory = self.factories.get(name)?;
        match factory() {
            Ok(backend) => Some(EngineHandle::new(name, backend)),
            Err(failure) => {
                tracing::warn!(backend = name, error = %failure, "script backend failed to start");
                None
            }
        }
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Resolves the backend once and hands out the same handle afterwards.
pub struct EngineProvider {
    registry: BackendRegistry,
    preferred: String,
    fallback: String,
    handle: OnceLock<EngineHandle>,
    init_lock: Mutex<()>,
}

impl EngineProvider {
    pub fn new(
        registry: BackendRegistry,
        preferred: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            preferred: preferred.into(),
            fallback: fallback.into(),
            handle: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    pub fn with_defaults(registry: BackendRegistry) -> Self {
        Self::new(registry, PREFERRED_BACKEND, FALLBACK_BACKEND)
    }

    pub fn preferred(&self) -> &str {
        &self.preferred
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Returns the shared handle, constructing it on first use.
    ///
    /// `None` means neither identifier resolved; failed attempts are not
    /// cached.
    pub fn get_engine(&self) -> Option<EngineHandle> {
        if let Some(handle) = self.handle.get() {
            return Some(handle.clone());
        }

        let _lock = self
            .init_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = self.handle.get() {
            return Some(handle.clone());
        }

        let handle = self
            .registry
            .construct(&self.preferred)
            .or_else(|| self.registry.construct(&self.fallback))?;
        tracing::debug!(backend = handle.name(), "script backend constructed");
        Some(self.handle.get_or_init(|| handle).clone())
    }
}

impl fmt::Debug for EngineProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineProvider")
            .field("preferred", &self.preferred)
            .field("fallback", &self.fallback)
            .field("resolved", &self.handle.get().map(EngineHandle::name))
            .finish()
    }
}
