use sb_core::{DomainError, SbValue};

/// Functions the host exposes to scripts.
///
/// A failing call raises the returned [`DomainError`] inside the script; the
/// evaluator hands it back to the caller unchanged.
pub trait HostFunctionRegistry: Send + Sync {
    fn call(&self, name: &str, args: &[SbValue]) -> Result<SbValue, DomainError>;
    fn names(&self) -> &[String];
}

#[derive(Debug, Default)]
pub struct EmptyHostFunctionRegistry {
    names: Vec<String>,
}

impl HostFunctionRegistry for EmptyHostFunctionRegistry {
    fn call(&self, name: &str, _args: &[SbValue]) -> Result<SbValue, DomainError> {
        Err(DomainError::new(
            "HOST_FUNCTION_MISSING",
            format!("Host function \"{}\" is not registered.", name),
        ))
    }

    fn names(&self) -> &[String] {
        &self.names
    }
}

/// Names scripts already rely on; hosts may not shadow them.
pub const RESERVED_HOST_FUNCTION_NAMES: &[&str] = &["print", "debug", "throw"];
