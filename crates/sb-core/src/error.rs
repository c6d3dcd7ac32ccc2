use thiserror::Error;

use crate::frame::StackFrame;

/// Error belonging to the host application's own family.
///
/// It crosses the scripting layer untouched: whatever `code` and `message`
/// the host raised are what the caller of `evaluate` receives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct DomainError {
    pub code: String,
    pub message: String,
}

impl DomainError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

pub const ENGINE_UNAVAILABLE_CODE: &str = "EVAL_ENGINE_UNAVAILABLE";
pub const SCRIPT_FAILURE_CODE: &str = "EVAL_SCRIPT_FAILURE";
pub const TIMEOUT_CODE: &str = "EVAL_TIMEOUT";

/// Normalized outcome of a failed evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("no script backend available (tried \"{preferred}\" and \"{fallback}\")")]
    EngineUnavailable { preferred: String, fallback: String },
    #[error("{message}")]
    ScriptFailure {
        message: String,
        /// Innermost frame first.
        trace: Vec<StackFrame>,
    },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("script exceeded time limit of {limit_ms} ms")]
    Timeout { limit_ms: u64 },
}

impl EvalError {
    pub fn script_failure(message: impl Into<String>) -> Self {
        Self::ScriptFailure {
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// Stable code for line protocols and logs. Domain errors keep their own.
    pub fn code(&self) -> &str {
        match self {
            Self::EngineUnavailable { .. } => ENGINE_UNAVAILABLE_CODE,
            Self::ScriptFailure { .. } => SCRIPT_FAILURE_CODE,
            Self::Domain(error) => &error.code,
            Self::Timeout { .. } => TIMEOUT_CODE,
        }
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_passes_through_display_and_code() {
        let error = EvalError::from(DomainError::new("WORLD_LOCKED", "region is locked"));
        assert_eq!(error.to_string(), "WORLD_LOCKED: region is locked");
        assert_eq!(error.code(), "WORLD_LOCKED");
        assert_eq!(
            error.as_domain(),
            Some(&DomainError::new("WORLD_LOCKED", "region is locked"))
        );
    }

    #[test]
    fn codes_are_stable_per_kind() {
        let unavailable = EvalError::EngineUnavailable {
            preferred: "rhai".to_string(),
            fallback: "rhai-raw".to_string(),
        };
        assert_eq!(unavailable.code(), ENGINE_UNAVAILABLE_CODE);
        assert!(unavailable.to_string().contains("\"rhai-raw\""));
        assert_eq!(
            EvalError::script_failure("boom").code(),
            SCRIPT_FAILURE_CODE
        );
        assert_eq!(EvalError::script_failure("boom").to_string(), "boom");
        let timeout = EvalError::Timeout { limit_ms: 50 };
        assert_eq!(timeout.code(), TIMEOUT_CODE);
        assert_eq!(timeout.to_string(), "script exceeded time limit of 50 ms");
        assert!(timeout.as_domain().is_none());
    }
}
