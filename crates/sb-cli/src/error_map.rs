use std::fmt::Display;

use sb_core::{EvalError, StackFrame};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub(crate) struct CliError {
    pub(crate) code: String,
    pub(crate) message: String,
    pub(crate) trace: Vec<StackFrame>,
}

impl CliError {
    pub(crate) fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            trace: Vec::new(),
        }
    }
}

impl From<EvalError> for CliError {
    fn from(error: EvalError) -> Self {
        let message = match &error {
            EvalError::Domain(domain) => domain.message.clone(),
            other => other.to_string(),
        };
        let trace = match &error {
            EvalError::ScriptFailure { trace, .. } => trace.clone(),
            _ => Vec::new(),
        };
        Self {
            code: error.code().to_string(),
            message,
            trace,
        }
    }
}

fn map_error(code: &'static str, error: impl Display) -> CliError {
    CliError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: CliError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "\"\"".to_string())
    );
    for frame in &error.trace {
        println!("ERROR_FRAME:{}", frame);
    }
    1
}

pub(crate) fn map_cli_script_read(error: std::io::Error) -> CliError {
    map_error("CLI_SCRIPT_READ", error)
}

pub(crate) fn map_cli_bindings_read(error: std::io::Error) -> CliError {
    map_error("CLI_BINDINGS_READ", error)
}

pub(crate) fn map_cli_bindings_invalid(error: serde_json::Error) -> CliError {
    map_error("CLI_BINDINGS_INVALID", error)
}

pub(crate) fn map_cli_output_encode(error: serde_json::Error) -> CliError {
    map_error("CLI_OUTPUT_ENCODE", error)
}

#[cfg(test)]
mod error_map_tests {
    use super::*;
    use sb_core::DomainError;

    #[test]
    fn emit_error_returns_non_zero_exit_code() {
        let code = emit_error(CliError::new("ERR", "failed"));
        assert_eq!(code, 1);
    }

    #[test]
    fn mapping_helpers_keep_error_codes() {
        assert_eq!(
            map_cli_script_read(std::io::Error::other("read")).code,
            "CLI_SCRIPT_READ"
        );
        assert_eq!(
            map_cli_bindings_read(std::io::Error::other("read")).code,
            "CLI_BINDINGS_READ"
        );

        let invalid = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        assert_eq!(
            map_cli_bindings_invalid(invalid).code,
            "CLI_BINDINGS_INVALID"
        );
        let invalid = serde_json::from_str::<serde_json::Value>("[").expect_err("invalid json");
        assert_eq!(map_cli_output_encode(invalid).code, "CLI_OUTPUT_ENCODE");
    }

    #[test]
    fn eval_errors_keep_their_codes() {
        let domain = CliError::from(EvalError::Domain(DomainError::new("REGION", "locked")));
        assert_eq!(domain.code, "REGION");
        assert_eq!(domain.message, "locked");

        let failure = CliError::from(EvalError::ScriptFailure {
            message: "bad".to_string(),
            trace: vec![StackFrame::new("a.rhai")],
        });
        assert_eq!(failure.code, "EVAL_SCRIPT_FAILURE");
        assert_eq!(failure.trace.len(), 1);

        let timeout = CliError::from(EvalError::Timeout { limit_ms: 9 });
        assert_eq!(timeout.code, "EVAL_TIMEOUT");
    }
}
