use std::error::Error;
use std::fmt;

use crate::error::{DomainError, EvalError};
use crate::frame::StackFrame;

/// Raw failure reported by a script backend, before normalization.
///
/// `Wrapped` layers record the calls the failure travelled through; every
/// other variant is a root cause.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendFailure {
    Wrapped {
        context: String,
        frame: StackFrame,
        inner: Box<BackendFailure>,
    },
    Domain(DomainError),
    Raised {
        message: String,
        frame: Option<StackFrame>,
    },
    Interrupted,
    Panicked {
        message: String,
    },
}

impl BackendFailure {
    pub fn raised(message: impl Into<String>) -> Self {
        Self::Raised {
            message: message.into(),
            frame: None,
        }
    }

    pub fn wrap(self, context: impl Into<String>, frame: StackFrame) -> Self {
        Self::Wrapped {
            context: context.into(),
            frame,
            inner: Box::new(self),
        }
    }

    pub fn innermost(&self) -> &BackendFailure {
        let mut current = self;
        while let Self::Wrapped { inner, .. } = current {
            current = inner;
        }
        current
    }

    /// Captured frames, innermost first.
    pub fn frames(&self) -> Vec<StackFrame> {
        let mut frames = Vec::new();
        let mut current = self;
        loop {
            match current {
                Self::Wrapped { frame, inner, .. } => {
                    frames.push(frame.clone());
                    current = inner;
                }
                Self::Raised {
                    frame: Some(frame), ..
                } => {
                    frames.push(frame.clone());
                    break;
                }
                _ => break,
            }
        }
        frames.reverse();
        frames
    }

    /// Classifies the innermost cause. Anything that is not a host domain
    /// error, an interrupt included, becomes a script failure.
    pub fn normalize(&self) -> EvalError {
        match self.innermost() {
            Self::Domain(error) => EvalError::Domain(error.clone()),
            innermost => EvalError::ScriptFailure {
                message: innermost.message(),
                trace: self.frames(),
            },
        }
    }

    /// Message of this layer alone, without position decoration.
    pub fn message(&self) -> String {
        match self {
            Self::Raised { message, .. } | Self::Panicked { message } => message.clone(),
            Self::Wrapped { context, .. } => context.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wrapped { context, frame, .. } => write!(f, "{} at {}", context, frame),
            Self::Domain(error) => write!(f, "{}", error),
            Self::Raised {
                message,
                frame: Some(frame),
            } => write!(f, "{} at {}", message, frame),
            Self::Raised {
                message,
                frame: None,
            } => write!(f, "{}", message),
            Self::Interrupted => write!(f, "script execution interrupted"),
            Self::Panicked { message } => write!(f, "script backend panicked: {}", message),
        }
    }
}

impl Error for BackendFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Wrapped { inner, .. } => Some(inner.as_ref()),
            Self::Domain(error) => Some(error),
            _ => None,
        }
    }
}

impl From<DomainError> for BackendFailure {
    fn from(error: DomainError) -> Self {
        Self::Domain(error)
    }
}
