pub mod error;
pub mod failure;
pub mod frame;
pub mod value;

pub use error::{DomainError, EvalError};
pub use failure::BackendFailure;
pub use frame::StackFrame;
pub use value::*;
