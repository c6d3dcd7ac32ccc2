mod backend;
mod context;
mod evaluator;
mod host;
mod introspect;
mod provider;
mod report;
mod rhai_backend;

mod helpers {
    pub(crate) mod rhai_bridge;
}

pub use backend::{EngineHandle, ScriptBackend};
pub use context::{
    current_context, interrupt_requested, CancelToken, ExecutionContext, ExecutionContextGuard,
};
pub use evaluator::{
    EvaluationRequest, ScriptEvaluator, DEFAULT_HOST_NAME, DEFAULT_SCRIPT_LABEL,
};
pub use host::{EmptyHostFunctionRegistry, HostFunctionRegistry, RESERVED_HOST_FUNCTION_NAMES};
pub use introspect::{
    EvalErrorIntrospector, FailureIntrospector, RhaiIntrospector, StackIntrospector,
};
pub use provider::{
    BackendFactory, BackendRegistry, EngineProvider, FALLBACK_BACKEND, PREFERRED_BACKEND,
};
pub use report::{FailureReporter, NoopReporter, TracingReporter};
pub use rhai_backend::{RhaiBackend, RhaiBackendOptions};
