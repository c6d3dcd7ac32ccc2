use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sb_core::{BackendFailure, Bindings, EvalError, SbValue};

use crate::backend::EngineHandle;
use crate::context::{ExecutionContext, ExecutionContextGuard};
use crate::provider::EngineProvider;
use crate::report::{FailureReporter, TracingReporter};

pub const DEFAULT_SCRIPT_LABEL: &str = "<script>";
pub const DEFAULT_HOST_NAME: &str = "scriptbridge";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationRequest {
    pub code: String,
    pub filename: Option<String>,
    pub bindings: Option<Bindings>,
    /// Overrides the evaluator's limit for this call; `Some(0)` disables it.
    pub time_limit_ms: Option<u64>,
}

impl EvaluationRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = Some(bindings);
        self
    }

    pub fn time_limit_ms(mut self, limit_ms: u64) -> Self {
        self.time_limit_ms = Some(limit_ms);
        self
    }
}

/// Runs untrusted script text against a backend obtained from an
/// [`EngineProvider`].
///
/// Every call installs its own [`ExecutionContext`] on the calling thread
/// for the duration of the call. Failures come back as [`EvalError`]:
/// host domain errors keep their identity, anything else is reduced to the
/// message of its innermost cause.
pub struct ScriptEvaluator {
    provider: Arc<EngineProvider>,
    host: String,
    reporter: Arc<dyn FailureReporter>,
    time_limit_ms: u64,
}

impl ScriptEvaluator {
    pub fn new(provider: Arc<EngineProvider>) -> Self {
        Self {
            provider,
            host: DEFAULT_HOST_NAME.to_string(),
            reporter: Arc::new(TracingReporter),
            time_limit_ms: 0,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Wall-clock budget per call in milliseconds; `0` means unlimited.
    pub fn set_time_limit(&mut self, milliseconds: u64) {
        self.time_limit_ms = milliseconds;
    }

    pub fn time_limit(&self) -> u64 {
        self.time_limit_ms
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn provider(&self) -> &Arc<EngineProvider> {
        &self.provider
    }

    pub fn evaluate(
        &self,
        code: &str,
        filename: Option<&str>,
        bindings: Option<&Bindings>,
    ) -> Result<SbValue, EvalError> {
        self.run(
            code,
            filename,
            bindings.cloned().unwrap_or_default(),
            self.time_limit_ms,
        )
    }

    pub fn evaluate_request(&self, request: EvaluationRequest) -> Result<SbValue, EvalError> {
        let limit_ms = request.time_limit_ms.unwrap_or(self.time_limit_ms);
        self.run(
            &request.code,
            request.filename.as_deref(),
            request.bindings.unwrap_or_default(),
            limit_ms,
        )
    }

    fn run(
        &self,
        code: &str,
        filename: Option<&str>,
        bindings: Bindings,
        limit_ms: u64,
    ) -> Result<SbValue, EvalError> {
        let label = filename.unwrap_or(DEFAULT_SCRIPT_LABEL);
        let Some(engine) = self.provider.get_engine() else {
            self.reporter.engine_unavailable(
                label,
                self.provider.preferred(),
                self.provider.fallback(),
            );
            return Err(EvalError::EngineUnavailable {
                preferred: self.provider.preferred().to_string(),
                fallback: self.provider.fallback().to_string(),
            });
        };

        let context = Arc::new(ExecutionContext::new(self.host.as_str()));
        let _guard = ExecutionContextGuard::enter(Arc::clone(&context));
        tracing::debug!(
            script = label,
            backend = engine.name(),
            bindings = bindings.len(),
            limit_ms,
            "evaluating script"
        );

        let outcome = if limit_ms == 0 {
            invoke(&engine, code, label, &bindings).map_err(Stopped::Failed)
        } else {
            invoke_with_deadline(engine, context, code, label, bindings, limit_ms)
        };
        outcome.map_err(|stopped| match stopped {
            Stopped::Failed(failure) => {
                self.reporter.report(label, &failure);
                failure.normalize()
            }
            Stopped::Expired => {
                self.reporter.timed_out(label, limit_ms);
                EvalError::Timeout { limit_ms }
            }
        })
    }
}

/// Why a backend call produced no value.
enum Stopped {
    Failed(BackendFailure),
    /// The deadline passed before the worker answered.
    Expired,
}

fn invoke(
    engine: &EngineHandle,
    code: &str,
    label: &str,
    bindings: &Bindings,
) -> Result<SbValue, BackendFailure> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        engine.backend().eval(code, label, bindings)
    }))
    .unwrap_or_else(|payload| {
        Err(BackendFailure::Panicked {
            message: panic_message(payload.as_ref()),
        })
    })
}

/// Runs the backend on a worker thread and gives up once `limit_ms` has
/// passed, cancelling the worker's context so the backend can stop.
fn invoke_with_deadline(
    engine: EngineHandle,
    context: Arc<ExecutionContext>,
    code: &str,
    label: &str,
    bindings: Bindings,
    limit_ms: u64,
) -> Result<SbValue, Stopped> {
    let (sender, receiver) = mpsc::channel();
    let worker_context = Arc::clone(&context);
    let code = code.to_string();
    let worker_label = label.to_string();

    thread::Builder::new()
        .name("sb-eval".to_string())
        .spawn(move || {
            let _guard = ExecutionContextGuard::enter(worker_context);
            let outcome = invoke(&engine, &code, &worker_label, &bindings);
            deliver(&sender, &worker_label, outcome);
        })
        .map_err(|error| {
            Stopped::Failed(BackendFailure::raised(format!(
                "Failed to start evaluation worker: {}",
                error
            )))
        })?;

    match receiver.recv_timeout(Duration::from_millis(limit_ms)) {
        Ok(outcome) => outcome.map_err(Stopped::Failed),
        Err(RecvTimeoutError::Timeout) => {
            context.cancel_token().cancel();
            Err(Stopped::Expired)
        }
        Err(RecvTimeoutError::Disconnected) => Err(Stopped::Failed(BackendFailure::Panicked {
            message: "evaluation worker exited without a result".to_string(),
        })),
    }
}

/// Hands the worker's outcome back. Returns `false` when the caller already
/// gave up on it.
fn deliver(
    sender: &mpsc::Sender<Result<SbValue, BackendFailure>>,
    label: &str,
    outcome: Result<SbValue, BackendFailure>,
) -> bool {
    match sender.send(outcome) {
        Ok(()) => true,
        Err(mpsc::SendError(Err(failure))) => {
            tracing::debug!(script = label, error = %failure, "late failure after deadline");
            false
        }
        Err(mpsc::SendError(Ok(_))) => false,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic".to_string()
}
