use sb_core::BackendFailure;

/// Where raw failures go before they are normalized for the caller.
pub trait FailureReporter: Send + Sync {
    fn report(&self, label: &str, failure: &BackendFailure);

    fn timed_out(&self, label: &str, limit_ms: u64);

    fn engine_unavailable(&self, label: &str, preferred: &str, fallback: &str);
}

/// Logs failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, label: &str, failure: &BackendFailure) {
        let trace = failure
            .frames()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        tracing::error!(script = label, error = %failure, trace = ?trace, "script evaluation failed");
    }

    fn timed_out(&self, label: &str, limit_ms: u64) {
        tracing::error!(script = label, limit_ms, "script evaluation timed out");
    }

    fn engine_unavailable(&self, label: &str, preferred: &str, fallback: &str) {
        tracing::error!(script = label, preferred, fallback, "no script backend available");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl FailureReporter for NoopReporter {
    fn report(&self, _label: &str, _failure: &BackendFailure) {}

    fn timed_out(&self, _label: &str, _limit_ms: u64) {}

    fn engine_unavailable(&self, _label: &str, _preferred: &str, _fallback: &str) {}
}
