use std::sync::Arc;

use sb_core::BackendFailure;
use sb_runtime::{
    BackendRegistry, EngineProvider, FailureReporter, HostFunctionRegistry, RhaiBackend,
    RhaiBackendOptions, ScriptBackend, ScriptEvaluator, DEFAULT_HOST_NAME, FALLBACK_BACKEND,
    PREFERRED_BACKEND,
};

#[derive(Clone)]
pub struct CreateEvaluatorOptions {
    pub host_name: String,
    pub preferred_backend: String,
    pub fallback_backend: String,
    pub time_limit_ms: u64,
    pub host_functions: Option<Arc<dyn HostFunctionRegistry>>,
    pub reporter: Option<Arc<dyn FailureReporter>>,
    pub max_call_levels: Option<usize>,
    pub max_operations: Option<u64>,
}

impl Default for CreateEvaluatorOptions {
    fn default() -> Self {
        Self {
            host_name: DEFAULT_HOST_NAME.to_string(),
            preferred_backend: PREFERRED_BACKEND.to_string(),
            fallback_backend: FALLBACK_BACKEND.to_string(),
            time_limit_ms: 0,
            host_functions: None,
            reporter: None,
            max_call_levels: None,
            max_operations: None,
        }
    }
}

/// Registers the bundled rhai backends: the full engine as `"rhai"` and the
/// package-less engine as `"rhai-raw"`.
pub fn default_backend_registry(options: RhaiBackendOptions) -> BackendRegistry {
    let mut registry = BackendRegistry::new();

    let full = RhaiBackendOptions {
        raw: false,
        ..options.clone()
    };
    registry.register(PREFERRED_BACKEND, move || build_rhai(full.clone()));

    let raw = RhaiBackendOptions {
        raw: true,
        ..options
    };
    registry.register(FALLBACK_BACKEND, move || build_rhai(raw.clone()));

    registry
}

fn build_rhai(options: RhaiBackendOptions) -> Result<Arc<dyn ScriptBackend>, BackendFailure> {
    Ok(Arc::new(RhaiBackend::new(options)?))
}

/// Builds an evaluator over the default registry. The backend itself is only
/// constructed on the first evaluation.
pub fn create_evaluator(options: CreateEvaluatorOptions) -> ScriptEvaluator {
    let registry = default_backend_registry(RhaiBackendOptions {
        max_call_levels: options.max_call_levels,
        max_operations: options.max_operations,
        host_functions: options.host_functions.clone(),
        ..RhaiBackendOptions::default()
    });
    create_evaluator_with_registry(registry, options)
}

/// Same as [`create_evaluator`] over a host-supplied registry; the rhai
/// specific options are ignored.
pub fn create_evaluator_with_registry(
    registry: BackendRegistry,
    options: CreateEvaluatorOptions,
) -> ScriptEvaluator {
    let provider = EngineProvider::new(
        registry,
        options.preferred_backend,
        options.fallback_backend,
    );
    let mut evaluator = ScriptEvaluator::new(Arc::new(provider)).with_host(options.host_name);
    if let Some(reporter) = options.reporter {
        evaluator = evaluator.with_reporter(reporter);
    }
    evaluator.set_time_limit(options.time_limit_ms);
    evaluator
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_core::{DomainError, EvalError, SbValue};
    use sb_runtime::NoopReporter;
    use std::collections::BTreeMap;

    struct Guards {
        names: Vec<String>,
    }

    impl HostFunctionRegistry for Guards {
        fn call(&self, _name: &str, args: &[SbValue]) -> Result<SbValue, DomainError> {
            Err(DomainError::new(
                "SELECTION_EMPTY",
                format!("{} argument(s) given", args.len()),
            ))
        }

        fn names(&self) -> &[String] {
            &self.names
        }
    }

    #[test]
    fn default_registry_registers_both_rhai_variants() {
        let registry = default_backend_registry(RhaiBackendOptions::default());
        assert_eq!(
            registry.names(),
            vec![PREFERRED_BACKEND.to_string(), FALLBACK_BACKEND.to_string()]
        );
    }

    #[test]
    fn create_evaluator_uses_preferred_backend() {
        let evaluator = create_evaluator(CreateEvaluatorOptions::default());
        assert_eq!(
            evaluator.evaluate("1 + 1", None, None).expect("eval"),
            SbValue::Int(2)
        );
        let handle = evaluator.provider().get_engine().expect("engine");
        assert_eq!(handle.name(), PREFERRED_BACKEND);
        assert_eq!(evaluator.host(), DEFAULT_HOST_NAME);
    }

    #[test]
    fn create_evaluator_falls_back_to_raw_engine() {
        let evaluator = create_evaluator(CreateEvaluatorOptions {
            preferred_backend: "graal".to_string(),
            ..CreateEvaluatorOptions::default()
        });
        assert_eq!(
            evaluator.evaluate("6 * 7", None, None).expect("eval"),
            SbValue::Int(42)
        );
        let handle = evaluator.provider().get_engine().expect("engine");
        assert_eq!(handle.name(), FALLBACK_BACKEND);
    }

    #[test]
    fn create_evaluator_reports_unavailable_backends() {
        let evaluator = create_evaluator(CreateEvaluatorOptions {
            preferred_backend: "graal".to_string(),
            fallback_backend: "js".to_string(),
            reporter: Some(Arc::new(NoopReporter)),
            ..CreateEvaluatorOptions::default()
        });
        let error = evaluator.evaluate("1", None, None).expect_err("no engine");
        assert_eq!(
            error,
            EvalError::EngineUnavailable {
                preferred: "graal".to_string(),
                fallback: "js".to_string(),
            }
        );
    }

    #[test]
    fn create_evaluator_wires_host_functions_and_limits() {
        let evaluator = create_evaluator(CreateEvaluatorOptions {
            host_name: "editor".to_string(),
            time_limit_ms: 2_000,
            host_functions: Some(Arc::new(Guards {
                names: vec!["selection".to_string()],
            })),
            reporter: Some(Arc::new(NoopReporter)),
            ..CreateEvaluatorOptions::default()
        });
        assert_eq!(evaluator.time_limit(), 2_000);
        assert_eq!(evaluator.host(), "editor");

        let bindings = BTreeMap::from([("size".to_string(), SbValue::Int(3))]);
        let error = evaluator
            .evaluate("selection(size)", Some("select.rhai"), Some(&bindings))
            .expect_err("domain error");
        assert_eq!(
            error,
            EvalError::Domain(DomainError::new("SELECTION_EMPTY", "1 argument(s) given"))
        );
    }

    #[test]
    fn custom_registry_is_resolved_by_identifier() {
        struct Fixed;
        impl ScriptBackend for Fixed {
            fn eval(
                &self,
                _: &str,
                _: &str,
                _: &sb_core::Bindings,
            ) -> Result<SbValue, BackendFailure> {
                Ok(SbValue::String("fixed".to_string()))
            }
        }

        let mut registry = BackendRegistry::new();
        registry.register("fixed", || Ok(Arc::new(Fixed) as Arc<dyn ScriptBackend>));
        let evaluator = create_evaluator_with_registry(
            registry,
            CreateEvaluatorOptions {
                preferred_backend: "fixed".to_string(),
                ..CreateEvaluatorOptions::default()
            },
        );
        assert_eq!(
            evaluator.evaluate("anything", None, None).expect("eval"),
            SbValue::String("fixed".to_string())
        );
    }

    #[test]
    fn operation_budget_applies_to_default_backends() {
        let evaluator = create_evaluator(CreateEvaluatorOptions {
            max_operations: Some(500),
            reporter: Some(Arc::new(NoopReporter)),
            ..CreateEvaluatorOptions::default()
        });
        let error = evaluator
            .evaluate("let n = 0; loop { n += 1; }", None, None)
            .expect_err("budget exceeded");
        assert!(matches!(error, EvalError::ScriptFailure { .. }));
    }
}
