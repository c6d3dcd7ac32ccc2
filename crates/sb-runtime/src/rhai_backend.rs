use std::sync::Arc;

use rhai::{Dynamic, Engine, EvalAltResult, ParseError, Position, Scope};
use sb_core::{BackendFailure, Bindings, DomainError, SbValue, StackFrame};

use crate::backend::ScriptBackend;
use crate::context::interrupt_requested;
use crate::helpers::rhai_bridge::{
    dynamic_message, dynamic_to_value, position_frame, value_to_dynamic,
};
use crate::host::{
    EmptyHostFunctionRegistry, HostFunctionRegistry, RESERVED_HOST_FUNCTION_NAMES,
};

#[derive(Clone)]
pub struct RhaiBackendOptions {
    /// Start from `Engine::new_raw`, without the standard packages.
    pub raw: bool,
    pub strict_variables: bool,
    pub max_call_levels: Option<usize>,
    pub max_operations: Option<u64>,
    pub host_functions: Option<Arc<dyn HostFunctionRegistry>>,
}

impl Default for RhaiBackendOptions {
    fn default() -> Self {
        Self {
            raw: false,
            strict_variables: true,
            max_call_levels: None,
            max_operations: None,
            host_functions: None,
        }
    }
}

pub struct RhaiBackend {
    engine: Engine,
}

impl RhaiBackend {
    pub fn new(options: RhaiBackendOptions) -> Result<Self, BackendFailure> {
        let mut engine = if options.raw {
            Engine::new_raw()
        } else {
            Engine::new()
        };
        engine.set_strict_variables(options.strict_variables);
        if let Some(levels) = options.max_call_levels {
            engine.set_max_call_levels(levels);
        }
        if let Some(operations) = options.max_operations {
            engine.set_max_operations(operations);
        }
        engine.on_progress(|_operations| {
            if interrupt_requested() {
                Some(Dynamic::from("interrupted"))
            } else {
                None
            }
        });

        let host_functions: Arc<dyn HostFunctionRegistry> = options
            .host_functions
            .unwrap_or_else(|| Arc::new(EmptyHostFunctionRegistry::default()));
        register_host_functions(&mut engine, host_functions)?;

        Ok(Self { engine })
    }
}

impl ScriptBackend for RhaiBackend {
    fn eval(
        &self,
        code: &str,
        label: &str,
        bindings: &Bindings,
    ) -> Result<SbValue, BackendFailure> {
        let mut scope = Scope::new();
        for (name, value) in bindings {
            scope.push_dynamic(name.as_str(), value_to_dynamic(value));
        }

        let mut ast = self
            .engine
            .compile_with_scope(&scope, code)
            .map_err(|error| failure_from_parse(label, &error))?;
        ast.set_source(label);

        let value = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(|error| failure_from_rhai(label, *error))?;
        dynamic_to_value(value)
    }
}

fn register_host_functions(
    engine: &mut Engine,
    host: Arc<dyn HostFunctionRegistry>,
) -> Result<(), BackendFailure> {
    for name in host.names() {
        if RESERVED_HOST_FUNCTION_NAMES.contains(&name.as_str()) {
            return Err(BackendFailure::raised(format!(
                "Host function \"{}\" conflicts with a reserved script function.",
                name
            )));
        }

        let (registry, function) = (Arc::clone(&host), name.clone());
        engine.register_fn(name.as_str(), move || {
            call_host(registry.as_ref(), &function, Vec::new())
        });
        let (registry, function) = (Arc::clone(&host), name.clone());
        engine.register_fn(name.as_str(), move |a: Dynamic| {
            call_host(registry.as_ref(), &function, vec![a])
        });
        let (registry, function) = (Arc::clone(&host), name.clone());
        engine.register_fn(name.as_str(), move |a: Dynamic, b: Dynamic| {
            call_host(registry.as_ref(), &function, vec![a, b])
        });
        let (registry, function) = (Arc::clone(&host), name.clone());
        engine.register_fn(name.as_str(), move |a: Dynamic, b: Dynamic, c: Dynamic| {
            call_host(registry.as_ref(), &function, vec![a, b, c])
        });
    }
    Ok(())
}

fn call_host(
    host: &dyn HostFunctionRegistry,
    name: &str,
    args: Vec<Dynamic>,
) -> Result<Dynamic, Box<EvalAltResult>> {
    let values = args
        .into_iter()
        .map(dynamic_to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|failure| runtime_error(Dynamic::from(failure.message())))?;

    match host.call(name, &values) {
        Ok(value) => Ok(value_to_dynamic(&value)),
        Err(error) => Err(runtime_error(Dynamic::from(error))),
    }
}

fn runtime_error(value: Dynamic) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(value, Position::NONE))
}

fn failure_from_parse(label: &str, error: &ParseError) -> BackendFailure {
    BackendFailure::Raised {
        message: error.err_type().to_string(),
        frame: Some(position_frame(label, error.position())),
    }
}

/// Turns rhai's nested error into a cause chain, outermost call first.
pub(crate) fn failure_from_rhai(label: &str, error: EvalAltResult) -> BackendFailure {
    match error {
        EvalAltResult::ErrorInFunctionCall(function, source, inner, position) => {
            let frame = call_frame(label, &function, &source, position);
            failure_from_rhai(label, *inner)
                .wrap(format!("in call to function '{}'", function), frame)
        }
        EvalAltResult::ErrorInModule(path, inner, position) => {
            let frame = position_frame(label, position);
            failure_from_rhai(label, *inner).wrap(format!("in module '{}'", path), frame)
        }
        EvalAltResult::ErrorTerminated(..) => BackendFailure::Interrupted,
        root => {
            let frame = root_frame(label, &root);
            match root {
                EvalAltResult::ErrorRuntime(value, _) => {
                    match value.clone().try_cast::<DomainError>() {
                        Some(domain) => BackendFailure::Domain(domain),
                        None => BackendFailure::Raised {
                            message: dynamic_message(&value),
                            frame,
                        },
                    }
                }
                mut other => {
                    other.clear_position();
                    BackendFailure::Raised {
                        message: other.to_string(),
                        frame,
                    }
                }
            }
        }
    }
}

pub(crate) fn call_frame(
    label: &str,
    function: &str,
    source: &str,
    position: Position,
) -> StackFrame {
    let source = if source.is_empty() { label } else { source };
    position_frame(source, position).in_function(function)
}

/// Frame of the error that started the chain, if it carries one.
pub(crate) fn root_frame(label: &str, error: &EvalAltResult) -> Option<StackFrame> {
    match error {
        EvalAltResult::ErrorTerminated(..) => None,
        EvalAltResult::ErrorRuntime(value, _) if value.is::<DomainError>() => None,
        other if other.position().is_none() => None,
        other => Some(position_frame(label, other.position())),
    }
}
