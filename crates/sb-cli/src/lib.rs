use std::ffi::OsString;

use clap::Parser;
use sb_api::{create_evaluator, default_backend_registry, CreateEvaluatorOptions};
use sb_core::SbValue;
use sb_runtime::{EvaluationRequest, RhaiBackendOptions, PREFERRED_BACKEND};

mod bindings_loader;
mod cli_args;
mod error_map;

pub(crate) use bindings_loader::{collect_bindings, load_script};
#[cfg(test)]
pub(crate) use bindings_loader::{parse_binding, parse_bindings_object};
pub(crate) use cli_args::{Cli, EvalArgs, Mode};
pub(crate) use error_map::{
    emit_error, map_cli_bindings_invalid, map_cli_bindings_read, map_cli_output_encode,
    map_cli_script_read, CliError,
};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, CliError> {
    match cli.command {
        Mode::Eval(args) => run_eval(args),
        Mode::Backends => run_backends(),
    }
}

fn run_eval(args: EvalArgs) -> Result<i32, CliError> {
    let script = load_script(
        args.file.as_deref(),
        args.code.as_deref(),
        args.filename.as_deref(),
    )?;
    let bindings = collect_bindings(args.bindings_file.as_deref(), &args.bind)?;
    tracing::debug!(
        label = script.label.as_deref().unwrap_or_default(),
        bindings = bindings.len(),
        "loaded script"
    );

    let evaluator = create_evaluator(CreateEvaluatorOptions {
        preferred_backend: args
            .backend
            .unwrap_or_else(|| PREFERRED_BACKEND.to_string()),
        max_operations: args.max_operations,
        ..CreateEvaluatorOptions::default()
    });

    let mut request = EvaluationRequest::new(script.code)
        .bindings(bindings)
        .time_limit_ms(args.time_limit_ms);
    if let Some(label) = script.label {
        request = request.filename(label);
    }

    let value = evaluator.evaluate_request(request)?;
    emit_value(&value)
}

fn emit_value(value: &SbValue) -> Result<i32, CliError> {
    let encoded = serde_json::to_string(value).map_err(map_cli_output_encode)?;
    println!("RESULT:OK");
    println!("VALUE_JSON:{}", encoded);
    Ok(0)
}

fn run_backends() -> Result<i32, CliError> {
    let registry = default_backend_registry(RhaiBackendOptions::default());
    println!("RESULT:OK");
    for name in registry.names() {
        println!("BACKEND:{}", name);
    }
    Ok(0)
}
