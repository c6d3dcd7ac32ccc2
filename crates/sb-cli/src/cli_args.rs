use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sb-cli")]
#[command(about = "Evaluate scripts through the scriptbridge evaluator")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Eval(EvalArgs),
    Backends,
}

#[derive(Debug, Args)]
pub(crate) struct EvalArgs {
    #[arg(long = "file", required_unless_present = "code", conflicts_with = "code")]
    pub(crate) file: Option<String>,
    #[arg(long = "code")]
    pub(crate) code: Option<String>,
    /// Diagnostic label; defaults to the file path, or `<script>` for inline code.
    #[arg(long = "filename")]
    pub(crate) filename: Option<String>,
    #[arg(long = "bind", value_name = "KEY=JSON")]
    pub(crate) bind: Vec<String>,
    #[arg(long = "bindings-file")]
    pub(crate) bindings_file: Option<String>,
    #[arg(long = "time-limit-ms", default_value_t = 0)]
    pub(crate) time_limit_ms: u64,
    #[arg(long = "backend")]
    pub(crate) backend: Option<String>,
    #[arg(long = "max-operations")]
    pub(crate) max_operations: Option<u64>,
}
