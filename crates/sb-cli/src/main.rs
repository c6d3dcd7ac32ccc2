use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_env("SB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(sb_cli::run_cli_from_args(std::env::args_os()));
}
