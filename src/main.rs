use auto_import::cli::{Args, Command};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    init_tracing(args.verbose);

    let command = Command::from_args(args);

    // Exit code reflects the worst severity the build reported
    process::exit(command.run());
}

/// Diagnostics go to stderr so reports on stdout stay machine-readable
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "auto_import=debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
