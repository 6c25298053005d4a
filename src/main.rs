//! boringcache-action - CI cache step backed by the boringcache CLI
//!
//! boringcache-action provides:
//! - Validation of workspace/entries and path/key inputs
//! - Entry parsing with Windows drive letter handling and restore=>save redirects
//! - Path resolution and platform-suffixed cache keys
//! - Installation and invocation of the boringcache CLI

use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod backends;
mod cli;
mod core;

/// `BORINGCACHE_LOG` wins over `--verbose`. Logs go to stderr.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_env("BORINGCACHE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose);

    let env = match cli::capture_environment() {
        Ok(env) => env,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            return ExitCode::FAILURE;
        }
    };
    let mut reporter = core::report::Reporter::new(&env);
    if cli.command.prints_to_stdout() {
        reporter = reporter.annotations_on_stderr();
    }

    let label = cli.command.label();
    match cli::run(cli, &env, &reporter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            reporter.failure(&format!("Cache {} failed: {:#}", label, err));
            ExitCode::FAILURE
        }
    }
}
