//! upack - verify an attested package archive and unpack it into a trusted
//! repository.

mod cli;
mod config;
mod error;
mod output;
mod progress;
mod unpack;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Help and version go to stdout and are not failures.
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    match unpack::execute(&cli, &*formatter) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            formatter.format_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr, filtered by `RUST_LOG`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,upack=debug,upack_core=debug"
    } else {
        "warn"
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .try_init();
}
