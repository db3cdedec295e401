//! The unpack command: verify an archive and move its contents into the
//! repository.

use crate::cli::Cli;
use crate::config;
use crate::output::OutputFormatter;
use crate::progress::CliObserver;
use anyhow::Result;
use upack_core::Pipeline;

/// Runs the pipeline for `cli.archive` and returns the process exit status.
///
/// Configuration failures are returned as errors before any stage runs;
/// pipeline failures are reported through `formatter` and yield status 1.
pub fn execute(cli: &Cli, formatter: &dyn OutputFormatter) -> Result<u8> {
    let config = config::load(cli.config.as_deref())?;

    let report = {
        let mut observer = CliObserver::new(formatter);
        Pipeline::new(&config).run(&cli.archive, &mut observer)
    };

    tracing::debug!(
        archive = %report.archive.display(),
        success = report.is_success(),
        duration_ms = report.duration.as_millis(),
        "unpack finished"
    );

    formatter.format_report(&report)?;
    Ok(report.exit_code())
}
