//! Progress reporting for a pipeline run.

use crate::output::OutputFormatter;
use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use std::path::Path;
use std::time::Duration;
use upack_core::PipelineObserver;
use upack_core::Stage;
use upack_core::VerificationReport;

/// Forwards pipeline events to the output formatter and shows a spinner
/// while the archive tool runs.
///
/// The spinner is drawn on stderr and only when stderr is a terminal.
pub struct CliObserver<'a> {
    formatter: &'a dyn OutputFormatter,
    show_spinner: bool,
    spinner: Option<ProgressBar>,
}

impl<'a> CliObserver<'a> {
    #[must_use]
    pub fn new(formatter: &'a dyn OutputFormatter) -> Self {
        Self {
            formatter,
            show_spinner: formatter.shows_progress() && Self::should_show(),
            spinner: None,
        }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stderr().is_term()
    }

    fn start_spinner(&mut self) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Decrypting archive");
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Drop for CliObserver<'_> {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

impl PipelineObserver for CliObserver<'_> {
    fn on_stage_start(&mut self, stage: Stage) {
        // A failed extraction never completes; the next stage clears it.
        self.stop_spinner();
        self.formatter.format_stage(stage);
        if stage == Stage::Extracting && self.show_spinner {
            self.start_spinner();
        }
    }

    fn on_stage_complete(&mut self, stage: Stage) {
        if stage == Stage::Extracting {
            self.stop_spinner();
        }
    }

    fn on_verification(&mut self, report: &VerificationReport) {
        self.formatter.format_verification(report);
    }

    fn on_file_moved(&mut self, src: &Path, dst: &Path) {
        self.formatter.format_file_moved(src, dst);
    }

    fn on_file_removed(&mut self, path: &Path) {
        self.formatter.format_file_removed(path);
    }
}
