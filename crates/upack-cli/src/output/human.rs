//! Human-readable output formatter with colors and styling.
//!
//! Progress goes to stdout; warnings and errors go to stderr.

use super::formatter::OutputFormatter;
use crate::error::convert_unpack_error;
use anyhow::Result;
use console::Term;
use console::style;
use std::path::Path;
use upack_core::PipelineReport;
use upack_core::Stage;
use upack_core::UnpackError;
use upack_core::VerificationReport;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    use_colors_stderr: bool,
    out: Term,
    err: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            use_colors_stderr: console::colors_enabled_stderr(),
            out: Term::stdout(),
            err: Term::stderr(),
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors_stderr {
            let _ = self
                .err
                .write_line(&format!("{}", style(message).yellow().bold()));
        } else {
            let _ = self.err.write_line(message);
        }
    }

    fn format_alert(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors_stderr {
            let _ = self
                .err
                .write_line(&format!("{}", style(message).red().bold()));
        } else {
            let _ = self.err.write_line(message);
        }
    }

    fn key_failure_line(err: &UnpackError) -> String {
        if err.is_tamper_signal() {
            "-- [TEST FAILURE]: The log file has been altered and is no longer reliable.".into()
        } else {
            format!("-- [TEST FAILURE]: {err}")
        }
    }

    fn log_failure_line(err: &UnpackError) -> String {
        if err.is_tamper_signal() {
            "-- [TEST FAILURE]: Vulnerability checks failed.".into()
        } else {
            format!("-- [TEST FAILURE]: {err}")
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn shows_progress(&self) -> bool {
        !self.quiet
    }

    fn format_stage(&self, stage: Stage) {
        if self.quiet {
            return;
        }
        if !self.verbose && matches!(stage, Stage::ValidatingInput | Stage::CleaningUp) {
            return;
        }

        if self.use_colors {
            let _ = self
                .out
                .write_line(&format!("{}", style(stage.description()).cyan().bold()));
        } else {
            let _ = self.out.write_line(stage.description());
        }
    }

    fn format_verification(&self, report: &VerificationReport) {
        if let Err(err) = &report.key_check {
            self.format_warning(&Self::key_failure_line(err));
        } else if self.verbose && !self.quiet {
            let _ = self.out.write_line("-- [TEST PASSED]: Key matches the log digest.");
        }

        if let Err(err) = &report.log_check {
            self.format_warning(&Self::log_failure_line(err));
        } else if self.verbose && !self.quiet {
            let _ = self.out.write_line("-- [TEST PASSED]: Validation log reports PASS.");
        }

        if !report.passed() {
            self.format_alert("Verification failures found. Libraries will *not* be transferred.");
        }
    }

    fn format_file_moved(&self, src: &Path, dst: &Path) {
        if self.verbose {
            let _ = self
                .out
                .write_line(&format!("Moving: {} -> {}", src.display(), dst.display()));
        }
    }

    fn format_file_removed(&self, path: &Path) {
        if self.verbose {
            let name = path.file_name().unwrap_or(path.as_os_str());
            let _ = self
                .out
                .write_line(&format!("  - Deleting: {}", name.to_string_lossy()));
        }
    }

    fn format_report(&self, report: &PipelineReport) -> Result<()> {
        if let Some(err) = report.error() {
            self.format_error(&convert_unpack_error(err, &report.archive));
            self.format_warning("Done. Ended in error.");
            return Ok(());
        }

        if self.quiet {
            return Ok(());
        }

        if self.use_colors {
            let _ = self
                .out
                .write_line(&format!("{}", style("Done.").green().bold()));
        } else {
            let _ = self.out.write_line("Done.");
        }

        if self.verbose {
            if let Some(transfer) = &report.transfer {
                let _ = self
                    .out
                    .write_line(&format!("  Files moved: {}", transfer.moved));
                if transfer.copied_across_devices > 0 {
                    let _ = self.out.write_line(&format!(
                        "  Copied across devices: {}",
                        transfer.copied_across_devices
                    ));
                }
            }
            let _ = self
                .out
                .write_line(&format!("  Duration: {:?}", report.duration));
        }

        Ok(())
    }

    fn format_error(&self, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        if self.use_colors_stderr {
            let _ = self
                .err
                .write_line(&format!("{} {error:?}", style("[ERROR]:").red().bold()));
        } else {
            let _ = self.err.write_line(&format!("[ERROR]: {error:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_lines() {
        let altered = UnpackError::HashMismatch {
            expected: "a".into(),
            actual: "b".into(),
        };
        assert!(HumanFormatter::key_failure_line(&altered).contains("altered"));

        let failed = UnpackError::LogResult {
            found: "FAIL".into(),
        };
        assert!(HumanFormatter::log_failure_line(&failed).contains("Vulnerability checks failed"));

        let short = UnpackError::ShortRead {
            path: "p.key".into(),
            read: 10,
            expected: 64,
        };
        assert!(HumanFormatter::key_failure_line(&short).contains("10 bytes read"));
    }

    #[test]
    fn test_quiet_hides_progress() {
        assert!(!HumanFormatter::new(false, true).shows_progress());
        assert!(HumanFormatter::new(true, false).shows_progress());
    }
}
