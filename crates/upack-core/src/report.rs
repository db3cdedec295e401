//! Per-stage reports and progress callbacks.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::UnpackError;
use crate::pipeline::Stage;

/// Result of the extraction stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    /// Staging directory the archive was extracted into.
    pub staging_dir: PathBuf,

    /// Regular files present directly in staging after extraction.
    pub files_staged: usize,
}

/// Result of both attestation checks.
///
/// Both checks are always run; each carries its own outcome.
#[derive(Debug)]
pub struct VerificationReport {
    /// The `.key` file that was used, if one was found.
    pub key_file: Option<PathBuf>,

    /// The `.log` file that was used, if one was found.
    pub log_file: Option<PathBuf>,

    /// Outcome of comparing the log digest with the key.
    pub key_check: Result<(), UnpackError>,

    /// Outcome of the `PASS` result tag check.
    pub log_check: Result<(), UnpackError>,
}

impl VerificationReport {
    /// Returns `true` only if both checks passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.key_check.is_ok() && self.log_check.is_ok()
    }

    /// Number of checks that failed (0, 1 or 2).
    #[must_use]
    pub fn failed_checks(&self) -> usize {
        usize::from(self.key_check.is_err()) + usize::from(self.log_check.is_err())
    }

    /// Returns `true` if the key check failed because the log digest did
    /// not match, meaning the log was altered after the key was generated.
    #[must_use]
    pub fn log_altered(&self) -> bool {
        matches!(self.key_check, Err(UnpackError::HashMismatch { .. }))
    }

    /// Returns `true` if the log was read and its result tag was not `PASS`.
    #[must_use]
    pub fn validation_failed(&self) -> bool {
        matches!(self.log_check, Err(UnpackError::LogResult { .. }))
    }
}

/// Result of moving staged files into the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveReport {
    /// Regular files discovered in the source directory.
    pub discovered: usize,

    /// Files confirmed moved.
    pub moved: usize,

    /// Of `moved`, files that needed a copy and unlink across devices.
    pub copied_across_devices: usize,

    /// Destination paths of moved files.
    pub moved_files: Vec<PathBuf>,

    /// Source files that could not be moved, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl MoveReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if every discovered file was moved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.discovered == self.moved
    }
}

/// Final outcome of a pipeline run.
#[derive(Debug)]
pub enum Outcome {
    /// Every stage succeeded and the payload is in the repository.
    Success,
    /// A stage failed; later stages were skipped.
    Failure {
        /// Stage that failed.
        stage: Stage,
        /// Why it failed.
        error: UnpackError,
    },
}

/// Report of a full pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    /// Archive that was processed.
    pub archive: PathBuf,

    /// Extraction result, if that stage succeeded.
    pub extraction: Option<ExtractionOutcome>,

    /// Verification result, if that stage ran.
    pub verification: Option<VerificationReport>,

    /// Transfer result, if that stage ran.
    pub transfer: Option<MoveReport>,

    /// Files removed from staging during cleanup; `None` if staging did not
    /// exist or could not be opened.
    pub files_removed: Option<usize>,

    /// Success, or the failing stage and its error.
    pub outcome: Outcome,

    /// Wall time of the run.
    pub duration: Duration,
}

impl PipelineReport {
    /// Returns `true` if the run succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }

    /// Process exit status: 0 on success, 1 on any failure.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    /// The error that ended the run, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&UnpackError> {
        match &self.outcome {
            Outcome::Success => None,
            Outcome::Failure { error, .. } => Some(error),
        }
    }
}

/// Callback trait for progress reporting while the pipeline runs.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use upack_core::PipelineObserver;
/// use upack_core::Stage;
/// use upack_core::VerificationReport;
///
/// struct Printer;
///
/// impl PipelineObserver for Printer {
///     fn on_stage_start(&mut self, stage: Stage) {
///         println!("{}", stage.description());
///     }
///
///     fn on_stage_complete(&mut self, _stage: Stage) {}
///
///     fn on_verification(&mut self, report: &VerificationReport) {
///         println!("passed: {}", report.passed());
///     }
///
///     fn on_file_moved(&mut self, src: &Path, dst: &Path) {
///         println!("{} -> {}", src.display(), dst.display());
///     }
///
///     fn on_file_removed(&mut self, _path: &Path) {}
/// }
/// ```
pub trait PipelineObserver {
    /// Called when a stage begins.
    fn on_stage_start(&mut self, stage: Stage);

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&mut self, stage: Stage);

    /// Called once both attestation checks have run.
    fn on_verification(&mut self, report: &VerificationReport);

    /// Called after a file has been moved into the repository.
    fn on_file_moved(&mut self, src: &Path, dst: &Path);

    /// Called after a staged file has been deleted.
    fn on_file_removed(&mut self, path: &Path);
}

/// Observer that ignores every event.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_stage_start(&mut self, _stage: Stage) {}

    fn on_stage_complete(&mut self, _stage: Stage) {}

    fn on_verification(&mut self, _report: &VerificationReport) {}

    fn on_file_moved(&mut self, _src: &Path, _dst: &Path) {}

    fn on_file_removed(&mut self, _path: &Path) {}
}
