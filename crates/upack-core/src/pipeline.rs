//! Stage sequencing for a single unpack run.
//!
//! ```text
//! ValidatingInput -> Extracting -> Verifying -> Moving -> CleaningUp -> Done
//! ```
//!
//! The first failing stage ends the chain. `CleaningUp` runs regardless,
//! through a [`StagingGuard`] armed before the first stage.

use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::Config;
use crate::Outcome;
use crate::PipelineObserver;
use crate::PipelineReport;
use crate::UnpackError;
use crate::cleanup::StagingGuard;
use crate::extraction::ArchiveTool;
use crate::extraction::SevenZip;
use crate::extraction::extract;
use crate::formats::check_signature;
use crate::inspection::verify_staging;
use crate::transfer::move_all_with_progress;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Input file exists and carries the 7z signature.
    ValidatingInput,
    /// Archive tested and extracted into staging.
    Extracting,
    /// Key and log-result checks.
    Verifying,
    /// Staged files moved into the repository.
    Moving,
    /// Staging area removed.
    CleaningUp,
}

impl Stage {
    /// Progress line shown when the stage starts.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ValidatingInput => "Checking the archive file ...",
            Self::Extracting => "Preparing the archive for verification ...",
            Self::Verifying => "Verifying the integrity of the archive ...",
            Self::Moving => "Moving files to the repository ...",
            Self::CleaningUp => "Removing the staging area ...",
        }
    }

    /// Stable snake_case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidatingInput => "validating_input",
            Self::Extracting => "extracting",
            Self::Verifying => "verifying",
            Self::Moving => "moving",
            Self::CleaningUp => "cleaning_up",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type StageResult<T> = std::result::Result<T, (Stage, UnpackError)>;

/// Verification and transfer pipeline bound to one configuration.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use upack_core::Config;
/// use upack_core::NoopObserver;
/// use upack_core::Pipeline;
///
/// let config = Config::load(Path::new("/etc/upack/config.toml"))?;
/// let report = Pipeline::new(&config).run(Path::new("lib-0.0.7.7z"), &mut NoopObserver);
/// std::process::exit(i32::from(report.exit_code()));
/// # Ok::<(), upack_core::UnpackError>(())
/// ```
pub struct Pipeline<'a> {
    config: &'a Config,
    tool: Box<dyn ArchiveTool + 'a>,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline that extracts with the configured 7-Zip program.
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self::with_tool(config, SevenZip::new(&config.tools.sevenzip))
    }

    /// Creates a pipeline with a specific extraction tool.
    pub fn with_tool(config: &'a Config, tool: impl ArchiveTool + 'a) -> Self {
        Self {
            config,
            tool: Box::new(tool),
        }
    }

    /// Runs every stage against `archive`.
    ///
    /// Never returns early: the outcome, including any failure, is carried
    /// in the report, and the staging area is gone by the time it returns.
    pub fn run(&self, archive: &Path, observer: &mut dyn PipelineObserver) -> PipelineReport {
        let started = Instant::now();
        let guard = StagingGuard::new(self.config.staging_dir());

        let mut report = PipelineReport {
            archive: archive.to_path_buf(),
            extraction: None,
            verification: None,
            transfer: None,
            files_removed: None,
            outcome: Outcome::Success,
            duration: started.elapsed(),
        };

        let result = self.run_stages(archive, &mut report, observer);

        observer.on_stage_start(Stage::CleaningUp);
        report.files_removed = guard.cleanup(observer);
        observer.on_stage_complete(Stage::CleaningUp);

        if let Err((stage, error)) = result {
            tracing::warn!(%stage, %error, "pipeline failed");
            report.outcome = Outcome::Failure { stage, error };
        }
        report.duration = started.elapsed();
        report
    }

    fn run_stages(
        &self,
        archive: &Path,
        report: &mut PipelineReport,
        observer: &mut dyn PipelineObserver,
    ) -> StageResult<()> {
        let staging = self.config.staging_dir();

        observer.on_stage_start(Stage::ValidatingInput);
        validate_archive(archive).map_err(|e| (Stage::ValidatingInput, e))?;
        observer.on_stage_complete(Stage::ValidatingInput);

        observer.on_stage_start(Stage::Extracting);
        let extraction =
            extract(archive, staging, self.tool.as_ref()).map_err(|e| (Stage::Extracting, e))?;
        report.extraction = Some(extraction);
        observer.on_stage_complete(Stage::Extracting);

        observer.on_stage_start(Stage::Verifying);
        let verification = verify_staging(staging);
        observer.on_verification(&verification);
        let failed = verification.failed_checks();
        report.verification = Some(verification);
        if failed > 0 {
            return Err((Stage::Verifying, UnpackError::Verification { failed }));
        }
        observer.on_stage_complete(Stage::Verifying);

        observer.on_stage_start(Stage::Moving);
        match move_all_with_progress(staging, self.config.repository_dir(), observer) {
            Ok(transfer) => report.transfer = Some(transfer),
            Err(err) => {
                if let UnpackError::MoveCountMismatch { report: partial, .. } = &err {
                    report.transfer = Some(partial.as_ref().clone());
                }
                return Err((Stage::Moving, err));
            }
        }
        observer.on_stage_complete(Stage::Moving);

        Ok(())
    }
}

/// Checks that `archive` is an existing regular file with a 7z signature.
///
/// # Errors
///
/// `Argument` if the file does not exist or is not a regular file,
/// `ArchiveFormat` if the signature does not match.
pub fn validate_archive(archive: &Path) -> crate::Result<()> {
    let metadata = fs::metadata(archive).map_err(|e| UnpackError::Argument {
        reason: format!("{e}: {}", archive.display()),
    })?;
    if !metadata.is_file() {
        return Err(UnpackError::Argument {
            reason: format!("not a regular file: {}", archive.display()),
        });
    }
    check_signature(archive)
}
