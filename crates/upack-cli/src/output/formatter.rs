//! Output formatter trait for CLI results.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use upack_core::PipelineReport;
use upack_core::Stage;
use upack_core::VerificationReport;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Whether live progress (spinners) may be drawn alongside this output.
    fn shows_progress(&self) -> bool;

    /// Announce a pipeline stage
    fn format_stage(&self, stage: Stage);

    /// Report the outcome of the attestation checks
    fn format_verification(&self, report: &VerificationReport);

    /// Report one file moved into the repository
    fn format_file_moved(&self, src: &Path, dst: &Path);

    /// Report one file removed from staging
    fn format_file_removed(&self, path: &Path);

    /// Format the final report of a run
    fn format_report(&self, report: &PipelineReport) -> Result<()>;

    /// Format error message
    fn format_error(&self, error: &anyhow::Error);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }

    /// An error result that still carries whatever the run produced.
    pub fn failure(operation: impl Into<String>, data: T, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: Some(data),
            error: Some(error.into()),
        }
    }

    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> JsonOutput<()> {
        JsonOutput {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}
