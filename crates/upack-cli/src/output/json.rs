//! JSON output formatter for machine-readable results.
//!
//! Only the final report is written, as a single document on stdout.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use crate::error::convert_unpack_error;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;
use upack_core::Outcome;
use upack_core::PipelineReport;
use upack_core::Stage;
use upack_core::VerificationReport;

const OPERATION: &str = "unpack";

pub struct JsonFormatter;

#[derive(Debug, Serialize)]
struct CheckOutput {
    file: Option<String>,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct UnmovedOutput {
    file: String,
    reason: String,
}

#[derive(Debug, Serialize)]
struct UnpackOutput {
    archive: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_stage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files_staged: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_check: Option<CheckOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_check: Option<CheckOutput>,
    files_moved: usize,
    moved_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unmoved_files: Vec<UnmovedOutput>,
    copied_across_devices: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    files_removed: Option<usize>,
    duration_ms: u128,
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }

    fn check(file: Option<&Path>, result: &upack_core::Result<()>) -> CheckOutput {
        CheckOutput {
            file: file.map(|p| p.display().to_string()),
            passed: result.is_ok(),
            reason: result.as_ref().err().map(ToString::to_string),
        }
    }

    fn unpack_output(report: &PipelineReport) -> UnpackOutput {
        let verification = report.verification.as_ref();
        let transfer = report.transfer.as_ref();
        UnpackOutput {
            archive: report.archive.display().to_string(),
            failed_stage: match &report.outcome {
                Outcome::Success => None,
                Outcome::Failure { stage, .. } => Some(stage.as_str()),
            },
            files_staged: report.extraction.as_ref().map(|e| e.files_staged),
            key_check: verification.map(|v| Self::check(v.key_file.as_deref(), &v.key_check)),
            log_check: verification.map(|v| Self::check(v.log_file.as_deref(), &v.log_check)),
            files_moved: transfer.map_or(0, |t| t.moved),
            moved_files: transfer.map_or_else(Vec::new, |t| {
                t.moved_files
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect()
            }),
            unmoved_files: transfer.map_or_else(Vec::new, |t| {
                t.failures
                    .iter()
                    .map(|(file, reason)| UnmovedOutput {
                        file: file.display().to_string(),
                        reason: reason.clone(),
                    })
                    .collect()
            }),
            copied_across_devices: transfer.map_or(0, |t| t.copied_across_devices),
            files_removed: report.files_removed,
            duration_ms: report.duration.as_millis(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn shows_progress(&self) -> bool {
        false
    }

    fn format_stage(&self, _stage: Stage) {}

    fn format_verification(&self, _report: &VerificationReport) {}

    fn format_file_moved(&self, _src: &Path, _dst: &Path) {}

    fn format_file_removed(&self, _path: &Path) {}

    fn format_report(&self, report: &PipelineReport) -> Result<()> {
        let data = Self::unpack_output(report);
        match report.error() {
            None => Self::output(&JsonOutput::success(OPERATION, data)),
            Some(err) => {
                let message = convert_unpack_error(err, &report.archive);
                Self::output(&JsonOutput::failure(OPERATION, data, format!("{message:#}")))
            }
        }
    }

    fn format_error(&self, error: &anyhow::Error) {
        let output = JsonOutput::<()>::error(OPERATION, format!("{error:#}"));
        let _ = Self::output(&output);
    }
}
