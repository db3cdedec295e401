//! Error conversion utilities for CLI.
//!
//! Converts upack-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use std::path::Path;
use upack_core::UnpackError;

/// Converts an `UnpackError` raised while processing `archive` into a
/// user-facing message.
pub fn convert_unpack_error(err: &UnpackError, archive: &Path) -> anyhow::Error {
    match err {
        UnpackError::ArchiveFormat { .. } => {
            anyhow!(
                "'{}' is not a 7z archive (bad file signature)\n\
                 HINT: A .7z file is required, please refer to the program usage.",
                archive.display()
            )
        }
        UnpackError::ArchiveIntegrity { .. } => {
            anyhow!(
                "Archive '{}' failed the integrity test\n\
                 HINT: The passphrase is derived from the file name. \
                 Do not rename archives after packing.",
                archive.display()
            )
        }
        UnpackError::StagingCreate { path, source } => {
            anyhow!(
                "Cannot create staging directory '{}': {}\n\
                 HINT: The parent of `dir_ppk_tmp` must exist and be writable.",
                path.display(),
                source
            )
        }
        UnpackError::ExtractionInvocation { program, reason } => {
            anyhow!(
                "Extraction with '{program}' failed: {reason}\n\
                 HINT: Check that 7-Zip is installed, or set `sevenzip` in the [tools] \
                 section of the configuration."
            )
        }
        UnpackError::Verification { failed } => {
            anyhow!(
                "Archive '{}' failed verification ({failed} of 2 checks)\n\
                 HINT: Libraries were not transferred. Re-pack the archive from a \
                 validated source.",
                archive.display()
            )
        }
        UnpackError::DirectoryOpen { path, source } => {
            anyhow!(
                "Cannot open directory '{}': {}\n\
                 HINT: The repository directory (`dir_pip_repo`) must already exist.",
                path.display(),
                source
            )
        }
        UnpackError::MoveCountMismatch {
            discovered,
            moved,
            report,
        } => {
            let unmoved: String = report
                .failures
                .iter()
                .map(|(file, reason)| format!("\n  - Not moved: {} ({reason})", file.display()))
                .collect();
            anyhow!(
                "Only {moved} of {discovered} files were moved into the repository{unmoved}\n\
                 HINT: Inspect the repository; the remaining files were discarded \
                 with the staging area."
            )
        }
        UnpackError::Config { .. } => convert_config_error(err),
        _ if err.is_input_error() => anyhow!(
            "Cannot use '{}': {}\n\
             HINT: Usage: upack [--help] [FILE]",
            archive.display(),
            err
        ),
        _ => anyhow!("Error processing archive '{}': {}", archive.display(), err),
    }
}

/// Converts a configuration load failure into a user-facing message.
pub fn convert_config_error(err: &UnpackError) -> anyhow::Error {
    match err {
        UnpackError::Config { path, reason } => {
            anyhow!(
                "Error reading the config file: {reason}\n\
                 -- Search path: {}\n\
                 HINT: Pass --config <FILE> or set UPACK_CONFIG. The file needs a [paths] \
                 table with `dir_ppk_tmp` and `dir_pip_repo`.",
                path.display()
            )
        }
        other => anyhow!("Error reading the config file: {other}"),
    }
}
