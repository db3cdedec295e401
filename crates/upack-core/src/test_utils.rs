//! Test fixtures for staging areas and archive tools.
//!
//! # Panics
//!
//! Functions in this module panic on I/O errors; they are meant for tests
//! only.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use crate::digest::derive_passphrase;
use crate::digest::digest_bytes;
use crate::extraction::ArchiveTool;
use crate::extraction::ToolStatus;
use crate::formats::SEVENZ_MAGIC;

/// Builds a validation log whose tail tag is `result`.
#[must_use]
pub fn validation_log(result: &str) -> Vec<u8> {
    format!(
        "Package validation log\n\
         ----------------------\n\
         requests-2.31.0-py3-none-any.whl: no known vulnerabilities\n\
         urllib3-2.0.7-py3-none-any.whl: no known vulnerabilities\n\
         \n\
         Results: {result}\n"
    )
    .into_bytes()
}

/// The decrypted content of an attested archive: a key, a log, and payload
/// files.
#[derive(Debug, Clone)]
pub struct AttestedPayload {
    stem: String,
    key: String,
    log: Vec<u8>,
    files: Vec<(String, Vec<u8>)>,
}

impl AttestedPayload {
    /// A payload whose log reports `PASS` and whose key matches the log.
    #[must_use]
    pub fn passing(stem: &str) -> Self {
        Self::with_result(stem, "PASS")
    }

    /// A payload whose log reports `FAIL`; the key still matches.
    #[must_use]
    pub fn failing(stem: &str) -> Self {
        Self::with_result(stem, "FAIL")
    }

    fn with_result(stem: &str, result: &str) -> Self {
        let log = validation_log(result);
        Self {
            stem: stem.to_string(),
            key: digest_bytes(&log),
            log,
            files: Vec::new(),
        }
    }

    /// Adds a payload file.
    #[must_use]
    pub fn with_file(mut self, name: &str, data: &[u8]) -> Self {
        self.files.push((name.to_string(), data.to_vec()));
        self
    }

    /// Alters the log after the key was computed, keeping the `PASS` tail.
    #[must_use]
    pub fn tampered(mut self) -> Self {
        let mut log = b"urllib3 vulnerability waived\n".to_vec();
        log.extend_from_slice(&self.log);
        self.log = log;
        self
    }

    /// Replaces the key file contents.
    #[must_use]
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    /// Names of every file this payload writes.
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        let mut names = vec![format!("{}.key", self.stem), format!("{}.log", self.stem)];
        names.extend(self.files.iter().map(|(name, _)| name.clone()));
        names
    }

    /// Writes the key, log and payload files into `dir`, which must exist.
    pub fn write_to(&self, dir: &Path) {
        fs::write(dir.join(format!("{}.key", self.stem)), &self.key).unwrap();
        fs::write(dir.join(format!("{}.log", self.stem)), &self.log).unwrap();
        for (name, data) in &self.files {
            fs::write(dir.join(name), data).unwrap();
        }
    }
}

/// Writes a file that passes the 7z signature check and returns its path.
pub fn write_archive_stub(dir: &Path, file_name: &str) -> PathBuf {
    let path = dir.join(file_name);
    let mut data = SEVENZ_MAGIC.to_vec();
    data.extend_from_slice(&[0x00, 0x04, 0xde, 0xad, 0xbe, 0xef]);
    fs::write(&path, data).unwrap();
    path
}

/// An [`ArchiveTool`] that "extracts" by copying the files of a directory.
///
/// The test step fails unless it is given the passphrase derived from the
/// archive name, like a real encrypted archive would.
#[derive(Debug, Clone)]
pub struct DirectoryTool {
    source: PathBuf,
    extract_status: ToolStatus,
}

impl DirectoryTool {
    /// Creates a tool serving the files in `source`.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            extract_status: ToolStatus::Success,
        }
    }

    /// Copies files but then reports `status` from the extract step.
    #[must_use]
    pub fn with_extract_status(mut self, status: ToolStatus) -> Self {
        self.extract_status = status;
        self
    }
}

impl ArchiveTool for DirectoryTool {
    fn name(&self) -> String {
        "directory-tool".to_string()
    }

    fn test(&self, archive: &Path, passphrase: &str) -> io::Result<ToolStatus> {
        if passphrase == derive_passphrase(archive) {
            Ok(ToolStatus::Success)
        } else {
            Ok(ToolStatus::Failed(Some(2)))
        }
    }

    fn extract(
        &self,
        _archive: &Path,
        _passphrase: &str,
        output_dir: &Path,
    ) -> io::Result<ToolStatus> {
        for entry in fs::read_dir(&self.source)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::copy(entry.path(), output_dir.join(entry.file_name()))?;
            }
        }
        Ok(self.extract_status)
    }
}
