//! Error types for the verification and transfer pipeline.

use std::path::PathBuf;
use thiserror::Error;

use crate::report::MoveReport;

/// Result type alias using `UnpackError`.
pub type Result<T> = std::result::Result<T, UnpackError>;

/// Which of the two attestation files a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationFile {
    /// The `.key` file holding the expected log digest.
    Key,
    /// The `.log` file holding the validation record.
    Log,
}

impl AttestationFile {
    /// File extension (without the dot) used to locate this file.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Log => "log",
        }
    }
}

impl std::fmt::Display for AttestationFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key => write!(f, "key file (*.key)"),
            Self::Log => write!(f, "log file (*.log)"),
        }
    }
}

/// Errors that can occur while verifying and unpacking an archive.
#[derive(Error, Debug)]
pub enum UnpackError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Command-line input is unusable.
    #[error("invalid argument: {reason}")]
    Argument {
        /// Why the argument was rejected.
        reason: String,
    },

    /// Configuration could not be loaded or is incomplete.
    #[error("configuration error in {path}: {reason}")]
    Config {
        /// Path of the configuration file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The input file does not carry the expected archive signature.
    #[error("not a 7z archive (bad file signature): {path}")]
    ArchiveFormat {
        /// The rejected input file.
        path: PathBuf,
    },

    /// The extraction tool's integrity test failed under the derived
    /// passphrase.
    #[error("archive integrity test failed: {path}")]
    ArchiveIntegrity {
        /// The archive that failed the test.
        path: PathBuf,
    },

    /// The staging directory could not be created.
    #[error("cannot create staging directory {path}: {source}")]
    StagingCreate {
        /// The staging path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The extraction tool could not be run, or its extract step failed.
    #[error("extraction tool `{program}` failed: {reason}")]
    ExtractionInvocation {
        /// Program that was invoked.
        program: String,
        /// Exit status or spawn error.
        reason: String,
    },

    /// A required attestation file is missing from staging.
    #[error("{kind} not found in {dir}")]
    FileNotFound {
        /// Which attestation file was missing.
        kind: AttestationFile,
        /// The directory that was searched.
        dir: PathBuf,
    },

    /// Fewer bytes were available than the check requires.
    #[error("{read} bytes read from {path}, expected {expected}")]
    ShortRead {
        /// The file that was read.
        path: PathBuf,
        /// Bytes actually read.
        read: usize,
        /// Bytes required.
        expected: usize,
    },

    /// The log digest does not match the stored key.
    #[error("log digest mismatch: expected {expected}, computed {actual}")]
    HashMismatch {
        /// Key file contents.
        expected: String,
        /// Digest of the log file.
        actual: String,
    },

    /// The log's result tag is not `PASS`.
    #[error("validation log result is {found:?}, expected \"PASS\"")]
    LogResult {
        /// The tag that was found (lossy UTF-8).
        found: String,
    },

    /// One or both attestation checks failed.
    #[error("verification failed: {failed} of 2 checks did not pass")]
    Verification {
        /// Number of failed checks.
        failed: usize,
    },

    /// A directory could not be opened.
    #[error("cannot open directory {path}: {source}")]
    DirectoryOpen {
        /// The directory path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Not every discovered file was moved.
    #[error("move count mismatch: {moved} of {discovered} files moved")]
    MoveCountMismatch {
        /// Regular files found in staging.
        discovered: usize,
        /// Files confirmed moved.
        moved: usize,
        /// Tally of the partial transfer, including the files left behind.
        report: Box<MoveReport>,
    },
}

impl UnpackError {
    /// Returns `true` if this error indicates the archive content was
    /// tampered with or failed upstream validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use upack_core::UnpackError;
    ///
    /// let err = UnpackError::HashMismatch {
    ///     expected: "aa".into(),
    ///     actual: "bb".into(),
    /// };
    /// assert!(err.is_tamper_signal());
    ///
    /// let err = UnpackError::Verification { failed: 1 };
    /// assert!(err.is_tamper_signal());
    /// ```
    #[must_use]
    pub const fn is_tamper_signal(&self) -> bool {
        matches!(
            self,
            Self::HashMismatch { .. } | Self::LogResult { .. } | Self::Verification { .. }
        )
    }

    /// Returns `true` for errors raised while validating input, before any
    /// archive content is touched.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Argument { .. } | Self::Config { .. } | Self::ArchiveFormat { .. }
        )
    }
}
