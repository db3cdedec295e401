//! Key and log-result verification.

use std::ffi::OsStr;
use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;

use crate::Result;
use crate::UnpackError;
use crate::VerificationReport;
use crate::digest::HEX_DIGEST_LEN;
use crate::digest::digest_file;
use crate::error::AttestationFile;

/// Result tag a passing validation log ends with.
pub const LOG_PASS_TAG: &[u8; 4] = b"PASS";

/// The tag sits immediately before a single trailing terminator byte.
const LOG_TAIL_LEN: u64 = LOG_PASS_TAG.len() as u64 + 1;

/// Runs both attestation checks against the files in `staging_dir`.
///
/// Neither check short-circuits the other.
pub fn verify_staging(staging_dir: &Path) -> VerificationReport {
    let key_file = find_attestation_file(staging_dir, AttestationFile::Key);
    let log_file = find_attestation_file(staging_dir, AttestationFile::Log);
    let key_path = key_file.as_ref().ok().cloned();
    let log_path = log_file.as_ref().ok().cloned();

    let (key_check, log_check) = match (key_file, log_file) {
        (Ok(key), Ok(log)) => (check_key(&key, &log), check_log_result(&log)),
        (Err(key_err), Ok(log)) => (Err(key_err), check_log_result(&log)),
        // The key check hashes the log, so it cannot pass without one.
        (Ok(_), Err(log_err)) => (
            Err(UnpackError::FileNotFound {
                kind: AttestationFile::Log,
                dir: staging_dir.to_path_buf(),
            }),
            Err(log_err),
        ),
        (Err(key_err), Err(log_err)) => (Err(key_err), Err(log_err)),
    };

    if let Err(err) = &key_check {
        if err.is_tamper_signal() {
            tracing::warn!(%err, "the log file has been altered and is no longer reliable");
        } else {
            tracing::warn!(%err, "key check failed");
        }
    }
    if let Err(err) = &log_check {
        tracing::warn!(%err, "log result check failed");
    }

    VerificationReport {
        key_file: key_path,
        log_file: log_path,
        key_check,
        log_check,
    }
}

/// Returns the first regular file in `dir` (by file name) whose extension
/// matches `kind`.
///
/// The extension is whatever follows the last `.` of the name, compared
/// case-sensitively; a file named `.key` counts.
///
/// # Errors
///
/// `DirectoryOpen` if `dir` cannot be read, `FileNotFound` if nothing
/// matches.
pub fn find_attestation_file(dir: &Path, kind: AttestationFile) -> Result<PathBuf> {
    let entries = fs::read_dir(dir).map_err(|source| UnpackError::DirectoryOpen {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() && has_extension(&entry.file_name(), kind.extension()) {
            matches.push(entry.path());
        }
    }
    matches.sort();

    matches
        .into_iter()
        .next()
        .ok_or_else(|| UnpackError::FileNotFound {
            kind,
            dir: dir.to_path_buf(),
        })
}

fn has_extension(name: &OsStr, ext: &str) -> bool {
    let bytes = name.as_encoded_bytes();
    bytes
        .iter()
        .rposition(|b| *b == b'.')
        .is_some_and(|dot| &bytes[dot + 1..] == ext.as_bytes())
}

/// Checks that the first 64 bytes of `key_path` equal the hex digest of the
/// whole of `log_path`.
///
/// Comparison is byte-exact; an uppercase key does not match. Bytes after
/// the first 64 (such as a trailing newline) are ignored.
///
/// # Errors
///
/// - `Io` if either file cannot be read
/// - `ShortRead` if the key file holds fewer than 64 bytes
/// - `HashMismatch` if the digests differ
pub fn check_key(key_path: &Path, log_path: &Path) -> Result<()> {
    let mut key = Vec::with_capacity(HEX_DIGEST_LEN);
    File::open(key_path)?
        .take(HEX_DIGEST_LEN as u64)
        .read_to_end(&mut key)?;
    if key.len() != HEX_DIGEST_LEN {
        return Err(UnpackError::ShortRead {
            path: key_path.to_path_buf(),
            read: key.len(),
            expected: HEX_DIGEST_LEN,
        });
    }

    let actual = digest_file(log_path)?;
    if key == actual.as_bytes() {
        Ok(())
    } else {
        Err(UnpackError::HashMismatch {
            expected: String::from_utf8_lossy(&key).into_owned(),
            actual,
        })
    }
}

/// Checks the validation result tag: the 4 bytes ending one byte before
/// end of file must be exactly `PASS`.
///
/// # Errors
///
/// - `Io` if the file cannot be read
/// - `ShortRead` if the file is shorter than 5 bytes
/// - `LogResult` if the tag is anything other than `PASS`
pub fn check_log_result(log_path: &Path) -> Result<()> {
    let mut file = File::open(log_path)?;
    let len = file.metadata()?.len();
    if len < LOG_TAIL_LEN {
        return Err(UnpackError::ShortRead {
            path: log_path.to_path_buf(),
            read: usize::try_from(len).unwrap_or(usize::MAX),
            expected: LOG_PASS_TAG.len() + 1,
        });
    }

    file.seek(SeekFrom::Start(len - LOG_TAIL_LEN))?;
    let mut tag = [0u8; LOG_PASS_TAG.len()];
    file.read_exact(&mut tag)?;

    if &tag == LOG_PASS_TAG {
        Ok(())
    } else {
        Err(UnpackError::LogResult {
            found: String::from_utf8_lossy(&tag).into_owned(),
        })
    }
}
