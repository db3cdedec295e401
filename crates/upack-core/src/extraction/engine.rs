//! Test-then-extract sequencing.

use std::fs;
use std::io;
use std::path::Path;

use crate::ExtractionOutcome;
use crate::Result;
use crate::UnpackError;
use crate::cleanup::remove_all;
use crate::digest::derive_passphrase;
use crate::extraction::ArchiveTool;

/// Extracts `archive` into `staging_dir` using a passphrase derived from the
/// archive's file name.
///
/// The archive is tested first; nothing is written unless the test passes.
/// `staging_dir` is then created (its parent must exist) and the archive is
/// extracted into it. A staging directory left behind by an interrupted run
/// is emptied first, so only this archive's content is ever staged.
///
/// # Errors
///
/// - `ArchiveIntegrity` if the tool's test rejects the archive
/// - `StagingCreate` if the staging directory cannot be created, or a
///   leftover one cannot be emptied
/// - `ExtractionInvocation` if the tool cannot be run or extraction exits
///   non-zero
pub fn extract(
    archive: &Path,
    staging_dir: &Path,
    tool: &dyn ArchiveTool,
) -> Result<ExtractionOutcome> {
    let passphrase = derive_passphrase(archive);

    let status = tool
        .test(archive, &passphrase)
        .map_err(|e| invocation_error(tool, &e))?;
    if !status.is_success() {
        tracing::warn!(archive = %archive.display(), %status, "archive test failed");
        return Err(UnpackError::ArchiveIntegrity {
            path: archive.to_path_buf(),
        });
    }

    create_staging_dir(staging_dir)?;

    let status = tool
        .extract(archive, &passphrase, staging_dir)
        .map_err(|e| invocation_error(tool, &e))?;
    if !status.is_success() {
        tracing::warn!(archive = %archive.display(), %status, "archive extraction failed");
        return Err(UnpackError::ExtractionInvocation {
            program: tool.name(),
            reason: status.to_string(),
        });
    }

    let files_staged = count_regular_files(staging_dir)?;
    tracing::debug!(staging = %staging_dir.display(), files_staged, "archive extracted");

    Ok(ExtractionOutcome {
        staging_dir: staging_dir.to_path_buf(),
        files_staged,
    })
}

fn invocation_error(tool: &dyn ArchiveTool, err: &io::Error) -> UnpackError {
    UnpackError::ExtractionInvocation {
        program: tool.name(),
        reason: err.to_string(),
    }
}

/// Creates the right-most directory of `path` with owner-only access.
fn create_staging_dir(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    match builder.create(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && is_real_dir(path) => {
            sweep_stale_staging(path)
        }
        Err(source) => Err(staging_error(path, source)),
    }
}

/// Empties a staging directory that outlived its run and restores
/// owner-only access. Nothing in it was verified.
fn sweep_stale_staging(path: &Path) -> Result<()> {
    let removed = remove_all(path, false)?;
    tracing::warn!(staging = %path.display(), removed, "swept leftover staging content");

    let mut entries = fs::read_dir(path).map_err(|e| staging_error(path, e))?;
    if entries.next().is_some() {
        return Err(staging_error(
            path,
            io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                "leftover content could not be removed",
            ),
        ));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))
            .map_err(|e| staging_error(path, e))?;
    }
    Ok(())
}

fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}

fn staging_error(path: &Path, source: io::Error) -> UnpackError {
    UnpackError::StagingCreate {
        path: path.to_path_buf(),
        source,
    }
}

fn count_regular_files(dir: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        if entry?.file_type()?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::extraction::ToolStatus;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingTool {
        test_status: Option<ToolStatus>,
        extract_status: Option<ToolStatus>,
        calls: RefCell<Vec<(String, String)>>,
    }

    impl ArchiveTool for RecordingTool {
        fn name(&self) -> String {
            "recording".into()
        }

        fn test(&self, _archive: &Path, passphrase: &str) -> io::Result<ToolStatus> {
            self.calls.borrow_mut().push(("t".into(), passphrase.into()));
            Ok(self.test_status.unwrap_or(ToolStatus::Success))
        }

        fn extract(
            &self,
            _archive: &Path,
            passphrase: &str,
            output_dir: &Path,
        ) -> io::Result<ToolStatus> {
            self.calls.borrow_mut().push(("e".into(), passphrase.into()));
            fs::write(output_dir.join("payload.whl"), b"wheel").unwrap();
            Ok(self.extract_status.unwrap_or(ToolStatus::Success))
        }
    }

    #[test]
    fn test_extract_uses_derived_passphrase() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        let archive = PathBuf::from("/somewhere/pkg-1.0.7z");
        let tool = RecordingTool::default();

        let outcome = extract(&archive, &staging, &tool).unwrap();
        assert_eq!(outcome.files_staged, 1);
        assert_eq!(outcome.staging_dir, staging);

        let calls = tool.calls.borrow();
        let expected = derive_passphrase(&archive);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], ("t".to_string(), expected.clone()));
        assert_eq!(calls[1], ("e".to_string(), expected));
    }

    #[test]
    fn test_failed_test_never_extracts() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        let tool = RecordingTool {
            test_status: Some(ToolStatus::Failed(Some(2))),
            ..Default::default()
        };

        let err = extract(Path::new("pkg.7z"), &staging, &tool).unwrap_err();
        assert!(matches!(err, UnpackError::ArchiveIntegrity { .. }));
        assert_eq!(tool.calls.borrow().len(), 1);
        assert!(!staging.exists());
    }

    #[test]
    fn test_failed_extraction_is_error() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        let tool = RecordingTool {
            extract_status: Some(ToolStatus::Failed(Some(2))),
            ..Default::default()
        };

        let err = extract(Path::new("pkg.7z"), &staging, &tool).unwrap_err();
        assert!(matches!(err, UnpackError::ExtractionInvocation { .. }));
    }

    #[test]
    fn test_staging_parent_must_exist() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("missing").join("staging");
        let tool = RecordingTool::default();

        let err = extract(Path::new("pkg.7z"), &staging, &tool).unwrap_err();
        assert!(matches!(err, UnpackError::StagingCreate { .. }));
        assert_eq!(tool.calls.borrow().len(), 1);
    }

    #[test]
    fn test_leftover_staging_is_emptied_before_extraction() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        fs::create_dir(&staging).unwrap();
        fs::write(staging.join("evil.whl"), b"unverified").unwrap();
        fs::write(staging.join("payload.whl"), b"stale").unwrap();
        fs::create_dir(staging.join("nested")).unwrap();
        fs::write(staging.join("nested").join("inner.whl"), b"i").unwrap();

        let outcome = extract(Path::new("pkg.7z"), &staging, &RecordingTool::default()).unwrap();

        assert_eq!(outcome.files_staged, 1);
        assert!(!staging.join("evil.whl").exists());
        assert!(!staging.join("nested").exists());
        assert_eq!(fs::read(staging.join("payload.whl")).unwrap(), b"wheel");
    }

    #[test]
    fn test_leftover_staging_kept_when_test_fails() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        fs::create_dir(&staging).unwrap();
        fs::write(staging.join("evil.whl"), b"unverified").unwrap();
        let tool = RecordingTool {
            test_status: Some(ToolStatus::Failed(Some(2))),
            ..Default::default()
        };

        extract(Path::new("pkg.7z"), &staging, &tool).unwrap_err();
        assert!(staging.join("evil.whl").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_staging_symlink_is_rejected() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("elsewhere");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.whl"), b"k").unwrap();
        let staging = temp.path().join("staging");
        std::os::unix::fs::symlink(&target, &staging).unwrap();

        let err = extract(Path::new("pkg.7z"), &staging, &RecordingTool::default()).unwrap_err();
        assert!(matches!(err, UnpackError::StagingCreate { .. }));
        assert!(target.join("keep.whl").exists());
    }

    #[test]
    fn test_staging_path_is_a_file() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        fs::write(&staging, b"not a dir").unwrap();

        let err = extract(Path::new("pkg.7z"), &staging, &RecordingTool::default()).unwrap_err();
        assert!(matches!(err, UnpackError::StagingCreate { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_staging_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        extract(Path::new("pkg.7z"), &staging, &RecordingTool::default()).unwrap();

        let mode = fs::metadata(&staging).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_leftover_staging_is_made_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        fs::create_dir(&staging).unwrap();
        fs::set_permissions(&staging, fs::Permissions::from_mode(0o755)).unwrap();
        extract(Path::new("pkg.7z"), &staging, &RecordingTool::default()).unwrap();

        let mode = fs::metadata(&staging).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
}
