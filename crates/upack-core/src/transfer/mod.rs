//! Transactional transfer of staged files into the repository.
//!
//! Success means every regular file found in staging was moved. Files
//! already moved are not rolled back when a later file fails; the count
//! mismatch is reported instead.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use crate::MoveReport;
use crate::NoopObserver;
use crate::PipelineObserver;
use crate::Result;
use crate::UnpackError;
use crate::copy::CopyBuffer;
use crate::copy::copy_file;

/// How a single file reached its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// Atomic rename on the same filesystem.
    Renamed,
    /// Byte copy followed by unlink of the source, across filesystems.
    Copied,
}

/// Moves every regular file directly under `src_dir` into `dst_dir`.
///
/// See [`move_all_with_progress`].
pub fn move_all(src_dir: &Path, dst_dir: &Path) -> Result<MoveReport> {
    move_all_with_progress(src_dir, dst_dir, &mut NoopObserver)
}

/// Moves every regular file directly under `src_dir` into `dst_dir`,
/// reporting each moved file to `observer`.
///
/// Subdirectories and other non-regular entries are left in place. Each
/// file keeps its name and replaces any same-named file in `dst_dir`.
///
/// # Errors
///
/// - `DirectoryOpen` if `dst_dir` or `src_dir` cannot be opened; nothing is
///   moved in that case
/// - `MoveCountMismatch` if any discovered file could not be moved; the
///   error carries the partial [`MoveReport`]
pub fn move_all_with_progress(
    src_dir: &Path,
    dst_dir: &Path,
    observer: &mut dyn PipelineObserver,
) -> Result<MoveReport> {
    move_all_with(src_dir, dst_dir, observer, |from, to| fs::rename(from, to))
}

fn move_all_with<F>(
    src_dir: &Path,
    dst_dir: &Path,
    observer: &mut dyn PipelineObserver,
    rename: F,
) -> Result<MoveReport>
where
    F: FnMut(&Path, &Path) -> io::Result<()>,
{
    let report = transfer_with(src_dir, dst_dir, observer, rename)?;
    if report.is_complete() {
        Ok(report)
    } else {
        Err(UnpackError::MoveCountMismatch {
            discovered: report.discovered,
            moved: report.moved,
            report: Box::new(report),
        })
    }
}

/// Walks `src_dir` and relocates each regular file with `rename`, returning
/// the tally whether or not it is complete.
fn transfer_with<F>(
    src_dir: &Path,
    dst_dir: &Path,
    observer: &mut dyn PipelineObserver,
    mut rename: F,
) -> Result<MoveReport>
where
    F: FnMut(&Path, &Path) -> io::Result<()>,
{
    open_dir(dst_dir)?;
    let entries = open_dir(src_dir)?;

    let mut report = MoveReport::new();
    let mut buffer = CopyBuffer::new();

    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        report.discovered += 1;

        let src = entry.path();
        let dst = dst_dir.join(entry.file_name());
        match relocate_with(&src, &dst, &mut buffer, &mut rename) {
            Ok(how) => {
                tracing::debug!(src = %src.display(), dst = %dst.display(), ?how, "moved");
                report.moved += 1;
                if how == Relocation::Copied {
                    report.copied_across_devices += 1;
                }
                observer.on_file_moved(&src, &dst);
                report.moved_files.push(dst);
            }
            Err(e) => {
                tracing::warn!(src = %src.display(), dst = %dst_dir.display(), error = %e, "error while moving");
                report.failures.push((src, e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Moves one file, falling back to copy and unlink when `rename` fails
/// because source and destination are on different filesystems.
pub fn relocate(src: &Path, dst: &Path, buffer: &mut CopyBuffer) -> io::Result<Relocation> {
    relocate_with(src, dst, buffer, &mut |from: &Path, to: &Path| {
        fs::rename(from, to)
    })
}

fn relocate_with<F>(
    src: &Path,
    dst: &Path,
    buffer: &mut CopyBuffer,
    rename: &mut F,
) -> io::Result<Relocation>
where
    F: FnMut(&Path, &Path) -> io::Result<()>,
{
    match rename(src, dst) {
        Ok(()) => Ok(Relocation::Renamed),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_unlink(src, dst, buffer)?;
            Ok(Relocation::Copied)
        }
        Err(e) => Err(e),
    }
}

/// Simulates a move: full copy to `dst`, then removal of `src`.
///
/// A partial destination file is removed again if the copy fails, so the
/// source stays the only copy.
fn copy_then_unlink(src: &Path, dst: &Path, buffer: &mut CopyBuffer) -> io::Result<()> {
    if let Err(e) = copy_file(src, dst, buffer) {
        let _ = fs::remove_file(dst);
        return Err(e);
    }
    fs::remove_file(src)
}

fn open_dir(path: &Path) -> Result<fs::ReadDir> {
    fs::read_dir(path).map_err(|source| UnpackError::DirectoryOpen {
        path: PathBuf::from(path),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cross_device(_from: &Path, _to: &Path) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::CrossesDevices))
    }

    fn setup(files: &[(&str, &[u8])]) -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("staging");
        let dst = temp.path().join("repo");
        fs::create_dir(&src).unwrap();
        fs::create_dir(&dst).unwrap();
        for (name, data) in files {
            fs::write(src.join(name), data).unwrap();
        }
        (temp, src, dst)
    }

    #[test]
    fn test_move_all_moves_every_file() {
        let (_temp, src, dst) = setup(&[("a.whl", b"a"), ("b.whl", b"b"), ("p.log", b"log")]);

        let report = move_all(&src, &dst).unwrap();
        assert_eq!(report.discovered, 3);
        assert_eq!(report.moved, 3);
        assert_eq!(report.copied_across_devices, 0);
        assert_eq!(fs::read_dir(&src).unwrap().count(), 0);
        assert_eq!(fs::read(dst.join("b.whl")).unwrap(), b"b");
    }

    #[test]
    fn test_move_all_leaves_subdirectories() {
        let (_temp, src, dst) = setup(&[("a.whl", b"a")]);
        fs::create_dir(src.join("nested")).unwrap();
        fs::write(src.join("nested").join("inner.whl"), b"i").unwrap();

        let report = move_all(&src, &dst).unwrap();
        assert_eq!(report.discovered, 1);
        assert!(src.join("nested").join("inner.whl").exists());
        assert!(!dst.join("nested").exists());
    }

    #[test]
    fn test_move_all_empty_source() {
        let (_temp, src, dst) = setup(&[]);
        let report = move_all(&src, &dst).unwrap();
        assert_eq!(report.discovered, 0);
        assert!(report.is_complete());
    }

    #[test]
    fn test_missing_destination_moves_nothing() {
        let (temp, src, _dst) = setup(&[("a.whl", b"a")]);
        let err = move_all(&src, &temp.path().join("absent")).unwrap_err();
        assert!(matches!(err, UnpackError::DirectoryOpen { .. }));
        assert!(src.join("a.whl").exists());
    }

    #[test]
    fn test_missing_source() {
        let (temp, _src, dst) = setup(&[]);
        let err = move_all(&temp.path().join("absent"), &dst).unwrap_err();
        assert!(matches!(err, UnpackError::DirectoryOpen { .. }));
    }

    #[test]
    fn test_cross_device_fallback_copies_and_unlinks() {
        let content: Vec<u8> = (0..150_000u32).map(|i| (i % 253) as u8).collect();
        let (_temp, src, dst) = setup(&[("big.whl", &content), ("small.whl", b"s")]);

        let report = transfer_with(&src, &dst, &mut NoopObserver, cross_device).unwrap();
        assert_eq!(report.moved, 2);
        assert_eq!(report.copied_across_devices, 2);
        assert_eq!(fs::read(dst.join("big.whl")).unwrap(), content);
        assert!(!src.join("big.whl").exists());
        assert!(!src.join("small.whl").exists());
    }

    #[test]
    fn test_other_rename_errors_leave_file() {
        let (_temp, src, dst) = setup(&[("a.whl", b"a"), ("b.whl", b"b")]);

        let err = move_all_with(&src, &dst, &mut NoopObserver, |from, to| {
            if from.ends_with("b.whl") {
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            } else {
                fs::rename(from, to)
            }
        })
        .unwrap_err();

        let UnpackError::MoveCountMismatch {
            discovered: 2,
            moved: 1,
            report,
        } = err
        else {
            panic!("expected a move count mismatch");
        };
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, src.join("b.whl"));
        assert_eq!(report.moved_files, [dst.join("a.whl")]);
        assert!(src.join("b.whl").exists());
        assert!(dst.join("a.whl").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_move_all_reports_unmovable_file() {
        let (_temp, src, dst) = setup(&[("a.whl", b"a"), ("b.whl", b"b")]);
        fs::create_dir(dst.join("b.whl")).unwrap();

        let err = move_all(&src, &dst).unwrap_err();
        assert!(matches!(
            err,
            UnpackError::MoveCountMismatch {
                discovered: 2,
                moved: 1,
                ..
            }
        ));
        assert!(src.join("b.whl").exists());
        assert!(dst.join("b.whl").is_dir());
        assert_eq!(fs::read(dst.join("a.whl")).unwrap(), b"a");
    }

    #[test]
    fn test_relocate_same_device() {
        let (_temp, src, dst) = setup(&[("a.whl", b"a")]);
        let how = relocate(&src.join("a.whl"), &dst.join("a.whl"), &mut CopyBuffer::new()).unwrap();
        assert_eq!(how, Relocation::Renamed);
        assert!(dst.join("a.whl").exists());
    }

    #[test]
    fn test_failed_copy_keeps_source() {
        let (temp, src, _dst) = setup(&[("a.whl", b"a")]);
        let missing_dir = temp.path().join("gone").join("a.whl");

        let err = relocate_with(
            &src.join("a.whl"),
            &missing_dir,
            &mut CopyBuffer::new(),
            &mut cross_device,
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(src.join("a.whl").exists());
    }
}
