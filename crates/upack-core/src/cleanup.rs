//! Staging area removal.
//!
//! Decrypted archive content must not outlive the run that produced it.
//! [`StagingGuard`] removes the staging tree when it is dropped, so early
//! returns and panics clean up as well as the normal path.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::NoopObserver;
use crate::PipelineObserver;
use crate::Result;
use crate::UnpackError;

/// Recursively deletes everything under `root`, returning the number of
/// regular files removed.
///
/// See [`remove_all_with_progress`].
pub fn remove_all(root: &Path, remove_root: bool) -> Result<usize> {
    remove_all_with_progress(root, remove_root, &mut NoopObserver)
}

/// Recursively deletes everything under `root`, reporting each removed
/// regular file to `observer`.
///
/// Subdirectories are always pruned once emptied. Symlinks are unlinked,
/// never followed, and are not counted. Individual removal failures are
/// logged and skipped. With `remove_root`, `root` itself is removed last.
///
/// # Errors
///
/// `DirectoryOpen` if `root` cannot be opened as a directory; nothing is
/// removed in that case.
pub fn remove_all_with_progress(
    root: &Path,
    remove_root: bool,
    observer: &mut dyn PipelineObserver,
) -> Result<usize> {
    fs::read_dir(root).map_err(|source| UnpackError::DirectoryOpen {
        path: root.to_path_buf(),
        source,
    })?;

    let mut removed = 0;
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "error while walking staging area");
                continue;
            }
        };

        let path = entry.path();
        let file_type = entry.file_type();
        let result = if file_type.is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };

        match result {
            Ok(()) if file_type.is_file() => {
                removed += 1;
                observer.on_file_removed(path);
            }
            Ok(()) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "error occurred while removing");
            }
        }
    }

    if remove_root && let Err(e) = fs::remove_dir(root) {
        tracing::warn!(path = %root.display(), error = %e, "could not remove directory");
    }

    Ok(removed)
}

/// Removes a staging directory when dropped unless [`cleanup`] already did.
///
/// [`cleanup`]: StagingGuard::cleanup
#[derive(Debug)]
#[must_use = "the staging area is removed as soon as the guard is dropped"]
pub struct StagingGuard {
    path: PathBuf,
    armed: bool,
}

impl StagingGuard {
    /// Arms a guard for `path`. The directory need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    /// The guarded staging path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the staging tree now, returning the number of files removed,
    /// or `None` if there was nothing to remove.
    pub fn cleanup(mut self, observer: &mut dyn PipelineObserver) -> Option<usize> {
        self.armed = false;
        sweep(&self.path, observer)
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if self.armed {
            sweep(&self.path, &mut NoopObserver);
        }
    }
}

fn sweep(path: &Path, observer: &mut dyn PipelineObserver) -> Option<usize> {
    match remove_all_with_progress(path, true, observer) {
        Ok(count) => {
            tracing::debug!(path = %path.display(), count, "staging area removed");
            Some(count)
        }
        Err(UnpackError::DirectoryOpen { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no staging area to remove");
            None
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "error opening directory for removal");
            None
        }
    }
}
