//! Replica-side file operations: atomic copies, removals and pruning
//!
//! Copies are staged in a temporary file next to the destination and renamed
//! into place, so a reader never observes a truncated file at the
//! destination path.

use std::fs::{self, File, FileTimes, Metadata, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::ExponentialBackoff;
use fs2::FileExt;

use crate::{Error, RelativePath, Result};

/// Tuning for replica writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// Upper bound on retrying a rename that fails transiently.
    pub lock_timeout: Duration,
    /// Flush the staged file to disk before renaming it into place.
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(2),
            enable_fsync: true,
        }
    }
}

/// Temporary staging path for `dest`, in the same directory so the final
/// rename never crosses filesystems.
pub fn temp_path_for(dest: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        dest.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    dest.with_file_name(temp_name)
}

/// Copy `source` to `dest` atomically.
///
/// Creates missing parent directories, copies content, permission bits and
/// access/modification times, then renames the staged file over `dest`.
/// A directory at `dest` is removed with everything below it once the copy
/// is staged; a symbolic link at `dest` is replaced, never written through.
/// On failure the staged file is removed.
///
/// # Errors
///
/// Returns an error if the source cannot be read, the staging file cannot be
/// written, or the final rename fails.
pub fn copy_atomic(source: &Path, dest: &Path, config: RobustnessConfig) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let mut src = File::open(source).map_err(|e| Error::io(source, e))?;
    let metadata = src.metadata().map_err(|e| Error::io(source, e))?;

    let temp_path = temp_path_for(dest);
    let result = stage_copy(&mut src, source, &metadata, &temp_path, config)
        .and_then(|()| clear_directory(dest))
        .and_then(|()| rename_with_retry(&temp_path, dest, config));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn stage_copy(
    src: &mut File,
    source: &Path,
    metadata: &Metadata,
    temp_path: &Path,
    config: RobustnessConfig,
) -> Result<()> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|e| Error::lock_failed(temp_path, e))?;

    std::io::copy(src, &mut temp_file).map_err(|e| Error::io(source, e))?;

    // Times before permissions: a read-only mode must not block the update
    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    temp_file
        .set_times(times)
        .map_err(|e| Error::io(temp_path, e))?;
    temp_file
        .set_permissions(metadata.permissions())
        .map_err(|e| Error::io(temp_path, e))?;

    if config.enable_fsync {
        temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    }

    temp_file
        .unlock()
        .map_err(|e| Error::lock_failed(temp_path, e))?;

    Ok(())
}

fn clear_directory(dest: &Path) -> Result<()> {
    match fs::symlink_metadata(dest) {
        Ok(meta) if meta.is_dir() => {
            tracing::debug!(path = %dest.display(), "Removing directory in the way of a file");
            fs::remove_dir_all(dest).map_err(|e| Error::io(dest, e))
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(dest, e)),
    }
}

fn rename_with_retry(from: &Path, to: &Path, config: RobustnessConfig) -> Result<()> {
    let policy = ExponentialBackoff {
        max_elapsed_time: Some(config.lock_timeout),
        ..ExponentialBackoff::default()
    };

    backoff::retry(policy, || {
        fs::rename(from, to).map_err(|e| {
            if is_transient(&e) {
                tracing::debug!(path = %to.display(), error = %e, "Retrying rename");
                backoff::Error::transient(e)
            } else {
                backoff::Error::permanent(e)
            }
        })
    })
    .map_err(|e| match e {
        backoff::Error::Permanent(err) | backoff::Error::Transient { err, .. } => {
            Error::io(to, err)
        }
    })
}

/// Windows reports sharing violations from virus scanners and indexers as
/// access denied; those clear up on their own.
fn is_transient(err: &std::io::Error) -> bool {
    match err.kind() {
        ErrorKind::Interrupted | ErrorKind::WouldBlock => true,
        ErrorKind::PermissionDenied => cfg!(windows),
        _ => false,
    }
}

/// Remove a replica file or symbolic link.
///
/// Links are unlinked, never followed. A file that is already gone counts
/// as removed.
pub fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "File already removed");
            Ok(())
        }
        // Directory links on Windows are removed as directories
        Err(e) if cfg!(windows) && is_symlink(path) => {
            fs::remove_dir(path).map_err(|_| Error::io(path, e))
        }
        Err(e) => Err(Error::io(path, e)),
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Fail if any directory between `root` and `path` is a symbolic link.
///
/// Checked before writing `path` so a link left in the replica cannot
/// redirect a copy outside `root`.
pub fn ensure_no_linked_ancestor(root: &Path, path: &RelativePath) -> Result<()> {
    let mut current = path.parent();
    while let Some(dir) = current {
        let native = dir.resolve(root);
        if is_symlink(&native) {
            return Err(Error::LinkedAncestor { path: native });
        }
        current = dir.parent();
    }
    Ok(())
}

/// Remove the directories above `removed` that are now empty.
///
/// Walks upward from the parent of `removed`, stopping at the first directory
/// that still has entries. `root` itself is never removed. Returns the
/// directories that were deleted, deepest first.
pub fn prune_empty_dirs(root: &Path, removed: &RelativePath) -> Result<Vec<RelativePath>> {
    let mut pruned = Vec::new();
    let mut current = removed.parent();

    while let Some(dir) = current {
        let native = dir.resolve(root);
        let mut entries = match fs::read_dir(&native) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => break,
            Err(e) => return Err(Error::io(&native, e)),
        };
        if entries.next().is_some() {
            break;
        }

        fs::remove_dir(&native).map_err(|e| Error::io(&native, e))?;
        current = dir.parent();
        pruned.push(dir);
    }

    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_stays_in_destination_directory() {
        let dest = Path::new("replica").join("sub").join("file.txt");
        let temp = temp_path_for(&dest);

        assert_eq!(temp.parent(), dest.parent());
        let name = temp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".file.txt."));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_file(&dir.path().join("never-existed")).is_ok());
    }
}
