//! Recursive tree scanning
//!
//! A scan walks every directory below a root and fingerprints each regular
//! file, keyed by its [`RelativePath`]. Scans are all-or-nothing: a directory
//! that cannot be listed or a file that cannot be read fails the whole scan,
//! since an incomplete view of a tree would turn into wrong deletions.

use std::collections::{BTreeMap, BTreeSet};
use std::collections::btree_map;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::fingerprint::{self, Fingerprint};
use crate::{Error, RelativePath, Result};

/// How symbolic links found in a source walk are treated.
///
/// Directory links are never descended into under either policy, so a walk
/// stays inside its root and cannot loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymlinkPolicy {
    /// A link to a file is fingerprinted from its target under the link's own
    /// path. Links to directories are skipped.
    #[default]
    Follow,
    /// Ignore links entirely.
    Skip,
}

/// Options controlling a tree scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub symlinks: SymlinkPolicy,
    /// Read size used when fingerprinting files.
    pub chunk_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            symlinks: SymlinkPolicy::default(),
            chunk_size: fingerprint::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Point-in-time mapping from relative path to content fingerprint.
///
/// Replica scans also record symbolic links, unfollowed, in a separate set:
/// they have no content of their own and are always replaced or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSnapshot {
    entries: BTreeMap<RelativePath, Fingerprint>,
    links: BTreeSet<RelativePath>,
}

impl TreeSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: RelativePath, fingerprint: Fingerprint) {
        self.entries.insert(path, fingerprint);
    }

    /// Record an unfollowed symbolic link.
    pub fn insert_link(&mut self, path: RelativePath) {
        self.links.insert(path);
    }

    pub fn get(&self, path: &RelativePath) -> Option<&Fingerprint> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &RelativePath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn is_link(&self, path: &RelativePath) -> bool {
        self.links.contains(path)
    }

    pub fn links(&self) -> impl Iterator<Item = &RelativePath> {
        self.links.iter()
    }

    /// Number of fingerprinted files. Links are not counted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.links.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, RelativePath, Fingerprint> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &RelativePath> {
        self.entries.keys()
    }
}

impl FromIterator<(RelativePath, Fingerprint)> for TreeSnapshot {
    fn from_iter<I: IntoIterator<Item = (RelativePath, Fingerprint)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            links: BTreeSet::new(),
        }
    }
}

impl<'a> IntoIterator for &'a TreeSnapshot {
    type Item = (&'a RelativePath, &'a Fingerprint);
    type IntoIter = btree_map::Iter<'a, RelativePath, Fingerprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Why an entry was left out of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A link to a directory; its contents are not mirrored.
    DirectorySymlink,
    /// A link whose target does not exist.
    DanglingSymlink,
    /// A FIFO, socket or device node.
    NotRegularFile,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::DirectorySymlink => "symbolic link to a directory",
            Self::DanglingSymlink => "dangling symbolic link",
            Self::NotRegularFile => "not a regular file",
        };
        f.write_str(text)
    }
}

/// An entry the walk saw but did not record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Result of a successful scan.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub snapshot: TreeSnapshot,
    pub skipped: Vec<SkippedEntry>,
}

/// Walks directory trees and builds [`TreeSnapshot`]s.
#[derive(Debug, Clone, Default)]
pub struct TreeScanner {
    options: ScanOptions,
}

impl TreeScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scan `root` and fingerprint every regular file below it.
    ///
    /// Symbolic links are handled per [`SymlinkPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if any directory cannot be listed or any file
    /// cannot be fingerprinted, and [`Error::InvalidRelativePath`] for file
    /// names that are not valid UTF-8. No partial snapshot is returned.
    pub fn scan(&self, root: &Path) -> Result<Scan> {
        let links = match self.options.symlinks {
            SymlinkPolicy::Follow => LinkMode::FollowFiles,
            SymlinkPolicy::Skip => LinkMode::Ignore,
        };
        self.walk(root, links)
    }

    /// Scan a tree whose contents are about to be overwritten.
    ///
    /// Symbolic links are recorded as links and never followed, so nothing
    /// outside `root` is fingerprinted or later modified through a link.
    ///
    /// # Errors
    ///
    /// Same as [`TreeScanner::scan`].
    pub fn scan_replica(&self, root: &Path) -> Result<Scan> {
        self.walk(root, LinkMode::Record)
    }

    fn walk(&self, root: &Path, links: LinkMode) -> Result<Scan> {
        let mut scan = Scan::default();

        for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
            let entry = entry.map_err(|err| walk_error(root, err))?;
            let path = entry.path();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                continue;
            }

            if file_type.is_symlink() {
                match links {
                    LinkMode::Ignore => {
                        tracing::trace!(path = %path.display(), "Ignoring symbolic link");
                    }
                    LinkMode::Record => {
                        scan.snapshot.insert_link(relative_to(root, path)?);
                    }
                    LinkMode::FollowFiles => match link_target_kind(path) {
                        Some(reason) => skip(&mut scan, path, reason),
                        None => {
                            let digest = fingerprint::fingerprint_file_with_chunk_size(
                                path,
                                self.options.chunk_size,
                            )?;
                            scan.snapshot.insert(relative_to(root, path)?, digest);
                        }
                    },
                }
                continue;
            }

            if !file_type.is_file() {
                skip(&mut scan, path, SkipReason::NotRegularFile);
                continue;
            }

            let digest =
                fingerprint::fingerprint_file_with_chunk_size(path, self.options.chunk_size)?;
            scan.snapshot.insert(relative_to(root, path)?, digest);
        }

        tracing::debug!(
            root = %root.display(),
            files = scan.snapshot.len(),
            skipped = scan.skipped.len(),
            "Scanned tree"
        );
        Ok(scan)
    }
}

#[derive(Debug, Clone, Copy)]
enum LinkMode {
    FollowFiles,
    Ignore,
    Record,
}

fn skip(scan: &mut Scan, path: &Path, reason: SkipReason) {
    tracing::debug!(path = %path.display(), %reason, "Skipping entry");
    scan.skipped.push(SkippedEntry {
        path: path.to_path_buf(),
        reason,
    });
}

/// `None` when the link resolves to a regular file. A link whose target
/// cannot be resolved at all (missing, or a chain of links that loops) is
/// dangling.
fn link_target_kind(path: &Path) -> Option<SkipReason> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => None,
        Ok(meta) if meta.is_dir() => Some(SkipReason::DirectorySymlink),
        Ok(_) => Some(SkipReason::NotRegularFile),
        Err(e) => {
            tracing::trace!(path = %path.display(), error = %e, "Unresolvable link");
            Some(SkipReason::DanglingSymlink)
        }
    }
}

fn relative_to(root: &Path, path: &Path) -> Result<RelativePath> {
    path.strip_prefix(root)
        .map_err(|_| Error::InvalidRelativePath {
            path: path.to_string_lossy().into_owned(),
        })
        .and_then(RelativePath::from_path)
}

fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    Error::io(path, std::io::Error::from(err))
}
