//! Tree-relative paths with a normalized separator
//!
//! A [`RelativePath`] is the join key between the source and replica
//! snapshots, so two trees on different platforms must spell the same file
//! the same way.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::{Error, Result};

/// A path relative to a tree root, normalized to forward slashes.
///
/// Never empty, never absolute, and never contains `.` or `..` segments.
/// Converted to a platform-native path only when resolved against a root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RelativePath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl RelativePath {
    /// Parse a relative path from a string.
    ///
    /// Backslashes are treated as separators and repeated separators collapse.
    pub fn new(path: &str) -> Result<Self> {
        let normalized = path.replace('\\', "/");
        if normalized.starts_with('/') || has_drive_prefix(&normalized) {
            return Err(invalid(path));
        }

        let mut segments = Vec::new();
        for segment in normalized.split('/') {
            match segment {
                "" => continue,
                "." | ".." => return Err(invalid(path)),
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Err(invalid(path));
        }

        Ok(Self {
            inner: segments.join("/"),
        })
    }

    /// Build a relative path from a native path, such as the result of
    /// `strip_prefix` against a tree root.
    ///
    /// Fails for absolute paths, parent references and names that are not
    /// valid UTF-8.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => {
                    let name = name
                        .to_str()
                        .ok_or_else(|| invalid(&path.to_string_lossy()))?;
                    segments.push(name);
                }
                Component::CurDir => continue,
                _ => return Err(invalid(&path.to_string_lossy())),
            }
        }

        if segments.is_empty() {
            return Err(invalid(&path.to_string_lossy()));
        }

        Ok(Self {
            inner: segments.join("/"),
        })
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Iterate over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/')
    }

    /// Resolve this path against a tree root, producing a native path.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut native = root.to_path_buf();
        native.extend(self.segments());
        native
    }

    /// Get the parent path, or `None` for a top-level entry.
    pub fn parent(&self) -> Option<Self> {
        self.inner.rfind('/').map(|idx| Self {
            inner: self.inner[..idx].to_string(),
        })
    }

    /// Get the final segment.
    pub fn file_name(&self) -> &str {
        self.inner.rsplit('/').next().unwrap_or(&self.inner)
    }
}

fn invalid(path: &str) -> Error {
    Error::InvalidRelativePath {
        path: path.to_string(),
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl std::fmt::Display for RelativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl TryFrom<&str> for RelativePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&Path> for RelativePath {
    type Error = Error;

    fn try_from(p: &Path) -> Result<Self> {
        Self::from_path(p)
    }
}
