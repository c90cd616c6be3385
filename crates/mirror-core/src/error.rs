//! Error types for mirror-core

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of the mirror an error or event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tree {
    Source,
    Replica,
}

impl std::fmt::Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Replica => f.write_str("replica"),
        }
    }
}

/// Errors that end a reconciliation pass early.
///
/// Failures of individual operations are not errors at this level; they are
/// collected in the [`PassReport`](crate::PassReport).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid source or replica root
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A tree could not be scanned completely
    #[error("Failed to scan {tree} tree: {source}")]
    Scan {
        tree: Tree,
        #[source]
        source: mirror_fs::Error,
    },

    /// Filesystem error from mirror-fs
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error comes from invalid roots rather than a transient
    /// filesystem condition.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
