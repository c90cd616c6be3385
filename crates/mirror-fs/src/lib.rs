//! Filesystem layer for folder-mirror
//!
//! Content fingerprints, recursive tree scans and the replica-side file
//! operations the reconciler is built on.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod io;
pub mod path;
pub mod scan;

pub use config::load_config;
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, fingerprint_bytes, fingerprint_file};
pub use io::RobustnessConfig;
pub use path::RelativePath;
pub use scan::{
    Scan, ScanOptions, SkipReason, SkippedEntry, SymlinkPolicy, TreeScanner, TreeSnapshot,
};

/// Canonicalize a path without the `\\?\` prefix on Windows.
pub fn canonicalize(path: &std::path::Path) -> Result<std::path::PathBuf> {
    dunce::canonicalize(path).map_err(|e| Error::io(path, e))
}
