//! Options shared by the pass runner and the reconciler

use mirror_fs::{RobustnessConfig, ScanOptions};

/// Options for a reconciliation pass
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// If true, announce operations without modifying the replica.
    /// Messages are prefixed with "[dry-run] Would ..."
    pub dry_run: bool,
    /// Remove replica directories left empty by a delete.
    pub prune_empty_dirs: bool,
    pub scan: ScanOptions,
    pub robustness: RobustnessConfig,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            prune_empty_dirs: true,
            scan: ScanOptions::default(),
            robustness: RobustnessConfig::default(),
        }
    }
}
