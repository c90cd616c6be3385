//! A single reconciliation pass: validate roots, scan, plan, apply
//!
//! A pass is a single-shot function of the two trees. Running it again with
//! no intervening changes plans zero operations.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use mirror_fs::{Scan, TreeScanner};

use crate::error::{Error, Result, Tree};
use crate::event::{EventSink, SyncEvent};
use crate::options::SyncOptions;
use crate::plan::Plan;
use crate::reconcile::Reconciler;
use crate::report::PassReport;

/// Validated, canonical source and replica roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    source: PathBuf,
    replica: PathBuf,
}

impl Roots {
    /// Check both roots and canonicalize them.
    ///
    /// The source must be an existing directory. A missing replica is created;
    /// an existing one must be a directory. Neither root may contain the other.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid roots and [`Error::Fs`] if the
    /// replica cannot be created or a root cannot be canonicalized.
    pub fn validate(source: impl AsRef<Path>, replica: impl AsRef<Path>) -> Result<Self> {
        let source = source.as_ref();
        let replica = replica.as_ref();

        match std::fs::metadata(source) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::config(format!(
                    "Source {} is not a directory",
                    source.display()
                )));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::config(format!(
                    "Source directory {} does not exist",
                    source.display()
                )));
            }
            Err(e) => return Err(mirror_fs::Error::io(source, e).into()),
        }

        match std::fs::metadata(replica) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::config(format!(
                    "Replica {} is not a directory",
                    replica.display()
                )));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(replica = %replica.display(), "Creating replica root");
                std::fs::create_dir_all(replica).map_err(|e| mirror_fs::Error::io(replica, e))?;
            }
            Err(e) => return Err(mirror_fs::Error::io(replica, e).into()),
        }

        let source = mirror_fs::canonicalize(source)?;
        let replica = mirror_fs::canonicalize(replica)?;

        if source == replica {
            return Err(Error::config(format!(
                "Source and replica are the same directory: {}",
                source.display()
            )));
        }
        if replica.starts_with(&source) {
            return Err(Error::config(format!(
                "Replica {} is inside source {}",
                replica.display(),
                source.display()
            )));
        }
        if source.starts_with(&replica) {
            return Err(Error::config(format!(
                "Source {} is inside replica {}",
                source.display(),
                replica.display()
            )));
        }

        Ok(Self { source, replica })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn replica(&self) -> &Path {
        &self.replica
    }
}

/// Run one full scan-diff-apply pass.
///
/// Emits a start event, then either a completion event carrying the pass
/// summary or an abort event carrying the error. Roots are validated again at
/// the start of every pass since either tree may have moved since the last.
///
/// # Errors
///
/// Returns [`Error::Config`] for invalid roots and [`Error::Scan`] when
/// either tree cannot be scanned completely. In both cases nothing was
/// applied. Failures of individual operations are in the returned report.
pub fn run_pass(
    source: &Path,
    replica: &Path,
    options: &SyncOptions,
    sink: &dyn EventSink,
) -> Result<PassReport> {
    sink.emit(&SyncEvent::PassStarted);

    let result =
        Roots::validate(source, replica).and_then(|roots| reconcile(&roots, options, sink));

    match &result {
        Ok(report) => sink.emit(&SyncEvent::PassCompleted {
            summary: report.summary(),
            dry_run: report.dry_run,
        }),
        Err(e) => sink.emit(&SyncEvent::PassAborted {
            error: e.to_string(),
        }),
    }

    result
}

/// Scan both roots, plan, and apply.
pub fn reconcile(roots: &Roots, options: &SyncOptions, sink: &dyn EventSink) -> Result<PassReport> {
    let scanner = TreeScanner::new(options.scan);
    let source = scan_tree(&scanner, Tree::Source, roots.source(), sink)?;
    let replica = scan_tree(&scanner, Tree::Replica, roots.replica(), sink)?;

    let plan = Plan::between(&source.snapshot, &replica.snapshot);
    Ok(Reconciler::new(roots, options, sink).apply(&plan))
}

fn scan_tree(
    scanner: &TreeScanner,
    tree: Tree,
    root: &Path,
    sink: &dyn EventSink,
) -> Result<Scan> {
    let scan = match tree {
        Tree::Source => scanner.scan(root),
        Tree::Replica => scanner.scan_replica(root),
    }
    .map_err(|source| Error::Scan { tree, source })?;

    for skipped in &scan.skipped {
        sink.emit(&SyncEvent::EntrySkipped {
            tree,
            path: skipped.path.clone(),
            reason: skipped.reason,
        });
    }

    Ok(scan)
}
