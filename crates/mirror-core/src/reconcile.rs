//! Applying a [`Plan`] to the replica
//!
//! Operations are independent and best-effort: a failure is reported through
//! the sink, recorded in the [`PassReport`], and the remaining operations
//! still run. The next pass retries whatever failed, since the snapshots will
//! still differ.

use mirror_fs::io;

use crate::event::{EventSink, SyncEvent};
use crate::options::SyncOptions;
use crate::pass::Roots;
use crate::plan::{Operation, Plan};
use crate::report::PassReport;

/// Applies plans against a replica root.
pub struct Reconciler<'a> {
    roots: &'a Roots,
    options: &'a SyncOptions,
    sink: &'a dyn EventSink,
}

impl<'a> Reconciler<'a> {
    pub fn new(roots: &'a Roots, options: &'a SyncOptions, sink: &'a dyn EventSink) -> Self {
        Self {
            roots,
            options,
            sink,
        }
    }

    /// Attempt every operation in `plan`.
    ///
    /// Each operation is announced before the replica is touched.
    pub fn apply(&self, plan: &Plan) -> PassReport {
        let mut report = PassReport::new(plan.unchanged(), self.options.dry_run);

        for operation in plan.operations() {
            self.sink.emit(&SyncEvent::Applying {
                operation: operation.clone(),
                dry_run: self.options.dry_run,
            });

            if self.options.dry_run {
                report.record_success(operation);
                continue;
            }

            match self.execute(operation, &mut report) {
                Ok(()) => report.record_success(operation),
                Err(e) => {
                    let error = e.to_string();
                    self.sink.emit(&SyncEvent::OperationFailed {
                        operation: operation.clone(),
                        error: error.clone(),
                    });
                    report.record_failure(operation, error);
                }
            }
        }

        report
    }

    fn execute(&self, operation: &Operation, report: &mut PassReport) -> mirror_fs::Result<()> {
        let path = operation.path();
        let target = path.resolve(self.roots.replica());

        match operation {
            Operation::Create(_) | Operation::Update(_) => {
                io::ensure_no_linked_ancestor(self.roots.replica(), path)?;
                io::copy_atomic(
                    &path.resolve(self.roots.source()),
                    &target,
                    self.options.robustness,
                )
            }
            Operation::Delete(_) => {
                io::remove_file(&target)?;
                if self.options.prune_empty_dirs {
                    self.prune_above(path, report);
                }
                Ok(())
            }
        }
    }

    fn prune_above(&self, path: &mirror_fs::RelativePath, report: &mut PassReport) {
        match io::prune_empty_dirs(self.roots.replica(), path) {
            Ok(pruned) => {
                for dir in pruned {
                    self.sink
                        .emit(&SyncEvent::DirectoryPruned { path: dir.clone() });
                    report.pruned.push(dir);
                }
            }
            Err(e) => self.sink.emit(&SyncEvent::PruneFailed {
                path: path.clone(),
                error: e.to_string(),
            }),
        }
    }
}
