//! Per-pass outcome reporting

use mirror_fs::RelativePath;
use serde::Serialize;

use crate::plan::Operation;

/// An operation that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationFailure {
    pub operation: Operation,
    pub error: String,
}

/// Counts for one pass, carried by the completion event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl std::fmt::Display for PassSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} copied, {} updated, {} deleted, {} unchanged, {} failed",
            self.created, self.updated, self.deleted, self.unchanged, self.failed
        )
    }
}

/// Report from a reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Whether operations were only simulated
    pub dry_run: bool,
    pub created: Vec<RelativePath>,
    pub updated: Vec<RelativePath>,
    pub deleted: Vec<RelativePath>,
    /// Replica directories removed after they became empty
    pub pruned: Vec<RelativePath>,
    pub unchanged: usize,
    pub failures: Vec<OperationFailure>,
}

impl PassReport {
    pub fn new(unchanged: usize, dry_run: bool) -> Self {
        Self {
            dry_run,
            unchanged,
            ..Self::default()
        }
    }

    pub(crate) fn record_success(&mut self, operation: &Operation) {
        let bucket = match operation {
            Operation::Create(_) => &mut self.created,
            Operation::Update(_) => &mut self.updated,
            Operation::Delete(_) => &mut self.deleted,
        };
        bucket.push(operation.path().clone());
    }

    pub(crate) fn record_failure(&mut self, operation: &Operation, error: String) {
        self.failures.push(OperationFailure {
            operation: operation.clone(),
            error,
        });
    }

    /// Whether every planned operation was applied.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of operations attempted, successful or not.
    pub fn operation_count(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len() + self.failures.len()
    }

    pub fn summary(&self) -> PassSummary {
        PassSummary {
            created: self.created.len(),
            updated: self.updated.len(),
            deleted: self.deleted.len(),
            unchanged: self.unchanged,
            failed: self.failures.len(),
        }
    }
}
