//! Reconciliation engine for folder-mirror
//!
//! One-way mirroring of a source directory into a replica:
//! - **plan**: diff source and replica snapshots by relative path
//! - **reconcile**: apply creates, updates and deletes to the replica
//! - **pass**: validate roots, scan both trees, plan and apply
//! - **driver**: run passes on a fixed interval

pub mod driver;
pub mod error;
pub mod event;
pub mod options;
pub mod pass;
pub mod plan;
pub mod reconcile;
pub mod report;

pub use driver::Driver;
pub use error::{Error, Result, Tree};
pub use event::{EventSink, RecordingSink, Severity, SyncEvent, TracingSink};
pub use options::SyncOptions;
pub use pass::{Roots, reconcile, run_pass};
pub use plan::{Operation, Plan, plan};
pub use reconcile::Reconciler;
pub use report::{OperationFailure, PassReport, PassSummary};
