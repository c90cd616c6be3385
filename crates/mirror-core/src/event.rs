//! Events emitted during a pass, and the sinks that receive them
//!
//! The core never logs through a global logger. Every component that reports
//! progress is handed an [`EventSink`]; [`TracingSink`] forwards events to
//! `tracing`, [`RecordingSink`] keeps them in memory.

use std::path::PathBuf;
use std::sync::Mutex;

use mirror_fs::{RelativePath, SkipReason};

use crate::error::Tree;
use crate::plan::Operation;
use crate::report::PassSummary;

/// How loudly an event should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Something that happened during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    PassStarted,
    /// Emitted before the filesystem is touched.
    Applying { operation: Operation, dry_run: bool },
    OperationFailed { operation: Operation, error: String },
    DirectoryPruned { path: RelativePath },
    /// The file was deleted but its emptied parents could not be removed.
    PruneFailed { path: RelativePath, error: String },
    EntrySkipped {
        tree: Tree,
        path: PathBuf,
        reason: SkipReason,
    },
    PassAborted { error: String },
    PassCompleted { summary: PassSummary, dry_run: bool },
}

impl SyncEvent {
    pub fn severity(&self) -> Severity {
        match self {
            Self::OperationFailed { .. } | Self::PassAborted { .. } => Severity::Error,
            Self::EntrySkipped { .. } | Self::PruneFailed { .. } => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl std::fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PassStarted => f.write_str("Starting synchronization."),
            Self::Applying {
                operation,
                dry_run: false,
            } => write!(f, "{}", operation),
            Self::Applying {
                operation,
                dry_run: true,
            } => write!(
                f,
                "[dry-run] Would {} {} {} replica.",
                operation.verb(),
                operation.path(),
                operation.preposition()
            ),
            Self::OperationFailed { operation, error } => write!(
                f,
                "Failed to {} {} {} replica: {}",
                operation.verb(),
                operation.path(),
                operation.preposition(),
                error
            ),
            Self::DirectoryPruned { path } => {
                write!(f, "Removed empty directory {} from replica.", path)
            }
            Self::PruneFailed { path, error } => write!(
                f,
                "Could not remove empty directories above {}: {}",
                path, error
            ),
            Self::EntrySkipped { tree, path, reason } => write!(
                f,
                "Skipping {} in {} tree: {}.",
                path.display(),
                tree,
                reason
            ),
            Self::PassAborted { error } => write!(f, "Synchronization aborted: {}", error),
            Self::PassCompleted { summary, dry_run } => write!(
                f,
                "Synchronization complete{}: {}.",
                if *dry_run { " (dry run)" } else { "" },
                summary
            ),
        }
    }
}

/// Receiver for pass events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &SyncEvent);
}

/// Forwards events to `tracing` at a level matching their severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &SyncEvent) {
        match event.severity() {
            Severity::Info => tracing::info!("{}", event),
            Severity::Warn => tracing::warn!("{}", event),
            Severity::Error => tracing::error!("{}", event),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in order.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.lock().clone()
    }

    /// Rendered messages received so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(ToString::to_string).collect()
    }

    /// Operations announced since the sink was created or last cleared.
    pub fn applied(&self) -> Vec<Operation> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                SyncEvent::Applying { operation, .. } => Some(operation.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SyncEvent>> {
        // A panic while holding the lock leaves the Vec intact
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &SyncEvent) {
        self.lock().push(event.clone());
    }
}
