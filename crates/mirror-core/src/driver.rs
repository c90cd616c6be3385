//! Periodic driver
//!
//! Runs passes back to back with a fixed pause in between. A pass always runs
//! to completion before the pause starts, so passes never overlap even when
//! one overruns the interval.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::event::EventSink;
use crate::options::SyncOptions;
use crate::pass::{self, Roots};
use crate::report::PassReport;

/// Repeatedly reconciles one source/replica pair.
#[derive(Debug, Clone)]
pub struct Driver {
    source: PathBuf,
    replica: PathBuf,
    options: SyncOptions,
    interval: Duration,
}

impl Driver {
    /// Create a driver for roots that were validated at startup.
    pub fn new(roots: Roots, options: SyncOptions, interval: Duration) -> Self {
        Self {
            source: roots.source().to_path_buf(),
            replica: roots.replica().to_path_buf(),
            options,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run a single pass.
    pub fn run_once(&self, sink: &dyn EventSink) -> Result<PassReport> {
        pass::run_pass(&self.source, &self.replica, &self.options, sink)
    }

    /// Run passes until `max_passes` have completed, or forever when `None`.
    ///
    /// Pass-level errors have already been reported to the sink by the pass
    /// itself; the loop carries on and the next pass retries. Returns the
    /// number of passes run.
    pub fn run(&self, sink: &dyn EventSink, max_passes: Option<u64>) -> u64 {
        let mut passes = 0;
        loop {
            if let Err(e) = self.run_once(sink) {
                tracing::debug!(error = %e, "Pass ended early, retrying next interval");
            }
            passes += 1;

            if max_passes.is_some_and(|max| passes >= max) {
                return passes;
            }
            std::thread::sleep(self.interval);
        }
    }
}
