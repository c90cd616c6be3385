//! Effective settings: config file values overridden by command-line flags

use std::path::PathBuf;
use std::time::Duration;

use mirror_core::SyncOptions;
use mirror_fs::SymlinkPolicy;
use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Keys accepted in a `--config` file. All optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub source: Option<PathBuf>,
    pub replica: Option<PathBuf>,
    /// Seconds
    pub interval: Option<u64>,
    pub log: Option<PathBuf>,
    pub dry_run: Option<bool>,
    pub symlinks: Option<SymlinkPolicy>,
    pub prune_empty_dirs: Option<bool>,
    pub chunk_size: Option<usize>,
    pub fsync: Option<bool>,
}

/// Settings after merging the config file and flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub source: PathBuf,
    pub replica: PathBuf,
    /// `None` only for `--once`
    pub interval: Option<Duration>,
    pub log: Option<PathBuf>,
    pub once: bool,
    pub json: bool,
    pub options: SyncOptions,
}

impl Settings {
    /// Resolve settings from parsed arguments, loading `--config` if given.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => mirror_fs::load_config(path)?,
            None => FileSettings::default(),
        };
        Self::merge(cli, file)
    }

    /// Merge file values under command-line values.
    pub fn merge(cli: &Cli, file: FileSettings) -> Result<Self> {
        let source = cli
            .source
            .clone()
            .or(file.source)
            .ok_or_else(|| CliError::user("A source directory is required (--source)"))?;
        let replica = cli
            .replica
            .clone()
            .or(file.replica)
            .ok_or_else(|| CliError::user("A replica directory is required (--replica)"))?;

        let interval = match cli.interval.or(file.interval) {
            Some(0) => return Err(CliError::user("The interval must be at least 1 second")),
            Some(secs) => Some(Duration::from_secs(secs)),
            None if cli.once => None,
            None => {
                return Err(CliError::user(
                    "An interval is required (--interval) unless --once is given",
                ));
            }
        };

        let mut options = SyncOptions {
            dry_run: cli.dry_run || file.dry_run.unwrap_or(false),
            ..SyncOptions::default()
        };
        options.scan.symlinks = if cli.no_follow_symlinks {
            SymlinkPolicy::Skip
        } else {
            file.symlinks.unwrap_or_default()
        };
        if cli.keep_empty_dirs {
            options.prune_empty_dirs = false;
        } else if let Some(prune) = file.prune_empty_dirs {
            options.prune_empty_dirs = prune;
        }
        if let Some(chunk_size) = file.chunk_size {
            if chunk_size == 0 {
                return Err(CliError::user("chunk_size must be greater than zero"));
            }
            options.scan.chunk_size = chunk_size;
        }
        if let Some(fsync) = file.fsync {
            options.robustness.enable_fsync = fsync;
        }

        Ok(Self {
            source,
            replica,
            interval,
            log: cli.log.clone().or(file.log),
            once: cli.once,
            json: cli.json,
            options,
        })
    }
}
