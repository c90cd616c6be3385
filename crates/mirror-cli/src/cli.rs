//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;

/// Mirror a source directory into a replica, one way, on a fixed interval
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source directory (never modified)
    #[arg(short, long, value_name = "DIR", env = "MIRROR_SOURCE")]
    pub source: Option<PathBuf>,

    /// Replica directory (created if missing, kept identical to source)
    #[arg(short, long, value_name = "DIR", env = "MIRROR_REPLICA")]
    pub replica: Option<PathBuf>,

    /// Seconds to wait after a pass before starting the next
    #[arg(short, long, value_name = "SECS", env = "MIRROR_INTERVAL")]
    pub interval: Option<u64>,

    /// Append log lines to this file as well as the console
    #[arg(short, long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Read settings from a TOML, JSON or YAML file; flags take precedence
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,

    /// Report what would change without touching the replica
    #[arg(long)]
    pub dry_run: bool,

    /// Print the pass report as JSON (requires --once)
    #[arg(long, requires = "once")]
    pub json: bool,

    /// Ignore symbolic links instead of following them
    #[arg(long)]
    pub no_follow_symlinks: bool,

    /// Keep replica directories that a pass leaves empty
    #[arg(long)]
    pub keep_empty_dirs: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
