//! folder-mirror CLI
//!
//! Keeps a replica directory identical to a source directory, one pass every
//! interval, until interrupted.

mod cli;
mod error;
mod logging;
mod settings;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use mirror_core::{Driver, Roots, TracingSink};

use cli::Cli;
use error::Result;
use settings::Settings;

/// Exit code for `--once` when the pass ran but some operations failed.
const EXIT_PARTIAL: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli)?;

    logging::init(cli.verbose, settings.log.as_deref())?;
    tracing::debug!(?settings, "Resolved settings");

    // Invalid roots end the process here; later passes only log them
    let roots = Roots::validate(&settings.source, &settings.replica)?;
    tracing::info!(
        "Mirroring {} into {}",
        roots.source().display(),
        roots.replica().display()
    );

    let driver = Driver::new(
        roots,
        settings.options,
        settings.interval.unwrap_or_default(),
    );
    let sink = TracingSink;

    if settings.once {
        let report = driver.run_once(&sink)?;
        if settings.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        return Ok(if report.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(EXIT_PARTIAL)
        });
    }

    driver.run(&sink, None);
    Ok(ExitCode::SUCCESS)
}
