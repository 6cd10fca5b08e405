//! Run-scoped log files.
//!
//! Every run writes two files into the working directory:
//!
//! - `execution.log`: the full trace of the run, debug level and up
//! - `err.log`: warnings and errors only, for quick triage
//!
//! Both are plain-text, timestamped, and free of ANSI escapes. A third
//! layer mirrors events to stderr, filtered by `RUST_LOG` so terminal
//! verbosity follows the usual `-v`/`-q` flags without affecting the files.
//!
//! The files belong to a single run. Leftovers from the previous run are
//! removed by the update command before this module reopens them.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::constants::{ERROR_LOG_FILE, EXECUTION_LOG_FILE};

/// Install the global subscriber writing into `workdir`.
///
/// Must be called once, before the first event of the run.
///
/// # Errors
///
/// IO errors opening the log files, or an error when a global subscriber
/// is already installed.
pub fn init(workdir: &Path) -> Result<()> {
    let execution = open_log(&workdir.join(EXECUTION_LOG_FILE))?;
    let errors = open_log(&workdir.join(ERROR_LOG_FILE))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Mutex::new(execution))
                .with_ansi(false)
                .with_target(true)
                .with_filter(LevelFilter::DEBUG),
        )
        .with(
            fmt::layer()
                .with_writer(Mutex::new(errors))
                .with_ansi(false)
                .with_target(false)
                .with_filter(LevelFilter::WARN),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    Ok(())
}

fn open_log(path: &Path) -> Result<File> {
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}
