//! Command-line interface for chartpin.
//!
//! The CLI is a thin layer: it parses arguments with `clap`, translates the
//! global flags into a [`CliConfig`], and hands control to the subcommand.
//! All actual work lives in the rest of the crate.
//!
//! # Global Options
//!
//! Every subcommand inherits:
//! - `--verbose` / `-v`: debug-level output on stderr
//! - `--quiet` / `-q`: errors only on stderr
//! - `--no-progress`: no progress bars or spinners, for automation
//!
//! # Examples
//!
//! ```bash
//! chartpin update
//! chartpin -v update --branch release-9.2
//! chartpin --no-progress update --deep-search --workdir ./out
//! ```

pub mod branch;
pub mod update;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use update::{RunOutcome, UpdateCommand};

/// Runtime configuration derived from the global CLI flags.
///
/// Separated from [`Cli`] so tests can inject a configuration without going
/// through argument parsing.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log level for the `RUST_LOG` environment variable.
    ///
    /// When `None`, the existing `RUST_LOG` value is preserved and stderr
    /// stays quiet apart from errors.
    pub log_level: Option<String>,

    /// Whether to disable progress indicators and animated output.
    pub no_progress: bool,
}

impl CliConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply this configuration to the process environment.
    ///
    /// Sets `RUST_LOG` (unless the caller already exported one) and
    /// `CHARTPIN_NO_PROGRESS`, which the logging and progress modules read.
    /// Must be called exactly once, at the start of execution, before any
    /// thread that might inspect the environment.
    pub fn apply_to_env(&self) {
        if let Some(level) = &self.log_level {
            if std::env::var_os("RUST_LOG").is_none() {
                unsafe {
                    std::env::set_var("RUST_LOG", level);
                }
            }
        }

        if self.no_progress {
            unsafe {
                std::env::set_var("CHARTPIN_NO_PROGRESS", "1");
            }
        }
    }
}

/// Top-level command-line interface.
#[derive(Parser)]
#[command(
    name = "chartpin",
    about = "Pin Helm sub-chart versions to the release tags of a branch",
    version,
    long_about = "chartpin rewrites the umbrella chart's requirements.yaml so every sub-chart \
is pinned to the release tag cut from a chosen branch, keeping comments and local patch \
markers intact."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging.
    ///
    /// Equivalent to setting `RUST_LOG=debug`. Mutually exclusive with
    /// `--quiet`.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    ///
    /// Mutually exclusive with `--verbose`.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress bars and spinners for automation.
    #[arg(long, global = true)]
    no_progress: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Pin sub-chart versions to the release tags of a target branch.
    ///
    /// Downloads the umbrella chart manifest, resolves the release tag of
    /// every sub-chart for the chosen branch, and rewrites the manifest
    /// with the new versions. See [`update::UpdateCommand`].
    Update(update::UpdateCommand),
}

impl Cli {
    /// Execute the CLI with configuration derived from the parsed flags.
    ///
    /// # Errors
    ///
    /// Whatever the selected subcommand returns.
    pub async fn execute(self) -> Result<RunOutcome> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Build a [`CliConfig`] from the global flags.
    ///
    /// `--verbose` selects debug-level logging, `--quiet` disables the
    /// stderr log entirely, and the default is info level.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress,
        }
    }

    /// Execute the CLI with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Whatever the selected subcommand returns.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<RunOutcome> {
        config.apply_to_env();

        match self.command {
            Commands::Update(cmd) => cmd.execute().await,
        }
    }
}
