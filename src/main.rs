//! chartpin CLI entry point
//!
//! This is the main executable for chartpin. It handles command-line
//! argument parsing, error display, and exit codes:
//! - 0: every sub-chart override was applied
//! - 1: the run failed outright
//! - 2: the manifest was written, but some charts need manual follow-up

use anyhow::Result;
use chartpin_cli::cli;
use chartpin_cli::core::error::user_friendly_error;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    // Execute the command
    match cli.execute().await {
        Ok(outcome) => match outcome.exit_code() {
            0 => Ok(()),
            code => std::process::exit(code),
        },
        Err(e) => {
            // Convert to user-friendly error with context and suggestions
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
