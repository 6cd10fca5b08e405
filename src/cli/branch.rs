//! Selection and validation of the target branch.
//!
//! Release tags are matched against a branch of the deployment project, so
//! the branch has to exist before the pipeline starts. A branch given via
//! `--branch` is validated once and a miss is fatal. Without the flag the
//! user is prompted in a loop: empty input and unknown branches re-prompt,
//! and closing stdin cancels the run.

use std::io::Write;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::core::{ChartpinError, Result};
use crate::gitlab::GitlabClient;

/// Resolve the branch the run should pin against.
///
/// `group` and `name` identify the deployment project on `legacy`.
///
/// # Errors
///
/// [`ChartpinError::BranchNotFound`] when a supplied branch does not exist,
/// [`ChartpinError::Cancelled`] when the prompt is abandoned, and any
/// request failure from the validation lookups.
pub async fn resolve_target_branch(
    legacy: &GitlabClient,
    group: &str,
    name: &str,
    supplied: Option<String>,
) -> Result<String> {
    if let Some(branch) = supplied {
        let branch = branch.trim().to_string();
        if branch.is_empty() {
            warn!("an empty branch name was supplied");
            return Err(ChartpinError::Other {
                message: "--branch cannot be empty".to_string(),
            });
        }
        legacy.branch(group, name, &branch).await?;
        info!("using branch '{branch}' given on the command line");
        return Ok(branch);
    }

    prompt_for_branch(legacy, group, name).await
}

/// Ask for a branch name until a valid one is typed or stdin is closed.
///
/// Reads lines through tokio's async stdin so the prompt stays responsive;
/// stdin may also be a pipe, in which case each line is consumed the same
/// way and end of input cancels the run.
async fn prompt_for_branch(legacy: &GitlabClient, group: &str, name: &str) -> Result<String> {
    let mut reader = BufReader::new(tokio::io::stdin());

    loop {
        print!("{} ", "Type the target branch name:".green());
        std::io::stdout().flush()?;

        let mut input = String::new();
        let bytes_read = reader.read_line(&mut input).await?;
        if bytes_read == 0 {
            println!();
            info!("stdin closed at the branch prompt, cancelling");
            return Err(ChartpinError::Cancelled);
        }

        let candidate = input.trim();
        if candidate.is_empty() {
            println!("{}", "Branch name cannot be empty!".yellow());
            continue;
        }

        debug!("validating branch '{candidate}'");
        match legacy.branch(group, name, candidate).await {
            Ok(branch) => {
                println!("{} branch '{}' found", "✓".green(), branch.name.cyan());
                return Ok(branch.name);
            }
            Err(ChartpinError::BranchNotFound { branch, .. }) => {
                println!(
                    "{}",
                    format!("Branch '{branch}' was not found, check the name for typos.").yellow()
                );
            }
            Err(e) => return Err(e),
        }
    }
}
