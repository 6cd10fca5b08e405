//! Pin sub-chart versions to the release tags of a target branch.
//!
//! This module provides the `update` command, the heart of chartpin. One
//! run walks the full pipeline:
//!
//! 1. Clear the artifacts of the previous run and open fresh log files
//! 2. Resolve the target branch on the legacy instance, interactively when
//!    no `--branch` was given
//! 3. Download the umbrella chart's `requirements.yaml` from that branch
//! 4. Walk the chart projects of the central instance and fetch their tags
//! 5. Keep the tags cut from the target branch and reduce each chart's set
//!    to its canonical release tag
//! 6. Rewrite the manifest with the new versions, keeping the previous
//!    file as `old.yaml`
//!
//! Charts whose tag set cannot be reduced keep their current version; the
//! command reports them at the end and signals the partial result through
//! its exit code.
//!
//! # Examples
//!
//! Interactive run in the current directory:
//! ```bash
//! chartpin update
//! ```
//!
//! Scripted run against a known branch, walking the full tag history:
//! ```bash
//! chartpin update --branch release-9.2 --deep-search --workdir ./out
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::cli::branch::resolve_target_branch;
use crate::constants::{
    CENTRAL_BASE_URL, CHART_DIR, CHART_GROUP, CHART_SUBGROUP, DEPLOY_PROJECT, ERROR_LOG_FILE,
    EXECUTION_LOG_FILE, LEGACY_BASE_URL, MANIFEST_BACKUP_FILE, MANIFEST_FILE,
};
use crate::gitlab::GitlabClient;
use crate::logging;
use crate::manifest::{FailedOverrides, Manifest};
use crate::resolver::related_to_branch;
use crate::utils::fs::{ensure_dir, remove_file_if_present, write_text_file};
use crate::utils::progress::{ProgressBar, spinner_with_message};

/// How a completed run ended.
///
/// Fatal errors do not get a variant; they propagate as errors and the
/// binary maps them to exit code 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every override was applied
    Success,
    /// The manifest was written, but some charts kept their old version
    PartialFailure,
}

impl RunOutcome {
    /// Process exit code for this outcome.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::PartialFailure => 2,
        }
    }
}

/// Command to pin sub-chart versions to a branch's release tags.
#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Target branch whose release tags should be pinned (prompts when omitted)
    #[arg(short, long)]
    branch: Option<String>,

    /// Walk the full tag history of every chart instead of the most recent page
    #[arg(short, long)]
    deep_search: bool,

    /// Directory receiving the manifest, its backup, and the log files
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Base URL of the central GitLab instance hosting the chart projects
    #[arg(long, env = "CHARTPIN_CENTRAL_URL", default_value = CENTRAL_BASE_URL)]
    central_url: String,

    /// Base URL of the legacy GitLab instance hosting the deployment project
    #[arg(long, env = "CHARTPIN_LEGACY_URL", default_value = LEGACY_BASE_URL)]
    legacy_url: String,

    /// Group on the central instance that owns the charts subgroup
    #[arg(long, default_value = CHART_GROUP)]
    group: String,

    /// Subgroup holding the individual chart projects
    #[arg(long, default_value = CHART_SUBGROUP)]
    subgroup: String,

    /// Deployment project on the legacy instance, as group/name
    #[arg(long, default_value = DEPLOY_PROJECT)]
    deploy_project: String,

    /// Directory of the umbrella chart inside the deployment project
    #[arg(long, default_value = CHART_DIR)]
    chart_dir: String,
}

impl UpdateCommand {
    /// Execute the update pipeline.
    ///
    /// Returns the outcome of a completed run; fatal failures surface as
    /// errors.
    ///
    /// # Errors
    ///
    /// Anything the pipeline stages can produce: request and lookup
    /// failures, a missing branch, manifest parse errors, and IO errors
    /// around the working directory.
    pub async fn execute(self) -> Result<RunOutcome> {
        prepare_workdir(&self.workdir)?;
        logging::init(&self.workdir)?;
        info!("starting update run in {}", self.workdir.display());

        let (deploy_group, deploy_name) = split_deploy_project(&self.deploy_project)?;
        let legacy = GitlabClient::new(&self.legacy_url, "legacy");
        let central = GitlabClient::new(&self.central_url, "central");

        let branch =
            resolve_target_branch(&legacy, deploy_group, deploy_name, self.branch.clone()).await?;
        println!("{} {}", "Target branch:".bold(), branch.cyan());

        let spinner = spinner_with_message(format!("Downloading {MANIFEST_FILE}"));
        let manifest_text = legacy
            .raw_file(&self.deploy_project, &branch, &self.chart_dir, MANIFEST_FILE)
            .await?;
        write_text_file(&self.workdir.join(MANIFEST_FILE), &manifest_text)?;
        spinner.finish_and_clear();
        println!(
            "{} downloaded {MANIFEST_FILE} from '{}'",
            "✓".green(),
            self.deploy_project
        );

        let spinner = spinner_with_message(format!(
            "Resolving subgroup '{}' of '{}'",
            self.subgroup, self.group
        ));
        let subgroup_id = central
            .subgroup_id(&self.group, &self.subgroup, &spinner)
            .await?;
        let projects = central.projects(subgroup_id, &spinner).await?;
        spinner.finish_and_clear();
        println!("{} found {} chart project(s)", "✓".green(), projects.len());

        let progress = ProgressBar::new(projects.len() as u64);
        progress.set_prefix("🔖");
        let tag_sets = central
            .project_tags(&projects, self.deep_search, &progress)
            .await?;
        progress.finish_and_clear();

        let related = related_to_branch(&tag_sets, &branch);
        println!(
            "{} {} chart(s) have tags cut from '{}'",
            "✓".green(),
            related.len(),
            branch
        );

        let mut manifest = Manifest::load(&self.workdir.join(MANIFEST_FILE))?;
        let failed = manifest.apply(&related);
        manifest.write(&self.workdir)?;

        Ok(self.report(&branch, related.len(), &failed))
    }

    fn report(&self, branch: &str, related: usize, failed: &FailedOverrides) -> RunOutcome {
        let manifest_path = self.workdir.join(MANIFEST_FILE);

        println!();
        if failed.is_empty() {
            if related == 0 {
                println!(
                    "{}",
                    format!("✅ No release tags found for '{branch}', manifest left as is")
                        .green()
                        .bold()
                );
            } else {
                println!(
                    "{}",
                    format!("✅ Pinned {related} sub-chart(s) to '{branch}' release tags")
                        .green()
                        .bold()
                );
            }
            println!("   Updated manifest: {}", manifest_path.display());
            RunOutcome::Success
        } else {
            println!(
                "{}",
                "⚠️  Some sub-charts could not be pinned".yellow().bold()
            );
            for (chart, tags) in failed {
                println!("   {} {}: {}", "→".yellow(), chart.bold(), tags.join(", "));
            }
            println!(
                "   The manifest was still written to {}; fix the listed charts by hand",
                manifest_path.display()
            );
            warn!("run finished with {} unapplied override(s)", failed.len());
            RunOutcome::PartialFailure
        }
    }
}

/// Remove the artifacts a previous run may have left in the directory.
fn prepare_workdir(workdir: &Path) -> Result<()> {
    ensure_dir(workdir)?;
    for name in [
        MANIFEST_FILE,
        MANIFEST_BACKUP_FILE,
        EXECUTION_LOG_FILE,
        ERROR_LOG_FILE,
    ] {
        remove_file_if_present(&workdir.join(name))?;
    }
    Ok(())
}

fn split_deploy_project(deploy_project: &str) -> Result<(&str, &str)> {
    deploy_project
        .split_once('/')
        .filter(|(group, name)| !group.is_empty() && !name.is_empty())
        .context("--deploy-project must be given as GROUP/NAME, e.g. tas/kubernetes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_project_splits_into_group_and_name() {
        assert_eq!(
            split_deploy_project("tas/kubernetes").unwrap(),
            ("tas", "kubernetes")
        );
        assert_eq!(
            split_deploy_project("ops/deploy/main").unwrap(),
            ("ops", "deploy/main")
        );
    }

    #[test]
    fn deploy_project_without_a_slash_is_rejected() {
        assert!(split_deploy_project("kubernetes").is_err());
        assert!(split_deploy_project("/kubernetes").is_err());
        assert!(split_deploy_project("tas/").is_err());
    }

    #[test]
    fn prepare_workdir_clears_previous_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = dir.path().to_path_buf();
        for name in [MANIFEST_FILE, MANIFEST_BACKUP_FILE, EXECUTION_LOG_FILE] {
            std::fs::write(workdir.join(name), "stale").unwrap();
        }
        std::fs::write(workdir.join("unrelated.txt"), "keep me").unwrap();

        prepare_workdir(&workdir).unwrap();

        assert!(!workdir.join(MANIFEST_FILE).exists());
        assert!(!workdir.join(MANIFEST_BACKUP_FILE).exists());
        assert!(!workdir.join(EXECUTION_LOG_FILE).exists());
        assert!(workdir.join("unrelated.txt").exists());
    }

    #[test]
    fn prepare_workdir_creates_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = dir.path().join("fresh");

        prepare_workdir(&workdir).unwrap();
        assert!(workdir.is_dir());
    }

    #[test]
    fn outcome_exit_codes() {
        assert_eq!(RunOutcome::Success.exit_code(), 0);
        assert_eq!(RunOutcome::PartialFailure.exit_code(), 2);
    }
}
