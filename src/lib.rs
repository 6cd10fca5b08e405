//! chartpin - pin Helm sub-chart versions to a branch's release tags
//!
//! chartpin automates one recurring release chore: rewriting the umbrella
//! chart's `requirements.yaml` so that every sub-chart is pinned to the
//! release tag that was cut from a chosen branch.
//!
//! # How a Run Works
//!
//! 1. The target branch is validated against the deployment project on the
//!    legacy GitLab instance (or picked interactively)
//! 2. The umbrella chart's `requirements.yaml` is downloaded from that
//!    branch
//! 3. Chart projects are discovered under the charts subgroup of the
//!    central GitLab instance, and their tags are fetched
//! 4. Tags whose commit title starts with the branch name are kept and
//!    reduced to one canonical release tag per chart
//! 5. The manifest is rewritten with the new versions; comment lines and
//!    local patch suffixes survive, and the previous file is kept as
//!    `old.yaml`
//!
//! Charts whose tag set cannot be reduced are left untouched and reported,
//! with the process exit code signalling the partial result.
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line interface and the update pipeline
//! - [`gitlab`] - Read-only GitLab API client with retries and pagination
//! - [`resolver`] - Branch-to-tag matching and canonical tag selection
//! - [`manifest`] - `requirements.yaml` parsing, rewriting, and comment
//!   preservation
//! - [`core`] - Error taxonomy and user-facing error contexts
//! - [`logging`] - Per-run `execution.log` and `err.log` files
//! - [`utils`] - File helpers and progress indicators
//!
//! # Example
//!
//! ```bash
//! # Pin everything to the release tags of branch release-9.2
//! chartpin update --branch release-9.2
//!
//! # Interactive branch selection, full tag history walk
//! chartpin update --deep-search
//! ```

pub mod cli;
pub mod constants;
pub mod core;
pub mod gitlab;
pub mod logging;
pub mod manifest;
pub mod resolver;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
