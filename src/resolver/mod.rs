//! Tag resolution: from raw tag listings to one release per chart.
//!
//! Release tags on the central instance are cut from branches, and the title
//! of the tagged commit starts with the name of that branch. That convention
//! is what ties a tag back to a branch, and it drives both steps here:
//!
//! 1. [`related_to_branch`] filters each project's tags down to the ones
//!    whose commit title starts with the target branch name
//! 2. [`canonical_tag`] reduces a filtered tag set to the single tag worth
//!    writing into the manifest
//!
//! A chart is considered cleanly resolvable when exactly one tag matches, or
//! when exactly two match and one is the `v`-prefixed duplicate of the other
//! (an artifact of a tagging scheme change; both names point at the same
//! release, and the bare one is the canonical spelling).

use tracing::{debug, warn};

use crate::core::{ChartpinError, Result};
use crate::gitlab::{Project, ProjectTags};

/// A project reduced to the tag names that belong to the target branch.
#[derive(Debug, Clone)]
pub struct BranchTags {
    /// The project the tags belong to
    pub project: Project,
    /// Tag names whose commit titles matched the branch
    pub tags: Vec<String>,
}

/// Keep, per project, the tags whose commit title starts with the branch
/// name. Matching is case-insensitive; projects with no matching tag are
/// dropped entirely.
#[must_use]
pub fn related_to_branch(sets: &[ProjectTags], branch: &str) -> Vec<BranchTags> {
    let keyword = branch.to_lowercase();

    sets.iter()
        .filter_map(|set| {
            let tags: Vec<String> = set
                .tags
                .iter()
                .filter(|tag| tag.title.to_lowercase().starts_with(&keyword))
                .map(|tag| tag.name.clone())
                .collect();

            if tags.is_empty() {
                None
            } else {
                debug!(
                    "project '{}' has {} tag(s) cut from '{branch}'",
                    set.project.name,
                    tags.len()
                );
                Some(BranchTags {
                    project: set.project.clone(),
                    tags,
                })
            }
        })
        .collect()
}

/// Reduce a matched tag set to its canonical release tag.
///
/// One tag resolves to itself. Two tags resolve only when exactly one of
/// them carries a leading `v` and stripping it reproduces the other tag,
/// in which case the bare name wins.
///
/// # Errors
///
/// [`ChartpinError::TagResolution`] for every other shape: zero tags, two
/// unrelated tags, a pair where neither or both carry the prefix, or more
/// than two. Those sets need a human decision.
pub fn canonical_tag(tags: &[String]) -> Result<String> {
    match tags {
        [only] => Ok(only.clone()),
        [first, second] => match (first.strip_prefix('v'), second.strip_prefix('v')) {
            (None, Some(stripped)) if stripped == first.as_str() => Ok(first.clone()),
            (Some(stripped), None) if stripped == second.as_str() => Ok(second.clone()),
            _ => {
                warn!("tag pair {first:?} / {second:?} is not a v-prefixed duplicate");
                Err(ChartpinError::TagResolution {
                    tags: tags.to_vec(),
                })
            }
        },
        _ => {
            warn!("expected at most two tags, found {}", tags.len());
            Err(ChartpinError::TagResolution {
                tags: tags.to_vec(),
            })
        }
    }
}
