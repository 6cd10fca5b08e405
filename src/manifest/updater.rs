//! Applying resolved release tags to the dependency manifest.
//!
//! The names used by chart repositories and the names used inside the
//! manifest differ in two systematic ways, both handled here:
//!
//! - repositories carry a `helm-` prefix (`helm-database` publishes the
//!   `database` chart), stripped when building the lookup table
//! - a handful of charts are published under a different name than their
//!   repository; those pairs live in [`CHART_ALIASES`]
//!
//! Overrides are applied best-effort. A chart whose tag set does not reduce
//! to a single release keeps its current version and ends up in the
//! returned [`FailedOverrides`] map; the rest of the manifest is still
//! updated and written.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::constants::{CHART_PROJECT_PREFIX, VERSION_SUFFIX};
use crate::manifest::Manifest;
use crate::resolver::{BranchTags, canonical_tag};

/// Manifest dependency name on the left, chart name on the right, for
/// charts published under a name that differs from their repository.
pub const CHART_ALIASES: &[(&str, &str)] = &[("anomaly-detector", "anomaly")];

/// Charts whose override could not be applied, with the tag sets that
/// refused to reduce. Keyed by chart name; ordered for stable reporting.
pub type FailedOverrides = BTreeMap<String, Vec<String>>;

/// Strip the repository prefix off a project name to get the chart name.
fn chart_name(project_name: &str) -> &str {
    project_name
        .strip_prefix(CHART_PROJECT_PREFIX)
        .unwrap_or(project_name)
}

/// Map a manifest dependency name to the chart name its releases are
/// published under.
fn release_source(dependency_name: &str) -> &str {
    CHART_ALIASES
        .iter()
        .find(|(manifest_name, _)| *manifest_name == dependency_name)
        .map_or(dependency_name, |(_, chart)| chart)
}

/// Carry the local patch marker over from the replaced version.
///
/// A current version of the form `X-ntas` means the deployment runs a
/// locally patched build of that chart, and the replacement tag must keep
/// selecting one, so the suffix is appended to the new tag as well.
fn with_suffix_of(tag: &str, current_version: &str) -> String {
    if current_version.split('-').nth(1) == Some(VERSION_SUFFIX) {
        format!("{tag}-{VERSION_SUFFIX}")
    } else {
        tag.to_string()
    }
}

impl Manifest {
    /// Overwrite dependency versions with the resolved release tags.
    ///
    /// Builds a chart-name lookup from `resolved`, then walks the
    /// dependency list once. Entries are removed from the lookup as their
    /// override lands; whatever remains afterwards, whether unresolvable
    /// tag sets or charts with no manifest entry, is returned for
    /// reporting. No failure aborts the walk.
    pub fn apply(&mut self, resolved: &[BranchTags]) -> FailedOverrides {
        let mut pending: FailedOverrides = resolved
            .iter()
            .map(|set| (chart_name(&set.project.name).to_string(), set.tags.clone()))
            .collect();

        for dep in &mut self.dependencies {
            let key = release_source(&dep.name).to_string();
            let Some(tags) = pending.get(&key) else {
                continue;
            };

            match canonical_tag(tags) {
                Ok(tag) => {
                    let next = with_suffix_of(&tag, &dep.version);
                    if dep.version == next {
                        info!("'{}' already pinned to {next}", dep.name);
                    } else {
                        info!("pinning '{}' {} -> {next}", dep.name, dep.version);
                    }
                    dep.version = next;
                    pending.remove(&key);
                }
                Err(e) => {
                    warn!("leaving '{}' at {}: {e}", dep.name, dep.version);
                }
            }
        }

        for (chart, tags) in &pending {
            warn!("override for '{chart}' was not applied (tags: {tags:?})");
        }
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::Project;

    fn manifest(entries: &[(&str, &str)]) -> Manifest {
        let mut text = String::from("dependencies:\n");
        for (name, version) in entries {
            text.push_str(&format!(
                "  - name: {name}\n    version: {version}\n    repository: https://charts.example.net/stable\n"
            ));
        }
        Manifest::parse(&text).unwrap()
    }

    fn resolved(project_name: &str, tags: &[&str]) -> BranchTags {
        BranchTags {
            project: Project {
                id: 1,
                name: project_name.to_string(),
            },
            tags: tags.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn project_prefix_is_stripped_when_matching_dependencies() {
        let mut m = manifest(&[("database", "9.1.0")]);
        let failed = m.apply(&[resolved("helm-database", &["9.2.0"])]);

        assert!(failed.is_empty());
        assert_eq!(m.dependencies[0].version, "9.2.0");
    }

    #[test]
    fn aliased_charts_pick_up_their_release_source() {
        let mut m = manifest(&[("anomaly-detector", "9.1.0")]);
        let failed = m.apply(&[resolved("helm-anomaly", &["9.2.0"])]);

        assert!(failed.is_empty());
        assert_eq!(m.dependencies[0].version, "9.2.0");
    }

    #[test]
    fn patched_builds_keep_their_suffix() {
        let mut m = manifest(&[("database", "9.1.0-ntas"), ("cache", "8.0.2")]);
        let failed = m.apply(&[
            resolved("helm-database", &["9.2.0"]),
            resolved("helm-cache", &["8.1.0"]),
        ]);

        assert!(failed.is_empty());
        assert_eq!(m.dependencies[0].version, "9.2.0-ntas");
        assert_eq!(m.dependencies[1].version, "8.1.0");
    }

    #[test]
    fn suffix_detection_tolerates_versions_without_a_hyphen() {
        assert_eq!(with_suffix_of("9.2.0", "9.1.0"), "9.2.0");
        assert_eq!(with_suffix_of("9.2.0", "9.1.0-ntas"), "9.2.0-ntas");
        assert_eq!(with_suffix_of("9.2.0", "9.1.0-rc1"), "9.2.0");
        assert_eq!(with_suffix_of("9.2.0", ""), "9.2.0");
    }

    #[test]
    fn unresolvable_tag_sets_leave_the_version_and_are_reported() {
        let mut m = manifest(&[("database", "9.1.0"), ("cache", "8.0.2")]);
        let failed = m.apply(&[
            resolved("helm-database", &["9.2.0"]),
            resolved("helm-cache", &["8.1.0", "8.1.1", "8.1.2"]),
        ]);

        assert_eq!(m.dependencies[0].version, "9.2.0");
        assert_eq!(m.dependencies[1].version, "8.0.2");
        assert_eq!(failed.len(), 1);
        assert_eq!(
            failed.get("cache").map(Vec::len),
            Some(3),
            "the ambiguous tag set should be reported as-is"
        );
    }

    #[test]
    fn charts_without_a_manifest_entry_are_reported() {
        let mut m = manifest(&[("database", "9.1.0")]);
        let failed = m.apply(&[
            resolved("helm-database", &["9.2.0"]),
            resolved("helm-orphan", &["1.0.0"]),
        ]);

        assert_eq!(failed.len(), 1);
        assert!(failed.contains_key("orphan"));
    }

    #[test]
    fn dependencies_without_a_resolved_tag_are_untouched_and_unreported() {
        let mut m = manifest(&[("database", "9.1.0"), ("gateway", "5.5.0")]);
        let failed = m.apply(&[resolved("helm-database", &["9.2.0"])]);

        assert!(failed.is_empty());
        assert_eq!(m.dependencies[1].version, "5.5.0");
    }

    #[test]
    fn v_prefixed_duplicates_resolve_to_the_bare_tag() {
        let mut m = manifest(&[("database", "9.1.0")]);
        let failed = m.apply(&[resolved("helm-database", &["v9.2.0", "9.2.0"])]);

        assert!(failed.is_empty());
        assert_eq!(m.dependencies[0].version, "9.2.0");
    }

    #[test]
    fn applying_the_same_overrides_twice_changes_nothing() {
        let mut m = manifest(&[("database", "9.1.0-ntas"), ("anomaly-detector", "9.1.0")]);
        let overrides = vec![
            resolved("helm-database", &["9.2.0"]),
            resolved("helm-anomaly", &["9.2.0"]),
        ];

        let first = m.apply(&overrides);
        assert!(first.is_empty());
        let after_first = m.clone();

        let second = m.apply(&overrides);
        assert!(second.is_empty());
        assert_eq!(m, after_first);
        assert_eq!(m.dependencies[0].version, "9.2.0-ntas");
    }

    #[test]
    fn empty_override_set_reports_nothing() {
        let mut m = manifest(&[("database", "9.1.0")]);
        let failed = m.apply(&[]);
        assert!(failed.is_empty());
        assert_eq!(m.dependencies[0].version, "9.1.0");
    }
}
