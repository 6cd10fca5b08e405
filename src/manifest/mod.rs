//! Umbrella chart manifest parsing, rendering, and writing.
//!
//! This module handles `requirements.yaml`, the flat Helm dependency
//! manifest of the umbrella chart:
//!
//! ```yaml
//! # Umbrella chart dependencies
//! dependencies:
//!   - name: database
//!     version: 9.1.0-ntas
//!     repository: https://charts.example.net/stable
//!   - name: gateway
//!     version: 9.1.0
//!     repository: https://charts.example.net/stable
//!     condition: tags.edge
//! ```
//!
//! YAML parsing drops comments, but the comments in these manifests carry
//! operational notes that must survive an update. [`Manifest::parse`]
//! therefore runs a second pass over the raw text that records every
//! comment line together with its 1-based line number, and
//! [`Manifest::render`] replays them into the regenerated document at the
//! same line positions. For a manifest in the canonical layout (one
//! `key: value` per line, no blank lines) the round trip is byte-exact.
//!
//! Version overrides live in the [`updater`] submodule.

pub mod updater;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::{MANIFEST_BACKUP_FILE, MANIFEST_FILE};
use crate::core::ChartpinError;
use crate::utils::fs::write_text_file;

pub use updater::FailedOverrides;

/// One sub-chart entry of the dependency manifest.
///
/// `name`, `version`, and `repository` are required by Helm; the remaining
/// fields are optional and preserved verbatim when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dependency {
    /// Chart name as published in the repository
    pub name: String,
    /// Pinned chart version
    pub version: String,
    /// Chart repository URL
    pub repository: String,
    /// Name the chart is installed under, when it differs from `name`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Enablement condition evaluated by Helm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Free-form marker some charts carry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    dependencies: Vec<Dependency>,
}

/// A parsed manifest: the dependency list plus the comment lines of the
/// original document, keyed by their 1-based line numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Sub-chart dependencies in document order
    pub dependencies: Vec<Dependency>,
    /// Comment lines by original line number
    pub comments: BTreeMap<usize, String>,
}

impl Manifest {
    /// Parse manifest text.
    ///
    /// A comment line is a line whose first non-whitespace character is
    /// `#`; trailing comments on value lines belong to the value as far as
    /// the scan is concerned and are not recorded separately.
    ///
    /// # Errors
    ///
    /// [`ChartpinError::ManifestParse`] when the document is not valid YAML
    /// or does not consist of a flat `dependencies` list.
    pub fn parse(text: &str) -> Result<Self, ChartpinError> {
        let raw: RawManifest = serde_yaml::from_str(text).map_err(|e| {
            warn!("manifest does not parse: {e}");
            ChartpinError::ManifestParse {
                file: MANIFEST_FILE.to_string(),
                reason: e.to_string(),
            }
        })?;

        let comments = scan_comments(text);
        debug!(
            "parsed manifest with {} dependencies and {} comment line(s)",
            raw.dependencies.len(),
            comments.len()
        );

        Ok(Self {
            dependencies: raw.dependencies,
            comments,
        })
    }

    /// Load and parse the manifest at `path`.
    ///
    /// # Errors
    ///
    /// IO errors reading the file, or anything [`parse`](Self::parse)
    /// returns.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest file: {}", path.display()))?;
        Ok(Self::parse(&text)?)
    }

    /// Render the manifest back to YAML text with comments replayed at
    /// their recorded line positions.
    ///
    /// Emission walks a line counter: before every structural line, any
    /// comments recorded for the current position are flushed first. Runs
    /// of consecutive comment lines come out intact, and comments recorded
    /// after the last dependency are appended at the end.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut line: usize = 1;

        self.flush_comments_at(&mut out, &mut line);
        out.push_str("dependencies:\n");
        line += 1;

        for dep in &self.dependencies {
            self.emit_field(&mut out, &mut line, "  - name: ", &dep.name);
            self.emit_field(&mut out, &mut line, "    version: ", &dep.version);
            self.emit_field(&mut out, &mut line, "    repository: ", &dep.repository);
            if let Some(alias) = &dep.alias {
                self.emit_field(&mut out, &mut line, "    alias: ", alias);
            }
            if let Some(condition) = &dep.condition {
                self.emit_field(&mut out, &mut line, "    condition: ", condition);
            }
            if let Some(metadata) = &dep.metadata {
                self.emit_field(&mut out, &mut line, "    metadata: ", metadata);
            }
        }

        for comment in self.comments.range(line..).map(|(_, comment)| comment) {
            out.push_str(comment);
            out.push('\n');
        }

        out
    }

    /// Write the rendered manifest into `dir`, keeping the previous file.
    ///
    /// An existing `requirements.yaml` is renamed to `old.yaml` first, then
    /// the fresh render is written in its place.
    ///
    /// # Errors
    ///
    /// IO errors from the rename or the write.
    pub fn write(&self, dir: &Path) -> Result<()> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let backup_path = dir.join(MANIFEST_BACKUP_FILE);

        if manifest_path.exists() {
            std::fs::rename(&manifest_path, &backup_path).with_context(|| {
                format!(
                    "Failed to move previous manifest aside: {}",
                    backup_path.display()
                )
            })?;
            info!("kept previous manifest as {}", backup_path.display());
        }

        write_text_file(&manifest_path, &self.render())?;
        info!("wrote updated manifest to {}", manifest_path.display());
        Ok(())
    }

    fn flush_comments_at(&self, out: &mut String, line: &mut usize) {
        while let Some(comment) = self.comments.get(line) {
            out.push_str(comment);
            out.push('\n');
            *line += 1;
        }
    }

    fn emit_field(&self, out: &mut String, line: &mut usize, prefix: &str, value: &str) {
        self.flush_comments_at(out, line);
        out.push_str(prefix);
        out.push_str(value);
        out.push('\n');
        *line += 1;
    }
}

fn scan_comments(text: &str) -> BTreeMap<usize, String> {
    text.lines()
        .enumerate()
        .filter(|(_, content)| content.trim_start().starts_with('#'))
        .map(|(idx, content)| (idx + 1, content.to_string()))
        .collect()
}
