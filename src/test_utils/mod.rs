//! Test utilities for chartpin
//!
//! Helpers shared by unit and integration tests: logging setup, manifest
//! fixtures, and per-test working directories. Tests isolate themselves by
//! giving every run its own temporary directory and mock server, so no
//! state leaks between them.

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Installs a test-writer subscriber once per process, regardless of how
/// many times it is called. Respects the `RUST_LOG` environment variable
/// when no explicit level is given.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_ansi(true)
            .try_init();
    });
}

/// Create a temporary working directory for one test run.
///
/// The directory is removed when the returned guard drops.
#[must_use]
pub fn temp_workdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("failed to create temporary workdir")
}

/// Build manifest text from `(name, version)` pairs, all pointing at the
/// same chart repository.
#[must_use]
pub fn manifest_text(entries: &[(&str, &str)]) -> String {
    let mut text = String::from("dependencies:\n");
    for (name, version) in entries {
        text.push_str(&format!(
            "  - name: {name}\n    version: {version}\n    repository: https://charts.example.net/stable\n"
        ));
    }
    text
}

/// A manifest in the shape real deployments use: comments, a patched
/// build, an aliased chart, and an optional field.
#[must_use]
pub fn sample_manifest() -> String {
    "\
# Umbrella chart dependencies
dependencies:
  - name: database
    version: 9.1.0-ntas
    repository: https://charts.example.net/stable
# analytics stack
  - name: anomaly-detector
    version: 9.1.0
    repository: https://charts.example.net/stable
    condition: tags.analytics
  - name: cache
    version: 8.0.2
    repository: https://charts.example.net/stable
"
    .to_string()
}
