//! Global constants used throughout the chartpin codebase.
//!
//! This module centralizes naming and tuning values that are referenced across
//! multiple modules. Instance-specific values (base URLs, group and project
//! names) are defaults only; every one of them can be overridden on the
//! command line.

use std::time::Duration;

/// Base URL of the central GitLab instance that hosts the chart projects.
pub const CENTRAL_BASE_URL: &str = "https://gitlab.central.example.com";

/// Base URL of the legacy GitLab instance that hosts the deployment project.
pub const LEGACY_BASE_URL: &str = "https://gitlab.legacy.example.com";

/// Group on the central instance that owns the charts subgroup.
pub const CHART_GROUP: &str = "ntas";

/// Subgroup holding the individual sub-chart projects.
pub const CHART_SUBGROUP: &str = "helm";

/// Deployment project, as `group/name`, on the legacy instance.
pub const DEPLOY_PROJECT: &str = "tas/kubernetes";

/// Directory of the umbrella chart inside the deployment project.
pub const CHART_DIR: &str = "helm/ntas";

/// Umbrella chart dependency manifest.
pub const MANIFEST_FILE: &str = "requirements.yaml";

/// Name under which the previous manifest is kept after an update.
pub const MANIFEST_BACKUP_FILE: &str = "old.yaml";

/// Full trace of a run, written at debug verbosity.
pub const EXECUTION_LOG_FILE: &str = "execution.log";

/// Warnings and errors only, for quick triage.
pub const ERROR_LOG_FILE: &str = "err.log";

/// Prefix shared by chart repositories on the central instance.
pub const CHART_PROJECT_PREFIX: &str = "helm-";

/// Version suffix that marks a locally patched chart release.
///
/// When the current manifest version carries this suffix (for example
/// `9.1.0-ntas`), the replacement tag gets the same suffix appended so the
/// patched build keeps being selected.
pub const VERSION_SUFFIX: &str = "ntas";

/// Page size requested from GitLab list endpoints.
pub const PER_PAGE: u32 = 50;

/// Timeout applied to every individual HTTP request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of times a request is retried after a retryable failure.
pub const MAX_RETRIES: usize = 10;

/// HTTP status codes that are worth retrying.
///
/// Everything else, notably 404, is treated as a definitive answer from the
/// server and returned immediately.
pub const RETRY_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Exponent base of the retry backoff. Each retry doubles the previous delay.
pub const BACKOFF_EXPONENT_BASE: u64 = 2;

/// Multiplier applied to the backoff exponent, in milliseconds.
///
/// Together with [`BACKOFF_EXPONENT_BASE`] this yields delays of 100ms,
/// 200ms, 400ms and so on.
pub const BACKOFF_FACTOR_MS: u64 = 50;

/// Ceiling for a single retry delay.
pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(5);
