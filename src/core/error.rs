//! Error types and user-friendly error handling for chartpin.
//!
//! This module defines the error taxonomy used across the codebase and the
//! machinery that turns internal errors into actionable messages for users.
//! Internal code propagates [`ChartpinError`] (or wraps it in
//! [`anyhow::Error`] for context chaining); the binary converts whatever
//! reaches `main` into an [`ErrorContext`] with a suggestion before printing.
//!
//! # Error Flow
//!
//! 1. An operation fails and produces a [`ChartpinError`]
//! 2. Callers add context while propagating with `?`
//! 3. [`user_friendly_error`] converts the final error into an [`ErrorContext`]
//! 4. [`ErrorContext::display`] prints a colored report to stderr
//!
//! # Examples
//!
//! ```
//! use chartpin_cli::core::{ChartpinError, user_friendly_error};
//!
//! let error = ChartpinError::BranchNotFound {
//!     branch: "release-9.2".to_string(),
//!     instance: "legacy".to_string(),
//! };
//! let context = user_friendly_error(error.into());
//! assert!(context.suggestion.is_some());
//! ```

use colored::Colorize;
use thiserror::Error;

/// Error type covering every failure chartpin knows how to report.
///
/// Variants are grouped by pipeline stage: request validation and transport,
/// GitLab lookups, tag resolution, and manifest handling. Wrapped external
/// errors (`IoError`, `YamlError`, `JsonError`) use `#[from]` so `?` converts
/// them automatically.
#[derive(Error, Debug)]
pub enum ChartpinError {
    /// A request URI failed validation and was never dispatched.
    #[error("Invalid request URI for {operation}: {uri}")]
    InvalidUri {
        /// Operation that produced the URI
        operation: String,
        /// The rejected URI
        uri: String,
    },

    /// A request kept failing after every retry was spent.
    #[error("Request failed during {operation}: {reason}")]
    RequestFailed {
        /// Operation the request belonged to
        operation: String,
        /// Requested URI
        uri: String,
        /// Last observed failure
        reason: String,
    },

    /// The server answered with a status the operation cannot work with.
    #[error("Unexpected response during {operation}: HTTP {status}")]
    FetchFailed {
        /// Operation the request belonged to
        operation: String,
        /// Status code of the final response
        status: u16,
        /// Requested URI
        uri: String,
    },

    /// A named group, subgroup, or project was missing from a listing.
    #[error("Could not find '{name}' while trying to {operation}")]
    ElementNotFound {
        /// Lookup that came up empty
        operation: String,
        /// Name that was searched for
        name: String,
    },

    /// The target branch does not exist in the deployment project.
    #[error("Branch '{branch}' not found on the {instance} instance")]
    BranchNotFound {
        /// Requested branch name
        branch: String,
        /// Instance label, e.g. "legacy"
        instance: String,
    },

    /// A tag set could not be reduced to a single release tag.
    #[error("Cannot pick a single release from tags {tags:?}")]
    TagResolution {
        /// The ambiguous tag names
        tags: Vec<String>,
    },

    /// The dependency manifest did not match the expected schema.
    #[error("Invalid manifest syntax in {file}")]
    ManifestParse {
        /// File that failed to parse
        file: String,
        /// Parser diagnostic
        reason: String,
    },

    /// File system operation failed.
    #[error("File system error during {operation}: {path}")]
    FileSystemError {
        /// Operation that failed
        operation: String,
        /// Affected path
        path: String,
    },

    /// Permission denied accessing a file or directory.
    #[error("Permission denied: {operation} on {path}")]
    PermissionDenied {
        /// Operation that was denied
        operation: String,
        /// Affected path
        path: String,
    },

    /// The user aborted the run at an interactive prompt.
    #[error("Execution cancelled by user")]
    Cancelled,

    /// IO operation error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Catch-all for errors without a dedicated variant.
    #[error("{message}")]
    Other {
        /// Error description
        message: String,
    },
}

/// Manual Clone implementation.
///
/// The wrapped external error types are not cloneable, so those variants
/// degrade to [`ChartpinError::Other`] carrying the formatted message.
impl Clone for ChartpinError {
    fn clone(&self) -> Self {
        match self {
            Self::InvalidUri { operation, uri } => Self::InvalidUri {
                operation: operation.clone(),
                uri: uri.clone(),
            },
            Self::RequestFailed {
                operation,
                uri,
                reason,
            } => Self::RequestFailed {
                operation: operation.clone(),
                uri: uri.clone(),
                reason: reason.clone(),
            },
            Self::FetchFailed {
                operation,
                status,
                uri,
            } => Self::FetchFailed {
                operation: operation.clone(),
                status: *status,
                uri: uri.clone(),
            },
            Self::ElementNotFound { operation, name } => Self::ElementNotFound {
                operation: operation.clone(),
                name: name.clone(),
            },
            Self::BranchNotFound { branch, instance } => Self::BranchNotFound {
                branch: branch.clone(),
                instance: instance.clone(),
            },
            Self::TagResolution { tags } => Self::TagResolution { tags: tags.clone() },
            Self::ManifestParse { file, reason } => Self::ManifestParse {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::FileSystemError { operation, path } => Self::FileSystemError {
                operation: operation.clone(),
                path: path.clone(),
            },
            Self::PermissionDenied { operation, path } => Self::PermissionDenied {
                operation: operation.clone(),
                path: path.clone(),
            },
            Self::Cancelled => Self::Cancelled,
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::YamlError(e) => Self::Other {
                message: format!("YAML parsing error: {e}"),
            },
            Self::JsonError(e) => Self::Other {
                message: format!("JSON parsing error: {e}"),
            },
            Self::Other { message } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// An error bundled with a suggestion and optional details for display.
///
/// # Examples
///
/// ```
/// use chartpin_cli::core::{ChartpinError, ErrorContext};
///
/// let context = ErrorContext::new(ChartpinError::Cancelled)
///     .with_suggestion("Run the command again when ready");
/// assert_eq!(context.suggestion.as_deref(), Some("Run the command again when ready"));
/// ```
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ChartpinError,
    /// Actionable advice for resolving the problem
    pub suggestion: Option<String>,
    /// Additional detail worth showing below the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    #[must_use]
    pub const fn new(error: ChartpinError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion shown in green below the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach extra details shown in yellow below the error.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details, and suggestion to stderr with colors.
    pub fn display(&self) {
        eprintln!("{} {}", "Error:".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("  {} {}", "Details:".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("  {} {}", "Suggestion:".green(), suggestion);
        }
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorContext {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Convert any error reaching `main` into a displayable [`ErrorContext`].
///
/// Known [`ChartpinError`] values get tailored suggestions via
/// [`create_error_context`]. IO and YAML errors found in the chain are mapped
/// to their dedicated variants first. Anything else becomes a generic context
/// around [`ChartpinError::Other`].
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(chartpin_error) = error.downcast_ref::<ChartpinError>() {
        return create_error_context(chartpin_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let context_message = error.to_string();
        return match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                ErrorContext::new(ChartpinError::PermissionDenied {
                    operation: "file access".to_string(),
                    path: context_message,
                })
                .with_suggestion(
                    "Check file permissions, or run from a directory you can write to",
                )
            }
            std::io::ErrorKind::NotFound => ErrorContext::new(ChartpinError::FileSystemError {
                operation: "file access".to_string(),
                path: context_message,
            })
            .with_suggestion("Check that the path exists and is spelled correctly"),
            _ => ErrorContext::new(ChartpinError::Other {
                message: format!("IO error: {io_error}"),
            }),
        };
    }

    if let Some(yaml_error) = error.downcast_ref::<serde_yaml::Error>() {
        return ErrorContext::new(ChartpinError::ManifestParse {
            file: crate::constants::MANIFEST_FILE.to_string(),
            reason: yaml_error.to_string(),
        })
        .with_suggestion("Fix the YAML syntax errors shown above and re-run");
    }

    ErrorContext::new(ChartpinError::Other {
        message: error.to_string(),
    })
}

/// Build an [`ErrorContext`] with a suggestion tailored to the error variant.
#[must_use]
pub fn create_error_context(error: ChartpinError) -> ErrorContext {
    match &error {
        ChartpinError::InvalidUri { .. } => ErrorContext::new(error.clone())
            .with_suggestion(
                "Check the base URLs given via --central-url and --legacy-url for typos",
            )
            .with_details("The URI was rejected before any request was sent"),

        ChartpinError::RequestFailed { uri, .. } => {
            let details = format!("Requested URI: {uri}");
            ErrorContext::new(error.clone())
                .with_suggestion(
                    "Check your network connection and that the GitLab instance is reachable. \
                     Transient server errors are already retried automatically",
                )
                .with_details(details)
        }

        ChartpinError::FetchFailed { status, uri, .. } => {
            let suggestion = if *status == 404 {
                "Check that the group, project, branch, and file paths exist on the instance"
            } else {
                "Check the GitLab instance health and your access to it"
            };
            ErrorContext::new(error.clone())
                .with_suggestion(suggestion)
                .with_details(format!("Requested URI: {uri}"))
        }

        ChartpinError::ElementNotFound { .. } => ErrorContext::new(error.clone()).with_suggestion(
            "Verify the --group and --subgroup names exist on the central instance",
        ),

        ChartpinError::BranchNotFound { branch, .. } => {
            ErrorContext::new(error.clone()).with_suggestion(format!(
                "Check '{branch}' for typos, or omit --branch to pick the branch interactively"
            ))
        }

        ChartpinError::TagResolution { tags } => ErrorContext::new(error.clone())
            .with_suggestion(
                "Inspect the listed tags and remove stale ones, or re-run with --deep-search \
                 to fetch the full tag history",
            )
            .with_details(format!(
                "A chart resolves cleanly with one matching tag, or with exactly two where one \
                 is the v-prefixed duplicate of the other. Found: {tags:?}"
            )),

        ChartpinError::ManifestParse { reason, .. } => ErrorContext::new(error.clone())
            .with_suggestion(
                "Fix the manifest so it contains a flat `dependencies` list with \
                 name/version/repository entries",
            )
            .with_details(reason.clone()),

        ChartpinError::PermissionDenied { path, .. } => {
            let suggestion = if cfg!(windows) {
                format!("Check the permissions of '{path}' in file Properties > Security")
            } else {
                format!("Check the permissions of '{path}' (try `ls -la` and `chmod`)")
            };
            ErrorContext::new(error.clone()).with_suggestion(suggestion)
        }

        ChartpinError::Cancelled => ErrorContext::new(error.clone())
            .with_suggestion("Run the command again when you are ready to pick a branch"),

        _ => ErrorContext::new(error.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ChartpinError::BranchNotFound {
            branch: "release-9.2".to_string(),
            instance: "legacy".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Branch 'release-9.2' not found on the legacy instance"
        );

        let error = ChartpinError::InvalidUri {
            operation: "fetch tags".to_string(),
            uri: "not-a-uri".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid request URI for fetch tags: not-a-uri"
        );

        let error = ChartpinError::TagResolution {
            tags: vec!["1.0.0".to_string(), "2.0.0".to_string()],
        };
        assert!(error.to_string().contains("1.0.0"));
        assert!(error.to_string().contains("2.0.0"));
    }

    #[test]
    fn test_error_context_builder() {
        let context = ErrorContext::new(ChartpinError::Cancelled)
            .with_suggestion("try again")
            .with_details("stdin closed");

        assert_eq!(context.suggestion.as_deref(), Some("try again"));
        assert_eq!(context.details.as_deref(), Some("stdin closed"));

        let rendered = context.to_string();
        assert!(rendered.contains("Execution cancelled by user"));
        assert!(rendered.contains("Suggestion: try again"));
        assert!(rendered.contains("Details: stdin closed"));
    }

    #[test]
    fn test_create_error_context_suggestions() {
        let context = create_error_context(ChartpinError::FetchFailed {
            operation: "fetch manifest".to_string(),
            status: 404,
            uri: "https://gitlab.example.com/x".to_string(),
        });
        assert!(
            context
                .suggestion
                .as_deref()
                .is_some_and(|s| s.contains("exist"))
        );

        let context = create_error_context(ChartpinError::TagResolution {
            tags: vec![
                "1.0.0".to_string(),
                "1.1.0".to_string(),
                "1.2.0".to_string(),
            ],
        });
        assert!(
            context
                .suggestion
                .as_deref()
                .is_some_and(|s| s.contains("--deep-search"))
        );

        let context = create_error_context(ChartpinError::Other {
            message: "mystery".to_string(),
        });
        assert!(context.suggestion.is_none());
    }

    #[test]
    fn test_user_friendly_error_downcasting() {
        let error: anyhow::Error = ChartpinError::BranchNotFound {
            branch: "featre-1".to_string(),
            instance: "legacy".to_string(),
        }
        .into();
        let context = user_friendly_error(error);
        assert!(matches!(
            context.error,
            ChartpinError::BranchNotFound { .. }
        ));
        assert!(
            context
                .suggestion
                .as_deref()
                .is_some_and(|s| s.contains("featre-1"))
        );

        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let context = user_friendly_error(anyhow::Error::from(io_error));
        assert!(matches!(
            context.error,
            ChartpinError::PermissionDenied { .. }
        ));

        let context = user_friendly_error(anyhow::anyhow!("something else"));
        assert!(matches!(context.error, ChartpinError::Other { .. }));
    }

    #[test]
    fn test_clone_degrades_wrapped_errors() {
        let error =
            ChartpinError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let cloned = error.clone();
        assert!(matches!(cloned, ChartpinError::Other { .. }));
        assert!(cloned.to_string().contains("gone"));

        let error = ChartpinError::Cancelled;
        assert!(matches!(error.clone(), ChartpinError::Cancelled));
    }
}
