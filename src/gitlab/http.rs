//! Resilient HTTP layer for GitLab reads.
//!
//! Every request goes through [`HttpClient`], which enforces the three rules
//! all operations share:
//! - the URI is validated before anything touches the network, and a
//!   malformed URI fails without a single request being sent
//! - transient failures (connection errors and a fixed set of server status
//!   codes) are retried with exponential backoff
//! - definitive answers, 404 in particular, are returned immediately
//!
//! The retry schedule starts at 100ms, doubles per attempt, and is capped at
//! [`MAX_BACKOFF_DELAY`](crate::constants::MAX_BACKOFF_DELAY).

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use regex::Regex;
use tokio_retry::Retry;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

use crate::constants::{
    BACKOFF_EXPONENT_BASE, BACKOFF_FACTOR_MS, HTTP_TIMEOUT, MAX_BACKOFF_DELAY, MAX_RETRIES,
    RETRY_STATUS_CODES,
};
use crate::core::{ChartpinError, Result};

/// Scheme, optional `www.`, a dotted host, then a remainder of plain URL
/// characters running to the end of the string. Deliberately permissive;
/// its job is to catch obviously broken URIs before they waste a network
/// round trip.
const URI_PATTERN: &str = r"^https?://(?:www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b(?:[-a-zA-Z0-9()@:%_+.~#?&/=]*)$";

fn uri_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(URI_PATTERN).unwrap())
}

/// Check a URI against the validation pattern without sending anything.
#[must_use]
pub fn is_valid_uri(uri: &str) -> bool {
    uri_regex().is_match(uri)
}

enum RetryFailure {
    Status(u16),
    Transport(String),
}

/// HTTP client shared by every GitLab operation.
///
/// Wraps a [`reqwest::Client`] and applies the validation, timeout, and
/// retry rules described in the module documentation. Cloning is cheap; the
/// underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_retries: usize,
}

impl HttpClient {
    /// Create a client with the default retry budget.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            max_retries: MAX_RETRIES,
        }
    }

    /// Create a client with a custom retry budget. Used by tests to keep
    /// failure cases fast.
    #[must_use]
    pub fn with_max_retries(max_retries: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            max_retries,
        }
    }

    /// Send a GET request, retrying transient failures.
    ///
    /// Returns the final [`reqwest::Response`] whatever its status code, as
    /// long as the status is not one of the retryable ones. Callers that can
    /// only work with 200 should use [`request_ok`](Self::request_ok);
    /// callers that need to distinguish 404 (branch probing) inspect the
    /// status themselves.
    ///
    /// # Errors
    ///
    /// Returns [`ChartpinError::InvalidUri`] when the URI fails validation
    /// (nothing is sent in that case) and [`ChartpinError::RequestFailed`]
    /// when the retry budget is exhausted.
    pub async fn request(&self, uri: &str, operation: &str) -> Result<reqwest::Response> {
        if !is_valid_uri(uri) {
            warn!("refusing to dispatch malformed URI for {operation}: {uri}");
            return Err(ChartpinError::InvalidUri {
                operation: operation.to_string(),
                uri: uri.to_string(),
            });
        }

        let strategy = ExponentialBackoff::from_millis(BACKOFF_EXPONENT_BASE)
            .factor(BACKOFF_FACTOR_MS)
            .max_delay(MAX_BACKOFF_DELAY)
            .take(self.max_retries);

        let attempt = AtomicUsize::new(0);
        Retry::spawn(strategy, || {
            let attempt = attempt.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                debug!("GET {uri} ({operation}, attempt {attempt})");
                match self.client.get(uri).timeout(HTTP_TIMEOUT).send().await {
                    Ok(response) => {
                        let status = response.status().as_u16();
                        if RETRY_STATUS_CODES.contains(&status) {
                            warn!("GET {uri} answered {status}, will retry");
                            Err(RetryFailure::Status(status))
                        } else {
                            Ok(response)
                        }
                    }
                    Err(e) => {
                        warn!("GET {uri} failed in transport: {e}");
                        Err(RetryFailure::Transport(e.to_string()))
                    }
                }
            }
        })
        .await
        .map_err(|failure| {
            let reason = match failure {
                RetryFailure::Status(status) => {
                    format!("giving up after repeated HTTP {status} responses")
                }
                RetryFailure::Transport(message) => message,
            };
            warn!("GET {uri} abandoned: {reason}");
            ChartpinError::RequestFailed {
                operation: operation.to_string(),
                uri: uri.to_string(),
                reason,
            }
        })
    }

    /// Send a GET request and require a 200 response.
    ///
    /// # Errors
    ///
    /// Everything [`request`](Self::request) can return, plus
    /// [`ChartpinError::FetchFailed`] for any non-200 final status.
    pub async fn request_ok(&self, uri: &str, operation: &str) -> Result<reqwest::Response> {
        let response = self.request(uri, operation).await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!("{operation}: {uri} answered {status}");
            return Err(ChartpinError::FetchFailed {
                operation: operation.to_string(),
                status: status.as_u16(),
                uri: uri.to_string(),
            });
        }
        Ok(response)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}
