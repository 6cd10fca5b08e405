//! Sequential page walking for GitLab list endpoints.
//!
//! GitLab paginates list responses. The walker below requests page 1, 2, 3
//! and so on from a URI template containing a `{page}` placeholder until the
//! server returns an empty body or an empty JSON array. Shallow mode stops
//! after the first page, which is enough for endpoints sorted by recency.

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{ChartpinError, Result};
use crate::gitlab::http::HttpClient;
use crate::utils::progress::ProgressBar;

/// Fetch records from a paginated endpoint.
///
/// `template` must contain a `{page}` placeholder. With `deep` set, every
/// page is walked until the server runs out of records; otherwise only the
/// first page is fetched. The spinner message is refreshed with the current
/// page number so long walks stay visible.
///
/// # Errors
///
/// Propagates request failures from [`HttpClient::request_ok`] and
/// [`ChartpinError::JsonError`] when a page is not a JSON array.
pub async fn fetch_all_pages(
    http: &HttpClient,
    template: &str,
    operation: &str,
    deep: bool,
    progress: &ProgressBar,
) -> Result<Vec<Value>> {
    let mut records = Vec::new();
    let mut page: u32 = 1;

    loop {
        progress.set_message(format!("{operation} (page {page})"));
        let uri = template.replace("{page}", &page.to_string());
        let response = http.request_ok(&uri, operation).await?;
        let body = response.text().await.map_err(|e| {
            warn!("{operation}: could not read page {page} from {uri}: {e}");
            ChartpinError::RequestFailed {
                operation: operation.to_string(),
                uri: uri.clone(),
                reason: format!("could not read response body: {e}"),
            }
        })?;

        let trimmed = body.trim();
        if trimmed.is_empty() {
            break;
        }
        let mut batch: Vec<Value> = serde_json::from_str(trimmed).map_err(|e| {
            warn!("{operation}: page {page} is not a JSON array: {e}");
            ChartpinError::from(e)
        })?;
        if batch.is_empty() {
            break;
        }

        debug!("{operation}: page {page} returned {} record(s)", batch.len());
        records.append(&mut batch);

        if !deep {
            break;
        }
        page += 1;
    }

    Ok(records)
}
