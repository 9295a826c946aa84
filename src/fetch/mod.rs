//! Content fetching and the paginated retrieval loop
//!
//! Network I/O sits behind the [`ContentFetcher`] capability trait so
//! the aggregator and page loop can be exercised with scripted doubles
//! in tests. The production implementation is a thin reqwest wrapper.
//!
//! The page loop is the only retry logic in the crate: a page that
//! fails or comes back malformed is retried in place, and three
//! consecutive failures abort the run. A successful page always resets
//! the failure counter; there is no cap on pages while progress is
//! being made and no backoff between retries.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Number of records requested per page.
pub const PAGE_SIZE: usize = 1000;

/// Consecutive-failure budget for one page index.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Errors raised while fetching remote content.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request itself failed (connection, TLS, non-success status).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The response body was not the JSON shape the catalogue promises.
    #[error("malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    /// The same page failed too many times in a row.
    #[error("aborting after {failures} consecutive failed fetches of {url}")]
    RetryBudgetExhausted { url: String, failures: u32 },
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Capability for retrieving the raw bytes behind a URL.
///
/// Used both for catalogue pages and for best-effort OpenAPI
/// definition retrieval.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>>;
}

/// Production fetcher backed by a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: format!("unexpected status {status}"),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(body.to_vec())
    }
}

/// Drive paginated retrieval of every raw record in the catalogue.
///
/// Pages are requested as `<base>?start=<page*1000>&rows=1000`. A page
/// with zero rows terminates the loop normally; a failed or malformed
/// page is retried at the same index until the consecutive-failure
/// budget is spent. No records are returned from a partially failed
/// run.
pub async fn fetch_all_packages(
    fetcher: &dyn ContentFetcher,
    base_url: &str,
) -> FetchResult<Vec<Value>> {
    let mut page = 0usize;
    let mut failures = 0u32;
    let mut records: Vec<Value> = Vec::new();

    loop {
        let url = format!("{base_url}?start={}&rows={PAGE_SIZE}", page * PAGE_SIZE);
        match fetch_page(fetcher, &url).await {
            Ok(rows) => {
                failures = 0;
                if rows.is_empty() {
                    info!(
                        pages = page + 1,
                        records = records.len(),
                        "catalogue pagination complete"
                    );
                    return Ok(records);
                }
                debug!(page, rows = rows.len(), "fetched catalogue page");
                records.extend(rows);
                page += 1;
            }
            Err(err) => {
                failures += 1;
                warn!(%url, failures, "catalogue page fetch failed: {err}");
                if failures >= MAX_CONSECUTIVE_FAILURES {
                    return Err(FetchError::RetryBudgetExhausted { url, failures });
                }
            }
        }
    }
}

/// Fetch one page and pull the record array out of the envelope.
///
/// The body must decode to JSON with a top-level `success: true` and a
/// `result.results` array; anything else is a malformed response.
async fn fetch_page(fetcher: &dyn ContentFetcher, url: &str) -> FetchResult<Vec<Value>> {
    let body = fetcher.fetch(url).await?;

    let envelope: Value =
        serde_json::from_slice(&body).map_err(|e| FetchError::MalformedResponse {
            url: url.to_string(),
            message: format!("body is not valid JSON: {e}"),
        })?;

    if !envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return Err(FetchError::MalformedResponse {
            url: url.to_string(),
            message: "missing or false `success` flag".to_string(),
        });
    }

    let results = envelope
        .pointer("/result/results")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::MalformedResponse {
            url: url.to_string(),
            message: "`result.results` is missing or not an array".to_string(),
        })?;

    Ok(results.to_vec())
}
