//! HTTP client for the hosted relational data service.
//!
//! Speaks the PostgREST dialect: `GET {base}/rest/v1/{table}` with filters as
//! `column=op.value` query pairs, embedded joins in `select`, and exact
//! counts returned in the `Content-Range` header.

use std::time::Duration;

use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, warn};

use super::{RemoteError, RemoteStore, SelectRequest};

// ============================================================================
// Constants
// ============================================================================

/// Path under the service base URL where tables are exposed.
const REST_PATH: &str = "rest/v1";

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for a dashboard.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Asks the service to compute the exact match count into `Content-Range`.
const PREFER_EXACT_COUNT: &str = "count=exact";

/// REST client for the data service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct RestRemote {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    initial_backoff: Duration,
}

impl std::fmt::Debug for RestRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestRemote")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .field("initial_backoff", &self.initial_backoff)
            .finish()
    }
}

impl RestRemote {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Set the project API key sent with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// First wait after a 429; doubled on each further retry.
    pub fn with_retry_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, RemoteError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref key) = self.api_key {
            headers.insert("apikey", header_value(key)?);
            headers.insert(header::AUTHORIZATION, header_value(&format!("Bearer {}", key))?);
        }
        Ok(headers)
    }

    /// Check if response is successful.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, RemoteError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::from_status(status, &body))
        }
    }

    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        prefer: Option<&str>,
    ) -> Result<reqwest::Response, RemoteError> {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let mut request = self
                .client
                .get(url)
                .headers(self.auth_headers()?)
                .header(header::ACCEPT, "application/json")
                .query(query);
            if let Some(prefer) = prefer {
                request = request.header("Prefer", prefer);
            }

            let response = request.send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(RemoteError::RateLimited);
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2; // Exponential backoff
                }
            }
        }
    }
}

impl RemoteStore for RestRemote {
    async fn select(&self, request: &SelectRequest) -> Result<Vec<Value>, RemoteError> {
        let url = self.table_url(&request.table);
        let response = self.get(&url, &request.query_pairs(), None).await?;

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidResponse(format!("{}: {}", request.table, e)))?;
        debug!(table = %request.table, rows = rows.len(), "Fetched rows");
        Ok(rows)
    }

    /// One-row GET with an exact count; the total comes back in
    /// `Content-Range` (`0-0/42`, or `*/0` when nothing matches).
    async fn count(&self, request: &SelectRequest) -> Result<u64, RemoteError> {
        let url = self.table_url(&request.table);
        let mut query = request.count_pairs();
        query.push(("limit".to_string(), "1".to_string()));
        let response = self.get(&url, &query, Some(PREFER_EXACT_COUNT)).await?;

        let range = response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                RemoteError::InvalidResponse(format!("{}: missing Content-Range", request.table))
            })?;

        let total = parse_content_range_total(range).ok_or_else(|| {
            RemoteError::InvalidResponse(format!("{}: bad Content-Range `{}`", request.table, range))
        })?;
        debug!(table = %request.table, total, "Counted rows");
        Ok(total)
    }
}

fn header_value(value: &str) -> Result<header::HeaderValue, RemoteError> {
    header::HeaderValue::from_str(value)
        .map_err(|_| RemoteError::InvalidResponse("credential contains invalid header characters".into()))
}

/// Total from a `Content-Range` value such as `0-24/42` or `*/0`.
/// An unknown total (`0-24/*`) is not a count.
fn parse_content_range_total(range: &str) -> Option<u64> {
    let (_, total) = range.trim().rsplit_once('/')?;
    total.parse().ok()
}
