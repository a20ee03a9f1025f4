//! Single-page fetching
//!
//! Builds the page URL, runs the request through the retry policy and
//! classifies the result:
//!
//! | Outcome | Result |
//! |---------|--------|
//! | 2xx with `{"data": [...]}` body | `PageResponse` |
//! | 2xx with unparseable body or no `data` list | `ResponseMalformed` |
//! | 429 / 500 / 502 / 503 / 504 past the retry budget | `RetriesExhausted` |
//! | Connect error or timeout past the retry budget | `RetriesExhausted` |
//! | Any other status | `RequestFailed` (with status) |
//! | Any other transport error | `RequestFailed` |

use crate::config::Config;
use crate::fetcher::observer::{AttemptObserver, TracingObserver};
use crate::fetcher::retry::{execute_with_retry, RetryPolicy};
use crate::fetcher::transport::Transport;
use crate::{ConfigError, FetchError};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Pagination hints carried in a page's `meta` object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub total_pages: Option<u64>,
    pub total_items: Option<u64>,
}

impl PageMeta {
    /// Reads `totalPages`/`totalItems` from a response body; anything else is ignored
    pub fn from_body(body: &Value) -> Self {
        let meta = body.get("meta");
        Self {
            total_pages: meta.and_then(|m| m.get("totalPages")).and_then(as_count),
            total_items: meta.and_then(|m| m.get("totalItems")).and_then(as_count),
        }
    }
}

/// Non-negative integer, accepting integral floats such as `12.0`
fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

/// One page of the listing
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
    /// Raw offers, untouched
    pub data: Vec<Value>,
    pub meta: PageMeta,
}

impl PageResponse {
    /// Extracts the offer list and metadata from a decoded body
    ///
    /// # Errors
    ///
    /// `ResponseMalformed` if the body is not an object with a `data` list.
    pub fn from_body(url: &str, body: Value) -> Result<Self, FetchError> {
        let meta = PageMeta::from_body(&body);

        let Value::Object(mut fields) = body else {
            return Err(malformed(url, "body is not a JSON object"));
        };

        match fields.remove("data") {
            Some(Value::Array(data)) => Ok(Self { data, meta }),
            Some(_) => Err(malformed(url, "'data' is not a list")),
            None => Err(malformed(url, "missing 'data' key")),
        }
    }
}

fn malformed(url: &str, reason: impl Into<String>) -> FetchError {
    FetchError::ResponseMalformed {
        url: url.to_string(),
        reason: reason.into(),
    }
}

/// Fetches pages of the listing endpoint with retry and classification
///
/// The transport (and the connection pool behind it) is shared by every
/// request made through this fetcher.
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    base_url: Url,
    policy: RetryPolicy,
    observer: Arc<dyn AttemptObserver>,
}

impl PageFetcher {
    /// Creates a fetcher for `base_url`
    ///
    /// # Errors
    ///
    /// `ConfigError` if the URL is empty or cannot be parsed.
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        policy: RetryPolicy,
    ) -> Result<Self, ConfigError> {
        if base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "base_url is required and cannot be empty".to_string(),
            ));
        }

        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

        Ok(Self {
            transport,
            base_url,
            policy,
            observer: Arc::new(TracingObserver),
        })
    }

    /// Creates a fetcher from the run configuration, drawing a fresh backoff factor
    pub fn from_config(config: &Config, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        Self::new(
            &config.api.base_url,
            transport,
            RetryPolicy::from_config(&config.fetcher),
        )
    }

    /// Replaces the per-attempt observer
    pub fn with_observer(mut self, observer: Arc<dyn AttemptObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// URL of the given page: the base URL plus `page=<n>`
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("page", &page.to_string());
        url
    }

    /// Fetches a page and decodes its body as JSON, without checking its shape
    pub async fn fetch_json(&self, page: u32) -> Result<Value, FetchError> {
        let url = self.page_url(page);
        if page == 0 {
            return Err(FetchError::RequestFailed {
                url: url.to_string(),
                status: None,
                message: "page numbers start at 1".to_string(),
            });
        }

        let response =
            execute_with_retry(self.transport.as_ref(), &self.policy, self.observer.as_ref(), &url)
                .await?;

        if !response.is_success() {
            tracing::error!("Request failed: {} {}", response.status, url);
            return Err(FetchError::RequestFailed {
                url: url.to_string(),
                status: Some(response.status),
                message: format!("HTTP status {}", response.status),
            });
        }

        serde_json::from_str(&response.body)
            .map_err(|e| malformed(url.as_str(), format!("invalid JSON: {}", e)))
    }

    /// Fetches one page of offers
    ///
    /// # Arguments
    ///
    /// * `page` - 1-based page number
    pub async fn fetch(&self, page: u32) -> Result<PageResponse, FetchError> {
        let body = self.fetch_json(page).await?;
        PageResponse::from_body(self.page_url(page).as_str(), body)
    }
}
