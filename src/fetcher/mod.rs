//! Fetch pipeline for the listing API
//!
//! This module contains everything between the remote API and the in-memory
//! batch of raw offers:
//! - An HTTP transport (with an optional on-disk cache)
//! - A retry policy for transient failures
//! - Single-page fetching with error classification
//! - Page-count discovery
//! - Randomized, paced retrieval of every page

mod cache;
mod observer;
mod orchestrator;
mod page;
mod pagination;
mod retry;
mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::CachingTransport;
pub use observer::{AttemptObserver, TracingObserver};
pub use orchestrator::{FetchBatch, FetchOrchestrator};
pub use page::{PageFetcher, PageMeta, PageResponse};
pub use pagination::{page_count_from_probe, resolve_page_count};
pub use retry::{execute_with_retry, RetryDecision, RetryPolicy, RETRYABLE_STATUSES};
pub use transport::{
    build_http_client, RawResponse, ReqwestTransport, Transport, TransportError,
    TransportErrorKind,
};

use crate::config::Config;
use crate::HarvestError;
use std::sync::Arc;
use std::time::Duration;

/// Builds the transport described by the configuration
///
/// The reqwest transport is wrapped by the response cache when
/// `cache.enabled` is set.
pub fn build_transport(config: &Config) -> Result<Arc<dyn Transport>, HarvestError> {
    let client = build_http_client(
        &config.api.user_agent,
        Duration::from_secs(config.api.timeout_secs),
    )
    .map_err(|e| crate::FetchError::RequestFailed {
        url: config.api.base_url.clone(),
        status: None,
        message: format!("failed to build HTTP client: {}", e),
    })?;

    let transport = ReqwestTransport::new(client);

    if config.cache.enabled {
        tracing::info!(
            "Response cache enabled at {} (expires after {}s)",
            config.cache.path,
            config.cache.expire_after_secs
        );
        let cached = CachingTransport::open(
            transport,
            std::path::Path::new(&config.cache.path),
            Duration::from_secs(config.cache.expire_after_secs),
        )?;
        Ok(Arc::new(cached))
    } else {
        Ok(Arc::new(transport))
    }
}
