//! Fetch orchestration - retrieves every page of the listing
//!
//! Pages are requested one at a time, in a random order, with a random pause
//! between requests. Any page failure aborts the whole run: a batch is
//! either complete or not returned at all.

use crate::config::Config;
use crate::fetcher::page::PageFetcher;
use crate::fetcher::pagination::resolve_page_count;
use crate::HarvestError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// All raw offers collected in one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchBatch {
    /// Offers from every page, in visit order
    pub offers: Vec<Value>,
    /// Page numbers in the order they were fetched
    pub pages: Vec<u32>,
}

impl FetchBatch {
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

/// Sequences page retrieval for one run
pub struct FetchOrchestrator {
    fetcher: PageFetcher,
    ceiling: u32,
    min_delay_ms: u64,
    max_delay_ms: u64,
    rng: StdRng,
    cancel: CancellationToken,
}

impl FetchOrchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Page fetcher shared by the probe and every page request
    /// * `ceiling` - Maximum number of pages fetched in one run
    /// * `delay` - Inclusive range of the pause after each page
    pub fn new(fetcher: PageFetcher, ceiling: u32, delay: (Duration, Duration)) -> Self {
        let min_delay_ms = delay.0.as_millis() as u64;
        let max_delay_ms = (delay.1.as_millis() as u64).max(min_delay_ms);

        Self {
            fetcher,
            ceiling: ceiling.max(1),
            min_delay_ms,
            max_delay_ms,
            rng: StdRng::from_entropy(),
            cancel: CancellationToken::new(),
        }
    }

    /// Creates an orchestrator with the ceiling and pacing from the configuration
    pub fn from_config(config: &Config, fetcher: PageFetcher) -> Self {
        Self::new(
            fetcher,
            config.fetcher.max_pages,
            (
                Duration::from_millis(config.fetcher.min_delay_ms),
                Duration::from_millis(config.fetcher.max_delay_ms),
            ),
        )
    }

    /// Stops the run when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Makes page order and pauses reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Number of pages the run will fetch
    pub async fn resolve_page_count(&self, requested: Option<u32>) -> Result<u32, HarvestError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(HarvestError::Cancelled),
            count = resolve_page_count(&self.fetcher, requested, self.ceiling) => Ok(count),
        }
    }

    /// Fetches every page and returns the combined batch
    ///
    /// # Arguments
    ///
    /// * `requested` - Page count to use instead of asking the API
    ///
    /// # Errors
    ///
    /// * `HarvestError::Fetch` - a page could not be fetched; nothing is returned
    /// * `HarvestError::Cancelled` - the cancellation token fired
    pub async fn run_fetch(&mut self, requested: Option<u32>) -> Result<FetchBatch, HarvestError> {
        let count = self.resolve_page_count(requested).await?;
        tracing::info!("Fetching {} pages", count);

        let mut pages: Vec<u32> = (1..=count).collect();
        pages.shuffle(&mut self.rng);

        let start_time = Instant::now();
        let mut batch = FetchBatch::default();

        for (index, page) in pages.iter().copied().enumerate() {
            let response = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(HarvestError::Cancelled),
                result = self.fetcher.fetch(page) => result?,
            };

            let received = response.data.len();
            batch.offers.extend(response.data);
            batch.pages.push(page);

            tracing::info!(
                "Saved page: {} ({}/{}), {} offers, {} total",
                page,
                index + 1,
                count,
                received,
                batch.offers.len()
            );

            if index + 1 < pages.len() {
                let delay = self.next_delay();
                tracing::debug!("Waiting {:?} before the next page", delay);
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Err(HarvestError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        tracing::info!(
            "Fetched {} offers from {} pages in {:?}",
            batch.offers.len(),
            batch.pages.len(),
            start_time.elapsed()
        );

        Ok(batch)
    }

    /// Pause drawn uniformly from the configured range, bounds included
    fn next_delay(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.min_delay_ms..=self.max_delay_ms))
    }
}
