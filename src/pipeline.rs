//! End-to-end harvest run
//!
//! Validates the configuration, fetches every page, normalizes the offers
//! and appends them to the store. Nothing is written unless every page was
//! fetched.

use crate::config::{validate, Config};
use crate::fetcher::{build_transport, FetchOrchestrator, PageFetcher, Transport};
use crate::normalize::normalize_all;
use crate::storage::{fetch_date_today, OfferSink, OfferStore};
use crate::HarvestError;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Pages fetched
    pub pages: usize,
    /// Raw offers received
    pub offers: usize,
    /// Rows appended to the store
    pub rows_written: usize,
    /// Date stamped on every row of this run
    pub fetch_date: String,
}

/// Runs the harvest with the HTTP transport and SQLite store from `config`
///
/// # Arguments
///
/// * `config` - Run configuration
/// * `cancel` - Stops the run between or during requests; nothing is persisted
///
/// # Returns
///
/// * `Ok(PipelineReport)` - All pages fetched and stored
/// * `Err(HarvestError)` - The run failed at the stage named by `stage()`
pub async fn run_pipeline(
    config: &Config,
    cancel: CancellationToken,
) -> Result<PipelineReport, HarvestError> {
    validate(config)?;

    let transport = build_transport(config)?;
    let mut store = OfferStore::from_config(&config.storage)?;
    tracing::info!(
        "Storing offers in {} (table {})",
        config.storage.database_path,
        store.table()
    );

    harvest_validated(config, transport, &mut store, cancel).await
}

/// Runs the harvest against an explicit transport and sink
pub async fn harvest(
    config: &Config,
    transport: Arc<dyn Transport>,
    sink: &mut dyn OfferSink,
    cancel: CancellationToken,
) -> Result<PipelineReport, HarvestError> {
    validate(config)?;
    harvest_validated(config, transport, sink, cancel).await
}

async fn harvest_validated(
    config: &Config,
    transport: Arc<dyn Transport>,
    sink: &mut dyn OfferSink,
    cancel: CancellationToken,
) -> Result<PipelineReport, HarvestError> {
    let start_time = Instant::now();

    sink.ensure_schema()?;

    let fetcher = PageFetcher::from_config(config, transport)?;
    let mut orchestrator = FetchOrchestrator::from_config(config, fetcher).with_cancellation(cancel);

    let batch = orchestrator.run_fetch(config.fetcher.pages).await?;
    tracing::info!("Fetched {} offers", batch.len());

    let offers = normalize_all(&batch.offers);
    let fetch_date = fetch_date_today();
    let rows_written = sink.append_all(&offers, &fetch_date)?;
    tracing::info!(
        "Inserted {} offers into the database in {:?}",
        rows_written,
        start_time.elapsed()
    );

    Ok(PipelineReport {
        pages: batch.pages.len(),
        offers: batch.len(),
        rows_written,
        fetch_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::test_support::{ok, ScriptedTransport};

    fn config() -> Config {
        let mut config = Config::new("http://api.test/offers", "unused.db");
        config.fetcher.pages = Some(1);
        config.fetcher.min_delay_ms = 0;
        config.fetcher.max_delay_ms = 0;
        config.fetcher.backoff_min = 0.0;
        config.fetcher.backoff_max = 0.0;
        config
    }

    #[tokio::test]
    async fn test_harvest_writes_batch_to_sink() {
        let transport = Arc::new(ScriptedTransport::new(vec![ok(
            r#"{"data": [{"slug": "a"}, {"slug": "b"}]}"#,
        )]));
        let mut store = OfferStore::open_in_memory("offers").unwrap();

        let report = harvest(&config(), transport, &mut store, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.pages, 1);
        assert_eq!(report.rows_written, 2);
        assert_eq!(store.count_rows().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_harvest_rejects_invalid_config() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let mut store = OfferStore::open_in_memory("offers").unwrap();
        let mut config = config();
        config.fetcher.min_delay_ms = 10;
        config.fetcher.max_delay_ms = 5;

        let err = harvest(&config, transport.clone(), &mut store, CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "configuration");
        assert_eq!(transport.calls(), 0);
        assert_eq!(store.count_rows().unwrap(), 0);
    }
}
