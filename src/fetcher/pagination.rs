//! Page-count discovery
//!
//! The count comes from a probe of page 1, in order of preference:
//! 1. `meta.totalPages`
//! 2. `ceil(meta.totalItems / len(data))` when the probe page has offers
//! 3. `1` for anything else, including a failed probe
//!
//! The result, or a caller-supplied count, is always capped at the ceiling
//! and never less than 1.

use crate::fetcher::page::{PageFetcher, PageMeta};
use serde_json::Value;

/// Derives the page count from a decoded probe body
///
/// Never returns less than 1.
pub fn page_count_from_probe(body: &Value) -> u32 {
    let meta = PageMeta::from_body(body);

    if let Some(total_pages) = meta.total_pages {
        tracing::info!("API reports totalPages: {}", total_pages);
        return saturate(total_pages).max(1);
    }

    let per_page = match body.get("data") {
        Some(Value::Array(items)) => items.len() as u64,
        None => 0,
        Some(_) => {
            tracing::error!("Invalid response format: 'data' is not a list");
            return 1;
        }
    };

    match meta.total_items {
        Some(total_items) if per_page > 0 => {
            let pages = total_items / per_page + u64::from(total_items % per_page != 0);
            tracing::info!(
                "Calculated total pages: {} ({} items, {} per page)",
                pages,
                total_items,
                per_page
            );
            saturate(pages).max(1)
        }
        _ => {
            tracing::info!("No pagination metadata in probe response, assuming 1 page");
            1
        }
    }
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Resolves how many pages to fetch
///
/// A `requested` count skips the probe. Probe failures are logged and
/// resolve to a single page; they never abort the run.
///
/// # Arguments
///
/// * `fetcher` - Fetcher used for the probe of page 1
/// * `requested` - Caller-supplied page count, if any
/// * `ceiling` - Hard upper bound on the result
pub async fn resolve_page_count(fetcher: &PageFetcher, requested: Option<u32>, ceiling: u32) -> u32 {
    let pages = match requested {
        Some(pages) => {
            tracing::info!("Using requested page count: {}", pages);
            pages
        }
        None => {
            tracing::info!("Checking total number of pages...");
            match fetcher.fetch_json(1).await {
                Ok(body) => page_count_from_probe(&body),
                Err(e) => {
                    tracing::error!("Error fetching total pages: {}", e);
                    1
                }
            }
        }
    };

    if pages > ceiling {
        tracing::warn!(
            "Page count {} exceeds the ceiling of {}, capping",
            pages,
            ceiling
        );
    }

    if pages == 0 {
        tracing::warn!("Page count of 0 requested, fetching 1 page");
    }

    pages.min(ceiling).max(1)
}
