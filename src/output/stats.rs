//! Statistics generation from the offers database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{OfferStore, StorageError};

/// Harvest statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestStatistics {
    /// Table the rows were read from
    pub table: String,

    /// Total number of stored rows
    pub total_rows: u64,

    /// Rows per fetch date, oldest first
    pub rows_by_fetch_date: Vec<(String, u64)>,
}

impl HarvestStatistics {
    /// Number of distinct fetch dates in the table
    pub fn fetch_days(&self) -> usize {
        self.rows_by_fetch_date.len()
    }

    /// Most recent fetch date, if any rows exist
    pub fn latest_fetch_date(&self) -> Option<&str> {
        self.rows_by_fetch_date.last().map(|(date, _)| date.as_str())
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The offers store to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(store: &OfferStore) -> Result<HarvestStatistics, StorageError> {
    Ok(HarvestStatistics {
        table: store.table().to_string(),
        total_rows: store.count_rows()?,
        rows_by_fetch_date: store.rows_per_fetch_date()?,
    })
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");
    println!("Table: {}", stats.table);
    println!("Total rows: {}", stats.total_rows);
    println!("Fetch days: {}", stats.fetch_days());

    if let Some(latest) = stats.latest_fetch_date() {
        println!("Latest fetch: {}", latest);
    }

    if !stats.rows_by_fetch_date.is_empty() {
        println!("\nRows by fetch date:");
        for (date, count) in &stats.rows_by_fetch_date {
            println!("  {}: {}", date, count);
        }
    }
}
