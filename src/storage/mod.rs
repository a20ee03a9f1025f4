//! Storage module for persisting harvested offers
//!
//! This module owns the offers table:
//! - Creating the table on first use
//! - Appending normalized offers stamped with the fetch date
//! - Reading rows back for statistics and checks
//!
//! Rows are only ever appended. Running the harvest twice over the same
//! listing stores every offer twice.

mod schema;
mod sqlite;
mod traits;

pub use schema::{create_table_sql, OFFER_COLUMNS};
pub use sqlite::OfferStore;
pub use traits::{OfferSink, StorageError, StorageResult};

use crate::normalize::NormalizedOffer;
use chrono::{Local, NaiveDate};

/// A normalized offer as stored, with its row id and fetch date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOffer {
    pub id: i64,
    pub offer: NormalizedOffer,
    /// Calendar day of the run, `YYYY-MM-DD`
    pub date_fetched: String,
}

/// Formats a calendar day the way the `date_fetched` column stores it
pub fn format_fetch_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Today's date in local time, computed once per batch
pub fn fetch_date_today() -> String {
    format_fetch_date(Local::now().date_naive())
}
