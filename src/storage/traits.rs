//! Storage traits and error types
//!
//! This module defines the interface of the persistence sink and its
//! error type.

use crate::normalize::NormalizedOffer;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only destination for normalized offers
pub trait OfferSink: Send {
    /// Creates the target table if it does not exist; safe to call repeatedly
    fn ensure_schema(&mut self) -> StorageResult<()>;

    /// Appends one offer stamped with `fetch_date`
    fn append(&mut self, offer: &NormalizedOffer, fetch_date: &str) -> StorageResult<()>;

    /// Appends offers one by one, returning how many were written
    ///
    /// Not atomic: a failure part-way leaves the earlier rows in place.
    fn append_all(&mut self, offers: &[NormalizedOffer], fetch_date: &str) -> StorageResult<usize> {
        for (written, offer) in offers.iter().enumerate() {
            if let Err(e) = self.append(offer, fetch_date) {
                tracing::error!("Insert failed after {} of {} offers: {}", written, offers.len(), e);
                return Err(e);
            }
        }
        Ok(offers.len())
    }
}
