//! Offer-Harvest: a polite listing API harvester
//!
//! This crate pulls every page of a paginated job-offer listing API,
//! flattens each offer into a fixed relational shape and appends the batch
//! to a SQLite table for later analysis.

pub mod config;
pub mod fetcher;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod storage;

use thiserror::Error;

/// Main error type for Offer-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Run cancelled before completion")]
    Cancelled,
}

impl HarvestError {
    /// Name of the pipeline stage that produced this error
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration",
            Self::Fetch(_) => "fetch",
            Self::Storage(_) => "storage",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while retrieving a single page
#[derive(Debug, Error)]
pub enum FetchError {
    /// The transient-retry budget for one request was spent
    #[error("All {attempts} attempts failed for {url} (last status: {})", display_status(.last_status))]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_status: Option<u16>,
    },

    /// A non-retryable network or client error
    #[error("Request to {url} failed: {message}")]
    RequestFailed {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// A successful response whose body could not be used
    #[error("Malformed response from {url}: {reason}")]
    ResponseMalformed { url: String, reason: String },
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "connection error".to_string(),
    }
}

/// Result type alias for Offer-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use normalize::{normalize, NormalizedOffer};
pub use pipeline::{run_pipeline, PipelineReport};
