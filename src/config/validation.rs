use crate::config::types::{ApiConfig, CacheConfig, Config, FetcherConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_cache_config(&config.cache)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates the remote endpoint settings
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    if config.base_url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "base_url is required and cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates pacing and retry tunables
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.pages == Some(0) {
        return Err(ConfigError::Validation(
            "pages must be >= 1 when set".to_string(),
        ));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if !config.backoff_min.is_finite() || !config.backoff_max.is_finite() {
        return Err(ConfigError::Validation(
            "backoff range must be finite".to_string(),
        ));
    }

    if config.backoff_min < 0.0 || config.backoff_min > config.backoff_max {
        return Err(ConfigError::Validation(format!(
            "backoff range must satisfy 0 <= min <= max, got {}..{}",
            config.backoff_min, config.backoff_max
        )));
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.enabled && config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "cache path cannot be empty when the cache is enabled".to_string(),
        ));
    }
    Ok(())
}

/// Validates the persistence target
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database_path is required and cannot be empty".to_string(),
        ));
    }

    if !is_sql_identifier(&config.table_name) {
        return Err(ConfigError::Validation(format!(
            "table_name must be a plain SQL identifier, got '{}'",
            config.table_name
        )));
    }

    Ok(())
}

/// Letters, digits and underscores, not starting with a digit
pub(crate) fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
