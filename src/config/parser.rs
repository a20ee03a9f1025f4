use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable that replaces `api.base-url`
pub const OFFERS_URL_VAR: &str = "OFFERS_URL";

/// Environment variable that replaces `storage.database-path`
pub const DB_PATH_VAR: &str = "DB_PATH";

/// Loads and parses a configuration file from the given path
///
/// Environment overrides (`OFFERS_URL`, `DB_PATH`) are applied before
/// validation, so a config file may leave either value empty.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use offer_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Database: {}", config.storage.database_path);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate(&config)?;

    Ok(config)
}

/// Parses TOML content into a configuration without validating it
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Replaces endpoint and database path with values from `lookup`, when set
///
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(OFFERS_URL_VAR).filter(|v| !v.trim().is_empty()) {
        tracing::debug!("{} overrides api.base-url", OFFERS_URL_VAR);
        config.api.base_url = url;
    }

    if let Some(path) = lookup(DB_PATH_VAR).filter(|v| !v.trim().is_empty()) {
        tracing::debug!("{} overrides storage.database-path", DB_PATH_VAR);
        config.storage.database_path = path;
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be traced back to the settings they used.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
