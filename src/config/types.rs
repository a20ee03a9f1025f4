use serde::Deserialize;

/// Main configuration structure for Offer-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Builds a configuration with default tunables for the given endpoint and database
    pub fn new(base_url: impl Into<String>, database_path: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: base_url.into(),
                user_agent: default_user_agent(),
                timeout_secs: default_timeout_secs(),
            },
            fetcher: FetcherConfig::default(),
            cache: CacheConfig::default(),
            storage: StorageConfig {
                database_path: database_path.into(),
                table_name: default_table_name(),
            },
        }
    }
}

/// Remote listing API settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Listing endpoint; the page number is sent as the `page` query parameter
    #[serde(rename = "base-url", default)]
    pub base_url: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Total per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Pagination, pacing and retry tunables
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Number of pages to fetch; resolved from the API when absent
    #[serde(default)]
    pub pages: Option<u32>,

    /// Hard ceiling on pages fetched in one run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Lower bound of the pause after each page (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the pause after each page (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Retries allowed per request for transient failures
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Lower bound of the backoff factor drawn once per run
    #[serde(rename = "backoff-min", default = "default_backoff_min")]
    pub backoff_min: f64,

    /// Upper bound of the backoff factor drawn once per run
    #[serde(rename = "backoff-max", default = "default_backoff_max")]
    pub backoff_max: f64,

    /// Longest single wait between retries (seconds)
    #[serde(rename = "max-backoff-secs", default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            pages: None,
            max_pages: default_max_pages(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            retries: default_retries(),
            backoff_min: default_backoff_min(),
            backoff_max: default_backoff_max(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

/// On-disk response cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Path to the SQLite cache file
    #[serde(default = "default_cache_path")]
    pub path: String,

    /// Age after which a cached response is refetched (seconds)
    #[serde(rename = "expire-after-secs", default = "default_cache_expire_secs")]
    pub expire_after_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_cache_path(),
            expire_after_secs: default_cache_expire_secs(),
        }
    }
}

/// Persistence target settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default)]
    pub database_path: String,

    /// Table receiving the offers
    #[serde(rename = "table-name", default = "default_table_name")]
    pub table_name: String,
}

fn default_user_agent() -> String {
    format!("offer-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_pages() -> u32 {
    1000
}

fn default_min_delay_ms() -> u64 {
    3000
}

fn default_max_delay_ms() -> u64 {
    6000
}

fn default_retries() -> u32 {
    5
}

fn default_backoff_min() -> f64 {
    3.0
}

fn default_backoff_max() -> f64 {
    6.0
}

fn default_max_backoff_secs() -> u64 {
    120
}

fn default_cache_path() -> String {
    "fetcher_cache.sqlite".to_string()
}

fn default_cache_expire_secs() -> u64 {
    60
}

fn default_table_name() -> String {
    "offers".to_string()
}
