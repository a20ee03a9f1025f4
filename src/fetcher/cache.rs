//! SQLite-backed response cache
//!
//! Wraps another transport and serves successful responses from disk while
//! they are younger than the expiry. Cache failures are logged and skipped.

use crate::fetcher::transport::{RawResponse, Transport, TransportError};
use crate::storage::StorageError;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

const CACHE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS http_cache (
    url TEXT PRIMARY KEY,
    status INTEGER NOT NULL,
    final_url TEXT NOT NULL,
    body TEXT NOT NULL,
    fetched_at INTEGER NOT NULL
);
"#;

/// Transport decorator that caches 2xx responses by request URL
pub struct CachingTransport<T> {
    inner: T,
    conn: Mutex<Connection>,
    expire_after: Duration,
}

impl<T: Transport> CachingTransport<T> {
    /// Opens (or creates) the cache database at `path`
    pub fn open(inner: T, path: &Path, expire_after: Duration) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(inner, Connection::open(path)?, expire_after)
    }

    /// Creates a cache that lives only as long as this value
    pub fn in_memory(inner: T, expire_after: Duration) -> Result<Self, StorageError> {
        Self::with_connection(inner, Connection::open_in_memory()?, expire_after)
    }

    fn with_connection(
        inner: T,
        conn: Connection,
        expire_after: Duration,
    ) -> Result<Self, StorageError> {
        conn.execute_batch(CACHE_SCHEMA_SQL)?;
        Ok(Self {
            inner,
            conn: Mutex::new(conn),
            expire_after,
        })
    }

    fn lookup(&self, url: &str) -> Result<Option<RawResponse>, StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::Database(format!("Failed to lock cache: {}", e)))?;

        let oldest = Utc::now().timestamp() - self.expire_after.as_secs() as i64;
        let hit = conn
            .query_row(
                "SELECT status, final_url, body FROM http_cache WHERE url = ?1 AND fetched_at > ?2",
                params![url, oldest],
                |row| {
                    Ok(RawResponse {
                        status: row.get(0)?,
                        url: row.get(1)?,
                        retry_after: None,
                        body: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(hit)
    }

    fn store(&self, url: &str, response: &RawResponse) -> Result<(), StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::Database(format!("Failed to lock cache: {}", e)))?;

        conn.execute(
            "INSERT OR REPLACE INTO http_cache (url, status, final_url, body, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                url,
                response.status,
                response.url,
                response.body,
                Utc::now().timestamp()
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl<T: Transport> Transport for CachingTransport<T> {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        match self.lookup(url.as_str()) {
            Ok(Some(response)) => {
                tracing::debug!("Cache hit: {}", url);
                return Ok(response);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache lookup failed for {}: {}", url, e),
        }

        let response = self.inner.get(url).await?;

        if response.is_success() {
            if let Err(e) = self.store(url.as_str(), &response) {
                tracing::warn!("Cache write failed for {}: {}", url, e);
            }
        }

        Ok(response)
    }
}
