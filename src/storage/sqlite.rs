//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the OfferSink trait.

use crate::config::StorageConfig;
use crate::normalize::NormalizedOffer;
use crate::storage::schema::{create_table_sql, insert_sql};
use crate::storage::traits::{OfferSink, StorageError, StorageResult};
use crate::storage::StoredOffer;
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::Path;

/// SQLite-backed offers table
pub struct OfferStore {
    conn: Connection,
    table: String,
}

impl OfferStore {
    /// Opens (or creates) the database file and the offers table
    ///
    /// Missing parent directories are created.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `table` - Name of the offers table
    ///
    /// # Returns
    ///
    /// * `Ok(OfferStore)` - Database opened and table present
    /// * `Err(StorageError)` - The file or table could not be created
    pub fn open(path: &Path, table: &str) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        Self::with_connection(conn, table)
    }

    /// Opens the store described by the storage configuration
    pub fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        Self::open(Path::new(&config.database_path), &config.table_name)
    }

    /// Opens an existing database without creating the file or the table
    ///
    /// Used by read-only views such as statistics; a missing table surfaces
    /// as an error from the first query.
    pub fn open_existing(path: &Path, table: &str) -> StorageResult<Self> {
        if !crate::config::is_sql_identifier(table) {
            return Err(StorageError::InvalidTable(table.to_string()));
        }
        if !path.is_file() {
            return Err(StorageError::Database(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    /// Creates an in-memory store
    pub fn open_in_memory(table: &str) -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> StorageResult<Self> {
        if !crate::config::is_sql_identifier(table) {
            return Err(StorageError::InvalidTable(table.to_string()));
        }

        let mut store = Self {
            conn,
            table: table.to_string(),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Counts all stored rows
    pub fn count_rows(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!(r#"SELECT COUNT(*) FROM "{}""#, self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Row counts grouped by fetch date, oldest first
    pub fn rows_per_fetch_date(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"SELECT date_fetched, COUNT(*) FROM "{}" GROUP BY date_fetched ORDER BY date_fetched"#,
            self.table
        ))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    row.get::<_, i64>(1)? as u64,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Loads every stored row in insertion order
    pub fn load_all(&self) -> StorageResult<Vec<StoredOffer>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"SELECT id, {} FROM "{}" ORDER BY id"#,
            crate::storage::OFFER_COLUMNS.join(", "),
            self.table
        ))?;

        let rows = stmt
            .query_map([], stored_offer_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

fn stored_offer_from_row(row: &Row<'_>) -> rusqlite::Result<StoredOffer> {
    Ok(StoredOffer {
        id: row.get(0)?,
        offer: NormalizedOffer {
            slug: row.get(1)?,
            title: row.get(2)?,
            required_skills: row.get(3)?,
            nice_to_have_skills: row.get(4)?,
            workplace_type: row.get(5)?,
            working_time: row.get(6)?,
            experience_level: row.get(7)?,
            employment_types: row.get(8)?,
            category_id: row.get(9)?,
            multilocation: row.get(10)?,
            city: row.get(11)?,
            street: row.get(12)?,
            latitude: row.get(13)?,
            longitude: row.get(14)?,
            remote_interview: row.get(15)?,
            company_name: row.get(16)?,
            company_logo_thumb_url: row.get(17)?,
            published_at: row.get(18)?,
            open_to_hire_ukrainians: row.get(19)?,
            languages: row.get(20)?,
        },
        date_fetched: row.get(21)?,
    })
}

impl OfferSink for OfferStore {
    fn ensure_schema(&mut self) -> StorageResult<()> {
        self.conn.execute_batch(&create_table_sql(&self.table))?;
        Ok(())
    }

    fn append(&mut self, offer: &NormalizedOffer, fetch_date: &str) -> StorageResult<()> {
        let mut stmt = self.conn.prepare_cached(&insert_sql(&self.table))?;
        stmt.execute(params![
            offer.slug,
            offer.title,
            offer.required_skills,
            offer.nice_to_have_skills,
            offer.workplace_type,
            offer.working_time,
            offer.experience_level,
            offer.employment_types,
            offer.category_id,
            offer.multilocation,
            offer.city,
            offer.street,
            offer.latitude,
            offer.longitude,
            offer.remote_interview,
            offer.company_name,
            offer.company_logo_thumb_url,
            offer.published_at,
            offer.open_to_hire_ukrainians,
            offer.languages,
            fetch_date,
        ])?;
        Ok(())
    }
}
