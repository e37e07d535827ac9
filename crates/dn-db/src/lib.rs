//! Storage layer for the availability notifier.
//!
//! Persists the marked date set using `rusqlite`.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! [`SqliteStore`] puts it behind a `Mutex` so it can be shared as an
//! [`AvailabilityStore`] across request handlers.
//!
//! # Schema
//!
//! One row per marked day in `unavailable_dates`. The `date` column holds the
//! calendar day as `YYYY-MM-DD` TEXT, so lexicographic order matches calendar
//! order. `created_at` is an RFC 3339 UTC timestamp recording when the row
//! was written.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use dn_core::{AvailabilityStore, DateKey, StoreError};
use rusqlite::{Connection, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- date: calendar day, 'YYYY-MM-DD'
            CREATE TABLE IF NOT EXISTS unavailable_dates (
                date TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Lists stored dates in ascending order.
    ///
    /// Rows that do not hold a valid `YYYY-MM-DD` day are skipped with a warning.
    pub fn list_dates(&self) -> Result<Vec<DateKey>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT date FROM unavailable_dates ORDER BY date ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut dates = Vec::new();
        for row in rows {
            let raw = row?;
            match DateKey::parse_iso(&raw) {
                Ok(date) => dates.push(date),
                Err(err) => tracing::warn!(%err, "skipping malformed stored date"),
            }
        }
        Ok(dates)
    }

    /// Replaces every stored date with `dates` in a single transaction.
    ///
    /// Returns the number of rows written; duplicates are ignored.
    pub fn replace_dates(&mut self, dates: &[DateKey]) -> Result<usize, DbError> {
        self.replace_dates_at(dates, Utc::now())
    }

    fn replace_dates_at(&mut self, dates: &[DateKey], now: DateTime<Utc>) -> Result<usize, DbError> {
        let created_at = format_timestamp(now);
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM unavailable_dates", [])?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO unavailable_dates (date, created_at) VALUES (?, ?)",
            )?;
            for date in dates {
                inserted += stmt.execute(params![date.to_iso(), created_at])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

/// [`AvailabilityStore`] backed by a SQLite [`Database`].
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    pub const fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Opens (or creates) the database file and wraps it as a store.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        Database::open(path).map(Self::new)
    }
}

impl AvailabilityStore for SqliteStore {
    fn list_unavailable(&self) -> Result<Vec<DateKey>, StoreError> {
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(db.list_dates()?)
    }

    fn replace_all(&self, dates: &[DateKey]) -> Result<(), StoreError> {
        let mut db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        let written = db.replace_dates(dates)?;
        tracing::info!(written, "replaced stored dates");
        Ok(())
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DateKey {
        DateKey::parse_iso(s).unwrap()
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert_eq!(
            table_columns(&db.conn, "unavailable_dates"),
            vec!["date", "created_at"]
        );
    }

    #[test]
    fn replace_dates_orders_and_dedups() {
        let mut db = Database::open_in_memory().unwrap();
        let written = db
            .replace_dates(&[key("2025-06-15"), key("2025-06-10"), key("2025-06-15")])
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(db.list_dates().unwrap(), vec![key("2025-06-10"), key("2025-06-15")]);
    }

    #[test]
    fn replace_dates_discards_previous_set() {
        let mut db = Database::open_in_memory().unwrap();
        db.replace_dates(&[key("2025-01-01"), key("2025-01-02")]).unwrap();
        db.replace_dates(&[key("2025-02-01")]).unwrap();
        assert_eq!(db.list_dates().unwrap(), vec![key("2025-02-01")]);

        db.replace_dates(&[]).unwrap();
        assert!(db.list_dates().unwrap().is_empty());
    }

    #[test]
    fn replace_dates_records_created_at() {
        let mut db = Database::open_in_memory().unwrap();
        let now = DateTime::parse_from_rfc3339("2025-06-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        db.replace_dates_at(&[key("2025-06-10")], now).unwrap();

        let created_at: String = db
            .conn
            .query_row(
                "SELECT created_at FROM unavailable_dates WHERE date = ?",
                ["2025-06-10"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(created_at, "2025-06-01T09:30:00Z");
    }

    #[test]
    fn list_dates_skips_malformed_rows() {
        let db = Database::open_in_memory().unwrap();
        for raw in ["2025-06-10", "2025-02-30", "06/11/2025", "2025-06-12"] {
            db.conn
                .execute(
                    "INSERT INTO unavailable_dates (date, created_at) VALUES (?, ?)",
                    params![raw, "2025-06-01T00:00:00Z"],
                )
                .unwrap();
        }
        assert_eq!(db.list_dates().unwrap(), vec![key("2025-06-10"), key("2025-06-12")]);
    }

    #[test]
    fn store_persists_across_reopen() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("dn.db");

        let store = SqliteStore::open(&path).unwrap();
        store.replace_all(&[key("2025-06-10"), key("2025-06-15")]).unwrap();
        assert_eq!(store.add(&[key("2025-06-20")]).unwrap(), 1);
        drop(store);

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(
            reopened.list_unavailable().unwrap(),
            vec![key("2025-06-10"), key("2025-06-15"), key("2025-06-20")]
        );
    }

    #[test]
    fn remove_deletes_only_stored_dates() {
        let store = SqliteStore::new(Database::open_in_memory().unwrap());
        store.replace_all(&[key("2025-06-10"), key("2025-06-15")]).unwrap();

        assert_eq!(store.remove(&[key("2025-06-15"), key("2025-06-30")]).unwrap(), 1);
        assert_eq!(store.list_unavailable().unwrap(), vec![key("2025-06-10")]);
        assert_eq!(store.remove(&[key("2025-06-30")]).unwrap(), 0);
    }

    #[test]
    fn sqlite_errors_become_store_unavailable() {
        let db = Database::open_in_memory().unwrap();
        db.conn.execute_batch("DROP TABLE unavailable_dates").unwrap();
        let store = SqliteStore::new(db);
        assert!(matches!(
            store.list_unavailable(),
            Err(StoreError::Unavailable(_))
        ));
    }
}
