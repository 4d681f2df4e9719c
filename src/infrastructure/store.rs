//! Persistent payload store.
//!
//! Holds the download ledger (file name → confirmed download time) and the
//! current payload selection. Every mutation commits before the call
//! returns, so a finished download is durable the moment its caller sees
//! success and a crash never reports an undone download as done.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{AppError, Result};

/// Payload store repository using SQLite.
pub struct PayloadStore {
    conn: Mutex<Connection>,
}

impl PayloadStore {
    /// Opens or creates the payload store database.
    ///
    /// A missing file is not an error: the schema is created and the
    /// ledger starts empty.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or schema creation
    /// fails.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create store directory", e))?;
        }

        let conn = Connection::open(path).map_err(AppError::store)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(AppError::store)?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;

        Ok(store)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        self.lock_conn()
            .execute_batch(
                r"
            -- Ledger of confirmed downloads, keyed by canonical file name
            CREATE TABLE IF NOT EXISTS payloads (
                file_name TEXT PRIMARY KEY,
                downloaded_at TEXT NOT NULL
            );

            -- Current payload selection (single row)
            CREATE TABLE IF NOT EXISTS selection (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                path TEXT
            );

            INSERT OR IGNORE INTO selection (id, path) VALUES (1, NULL);
            ",
            )
            .map_err(AppError::store)?;

        Ok(())
    }

    /// Whether `file_name` is recorded as downloaded.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn contains(&self, file_name: &str) -> Result<bool> {
        self.lock_conn()
            .query_row(
                "SELECT 1 FROM payloads WHERE file_name = ?1",
                [file_name],
                |_| Ok(()),
            )
            .optional()
            .map(|row| row.is_some())
            .map_err(AppError::store)
    }

    /// Record a confirmed download. Idempotent: recording an already
    /// present name is a no-op success.
    ///
    /// # Errors
    /// Returns error if the insert fails.
    pub fn record(&self, file_name: &str, downloaded_at: DateTime<Utc>) -> Result<()> {
        self.lock_conn()
            .execute(
                "INSERT OR IGNORE INTO payloads (file_name, downloaded_at) VALUES (?1, ?2)",
                params![file_name, downloaded_at.to_rfc3339()],
            )
            .map_err(AppError::store)?;

        Ok(())
    }

    /// Bulk idempotent insert of confirmed file names, in one transaction.
    ///
    /// # Errors
    /// Returns error if the transaction fails.
    pub fn merge<'a>(&self, file_names: impl IntoIterator<Item = &'a String>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock_conn();
        let tx = conn.transaction().map_err(AppError::store)?;

        for file_name in file_names {
            tx.execute(
                "INSERT OR IGNORE INTO payloads (file_name, downloaded_at) VALUES (?1, ?2)",
                params![file_name, now],
            )
            .map_err(AppError::store)?;
        }

        tx.commit().map_err(AppError::store)
    }

    /// Snapshot of all recorded file names.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn downloaded_set(&self) -> Result<std::collections::BTreeSet<String>> {
        let conn = self.lock_conn();
        let mut stmt = conn
            .prepare("SELECT file_name FROM payloads ORDER BY file_name")
            .map_err(AppError::store)?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(AppError::store)?;

        let mut names = std::collections::BTreeSet::new();
        for row in rows {
            names.insert(row.map_err(AppError::store)?);
        }

        Ok(names)
    }

    /// When `file_name` was recorded as downloaded, if ever.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn downloaded_at(&self, file_name: &str) -> Result<Option<DateTime<Utc>>> {
        let recorded: Option<String> = self
            .lock_conn()
            .query_row(
                "SELECT downloaded_at FROM payloads WHERE file_name = ?1",
                [file_name],
                |row| row.get(0),
            )
            .optional()
            .map_err(AppError::store)?;

        Ok(recorded
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// The currently selected payload path, if any.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn selection(&self) -> Result<Option<PathBuf>> {
        let path: Option<String> = self
            .lock_conn()
            .query_row("SELECT path FROM selection WHERE id = 1", [], |row| {
                row.get(0)
            })
            .map_err(AppError::store)?;

        Ok(path.map(PathBuf::from))
    }

    /// Replace the current payload selection.
    ///
    /// # Errors
    /// Returns error if the update fails.
    pub fn set_selection(&self, path: &Path) -> Result<()> {
        self.lock_conn()
            .execute(
                "UPDATE selection SET path = ?1 WHERE id = 1",
                [path.to_string_lossy().into_owned()],
            )
            .map_err(AppError::store)?;

        Ok(())
    }

    /// Clear the current payload selection.
    ///
    /// # Errors
    /// Returns error if the update fails.
    pub fn clear_selection(&self) -> Result<()> {
        self.lock_conn()
            .execute("UPDATE selection SET path = NULL WHERE id = 1", [])
            .map_err(AppError::store)?;

        Ok(())
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("payloads.db");

        let store = PayloadStore::open(&db_path).unwrap();

        assert!(store.downloaded_set().unwrap().is_empty());
        assert_eq!(store.selection().unwrap(), None);
    }

    #[test]
    fn test_reopen_preserves_ledger() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("payloads.db");

        {
            let store = PayloadStore::open(&db_path).unwrap();
            store.record("hekate.bin", Utc::now()).unwrap();
        }

        let store = PayloadStore::open(&db_path).unwrap();
        assert!(store.contains("hekate.bin").unwrap());
    }

    #[test]
    fn test_record_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = PayloadStore::open(&dir.path().join("payloads.db")).unwrap();

        let first = Utc::now();
        store.record("hekate.bin", first).unwrap();
        store.record("hekate.bin", Utc::now()).unwrap();

        let set = store.downloaded_set().unwrap();
        assert_eq!(set.len(), 1);
        // The original timestamp survives the duplicate insert.
        let recorded = store.downloaded_at("hekate.bin").unwrap().unwrap();
        assert_eq!(recorded.timestamp(), first.timestamp());
    }

    #[test]
    fn test_merge_only_adds() {
        let dir = tempdir().unwrap();
        let store = PayloadStore::open(&dir.path().join("payloads.db")).unwrap();
        store.record("existing.bin", Utc::now()).unwrap();

        let names = vec!["hekate.bin".to_string(), "lockpick.bin".to_string()];
        store.merge(&names).unwrap();
        store.merge(&names).unwrap();

        let set = store.downloaded_set().unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains("existing.bin"));
        assert!(set.contains("hekate.bin"));
        assert!(set.contains("lockpick.bin"));
    }

    #[test]
    fn test_selection_roundtrip() {
        let dir = tempdir().unwrap();
        let store = PayloadStore::open(&dir.path().join("payloads.db")).unwrap();

        store.set_selection(Path::new("/tmp/hekate.bin")).unwrap();
        assert_eq!(
            store.selection().unwrap(),
            Some(PathBuf::from("/tmp/hekate.bin"))
        );

        store.clear_selection().unwrap();
        assert_eq!(store.selection().unwrap(), None);
    }
}
