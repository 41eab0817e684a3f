//! SQLite key-value storage implementation

use crate::Result;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

/// SQL to create the kv table
const CREATE_KV_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

/// SQLite-backed key-value store for named records
pub struct KvStore {
    conn: Connection,
}

impl KvStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(CREATE_KV_TABLE, [])?;
        Ok(())
    }

    /// Read the value stored under a name
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE name = ?1", [name], |row| {
                row.get(0)
            })
            .optional()
            .map_err(Into::into)
    }

    /// Insert or replace the value stored under a name
    pub fn put(&self, name: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (name, value) VALUES (?1, ?2)",
            params![name, value],
        )?;
        Ok(())
    }

    /// Delete a named record (no-op if absent)
    pub fn delete(&self, name: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE name = ?1", [name])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_returns_none() {
        let store = KvStore::open_in_memory().unwrap();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_put_get_roundtrip() {
        let store = KvStore::open_in_memory().unwrap();
        store.put("watchlist-storage", r#"{"version":1}"#).unwrap();
        assert_eq!(
            store.get("watchlist-storage").unwrap().as_deref(),
            Some(r#"{"version":1}"#)
        );
    }

    #[test]
    fn test_put_overwrites() {
        let store = KvStore::open_in_memory().unwrap();
        store.put("k", "one").unwrap();
        store.put("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = KvStore::open_in_memory().unwrap();
        store.put("k", "v").unwrap();
        store.delete("k").unwrap();
        store.delete("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn test_open_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.db");

        {
            let store = KvStore::open(&path).unwrap();
            store.put("k", "v").unwrap();
        }

        let reopened = KvStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
    }
}
