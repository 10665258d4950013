//! Durable key-value storage for user preferences.
//!
//! The catalog keeps its favorites here, next to the theme preference and the
//! last problem report. Values are opaque strings; callers own the encoding.

mod prefs;

pub use prefs::{Report, ThemeMode};

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Trait for key-value storage backends.
pub trait KeyValueStore: Send + Sync {
  /// Read a value, `None` if the key was never written.
  fn get(&self, key: &str) -> Result<Option<String>>;

  /// Write a value, replacing any previous one.
  fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Store kept in process memory. Used by tests and when the database cannot
/// be opened.
#[derive(Debug, Default)]
pub struct MemoryStore {
  values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let values = self
      .values
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(values.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let mut values = self
      .values
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    values.insert(key.to_string(), value.to_string());
    Ok(())
  }
}

const KV_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// SQLite-backed key-value store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  pub fn open(path: &Path) -> Result<Self> {
    let conn = crate::db::open(path, KV_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn = crate::db::open_in_memory(KV_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }
}

impl KeyValueStore for SqliteStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .query_row(
        "SELECT value FROM local_storage WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read '{}': {}", key, e))
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO local_storage (key, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to write '{}': {}", key, e))?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn exercise(store: &dyn KeyValueStore) {
    assert_eq!(store.get("theme").unwrap(), None);

    store.set("theme", "dark").unwrap();
    assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));

    store.set("theme", "light").unwrap();
    assert_eq!(store.get("theme").unwrap().as_deref(), Some("light"));
    assert_eq!(store.get("favorites").unwrap(), None);
  }

  #[test]
  fn test_memory_store() {
    exercise(&MemoryStore::new());
  }

  #[test]
  fn test_sqlite_store() {
    exercise(&SqliteStore::open_in_memory().unwrap());
  }
}
