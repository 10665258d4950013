//! Cache storage trait and its SQLite and in-memory implementations.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
#[cfg(test)]
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::types::{CachedResponse, Request, Response};

/// Trait for cache storage backends.
///
/// A backend holds named namespaces, each a map from request to response.
pub trait CacheStorage: Send + Sync + 'static {
  /// Create the namespace if it does not exist yet.
  fn open(&self, namespace: &str) -> Result<()>;

  /// All namespace names, oldest first.
  fn namespaces(&self) -> Result<Vec<String>>;

  /// Delete a namespace and its entries. Returns false if it did not exist.
  fn delete(&self, namespace: &str) -> Result<bool>;

  /// Look up a request in one namespace.
  fn get(&self, namespace: &str, request: &Request) -> Result<Option<CachedResponse>>;

  /// Look up a request across all namespaces, oldest first.
  fn lookup(&self, request: &Request) -> Result<Option<CachedResponse>> {
    for namespace in self.namespaces()? {
      if let Some(hit) = self.get(&namespace, request)? {
        return Ok(Some(hit));
      }
    }
    Ok(None)
  }

  /// Store a response, replacing any previous entry for the same request.
  /// Opens the namespace if needed.
  fn put(&self, namespace: &str, request: &Request, response: &Response) -> Result<()>;

  /// Store several entries at once: either all are written or none.
  fn put_all(&self, namespace: &str, entries: &[(Request, Response)]) -> Result<()>;

  /// URLs stored in a namespace.
  fn urls(&self, namespace: &str) -> Result<Vec<String>>;
}

/// In-memory storage for tests. Namespaces keep insertion order.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStorage {
  namespaces: Mutex<Vec<(String, HashMap<String, CachedResponse>)>>,
}

#[cfg(test)]
impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

#[cfg(test)]
impl CacheStorage for MemoryStorage {
  fn open(&self, namespace: &str) -> Result<()> {
    let mut namespaces = self
      .namespaces
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    if !namespaces.iter().any(|(name, _)| name == namespace) {
      namespaces.push((namespace.to_string(), HashMap::new()));
    }
    Ok(())
  }

  fn namespaces(&self) -> Result<Vec<String>> {
    let namespaces = self
      .namespaces
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(namespaces.iter().map(|(name, _)| name.clone()).collect())
  }

  fn delete(&self, namespace: &str) -> Result<bool> {
    let mut namespaces = self
      .namespaces
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let before = namespaces.len();
    namespaces.retain(|(name, _)| name != namespace);
    Ok(namespaces.len() != before)
  }

  fn get(&self, namespace: &str, request: &Request) -> Result<Option<CachedResponse>> {
    let namespaces = self
      .namespaces
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(
      namespaces
        .iter()
        .find(|(name, _)| name == namespace)
        .and_then(|(_, entries)| entries.get(&request.cache_key()).cloned()),
    )
  }

  fn put(&self, namespace: &str, request: &Request, response: &Response) -> Result<()> {
    self.put_all(namespace, &[(request.clone(), response.clone())])
  }

  fn put_all(&self, namespace: &str, entries: &[(Request, Response)]) -> Result<()> {
    let mut namespaces = self
      .namespaces
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let idx = match namespaces.iter().position(|(name, _)| name == namespace) {
      Some(idx) => idx,
      None => {
        namespaces.push((namespace.to_string(), HashMap::new()));
        namespaces.len() - 1
      }
    };

    let now = Utc::now();
    for (request, response) in entries {
      namespaces[idx].1.insert(
        request.cache_key(),
        CachedResponse {
          response: response.clone(),
          cached_at: now,
        },
      );
    }
    Ok(())
  }

  fn urls(&self, namespace: &str) -> Result<Vec<String>> {
    let namespaces = self
      .namespaces
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let mut urls: Vec<String> = namespaces
      .iter()
      .find(|(name, _)| name == namespace)
      .map(|(_, entries)| entries.values().map(|c| c.response.url.clone()).collect())
      .unwrap_or_default();
    urls.sort();
    Ok(urls)
  }
}

/// Schema for the offline cache tables.
const CACHE_SCHEMA: &str = r#"
-- Named cache namespaces, one per bundle version
CREATE TABLE IF NOT EXISTS cache_namespaces (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Stored responses, keyed by request hash
CREATE TABLE IF NOT EXISTS cache_entries (
    namespace TEXT NOT NULL,
    request_key TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (namespace, request_key)
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_namespace ON cache_entries(namespace);
"#;

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  pub fn open(path: &Path) -> Result<Self> {
    let conn = crate::db::open(path, CACHE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    let conn = crate::db::open_in_memory(CACHE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }
}

fn insert_namespace(conn: &Connection, namespace: &str) -> Result<()> {
  conn
    .execute(
      "INSERT OR IGNORE INTO cache_namespaces (name, created_at) VALUES (?, datetime('now'))",
      params![namespace],
    )
    .map_err(|e| eyre!("Failed to open cache '{}': {}", namespace, e))?;
  Ok(())
}

fn insert_entry(
  conn: &Connection,
  namespace: &str,
  request: &Request,
  response: &Response,
) -> Result<()> {
  conn
    .execute(
      "INSERT OR REPLACE INTO cache_entries
         (namespace, request_key, url, status, content_type, body, cached_at)
       VALUES (?, ?, ?, ?, ?, ?, datetime('now'))",
      params![
        namespace,
        request.cache_key(),
        response.url,
        response.status,
        response.content_type,
        response.body
      ],
    )
    .map_err(|e| eyre!("Failed to store {}: {}", request.url, e))?;
  Ok(())
}

impl CacheStorage for SqliteStorage {
  fn open(&self, namespace: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    insert_namespace(&conn, namespace)
  }

  fn namespaces(&self) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT name FROM cache_namespaces ORDER BY created_at, rowid")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let names = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list caches: {}", e))?
      .collect::<rusqlite::Result<Vec<String>>>()
      .map_err(|e| eyre!("Failed to read cache name: {}", e))?;

    Ok(names)
  }

  fn delete(&self, namespace: &str) -> Result<bool> {
    let mut conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;
    tx.execute(
      "DELETE FROM cache_entries WHERE namespace = ?",
      params![namespace],
    )
    .map_err(|e| eyre!("Failed to delete entries of '{}': {}", namespace, e))?;
    let removed = tx
      .execute(
        "DELETE FROM cache_namespaces WHERE name = ?",
        params![namespace],
      )
      .map_err(|e| eyre!("Failed to delete cache '{}': {}", namespace, e))?;
    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(removed > 0)
  }

  fn get(&self, namespace: &str, request: &Request) -> Result<Option<CachedResponse>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let row: Option<(String, u16, Option<String>, Vec<u8>, String)> = conn
      .query_row(
        "SELECT url, status, content_type, body, cached_at FROM cache_entries
         WHERE namespace = ? AND request_key = ?",
        params![namespace, request.cache_key()],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to query cache '{}': {}", namespace, e))?;

    match row {
      Some((url, status, content_type, body, cached_at)) => Ok(Some(CachedResponse {
        response: Response {
          url,
          status,
          content_type,
          body,
        },
        cached_at: parse_datetime(&cached_at)?,
      })),
      None => Ok(None),
    }
  }

  fn put(&self, namespace: &str, request: &Request, response: &Response) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    insert_namespace(&conn, namespace)?;
    insert_entry(&conn, namespace, request, response)
  }

  fn put_all(&self, namespace: &str, entries: &[(Request, Response)]) -> Result<()> {
    let mut conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;
    insert_namespace(&tx, namespace)?;
    for (request, response) in entries {
      insert_entry(&tx, namespace, request, response)?;
    }
    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn urls(&self, namespace: &str) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT url FROM cache_entries WHERE namespace = ? ORDER BY url")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let urls = stmt
      .query_map(params![namespace], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list entries: {}", e))?
      .collect::<rusqlite::Result<Vec<String>>>()
      .map_err(|e| eyre!("Failed to read entry: {}", e))?;

    Ok(urls)
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use url::Url;

  fn request(path: &str) -> Request {
    Request::get(Url::parse("https://games.example.org/").unwrap().join(path).unwrap())
  }

  fn response(path: &str, body: &str) -> Response {
    Response {
      url: format!("https://games.example.org{}", path),
      status: 200,
      content_type: Some("text/plain".to_string()),
      body: body.as_bytes().to_vec(),
    }
  }

  fn exercise(storage: &dyn CacheStorage) {
    storage.open("ug9x-v0").unwrap();
    storage.open("ug9x-v1").unwrap();
    storage.open("ug9x-v0").unwrap();
    assert_eq!(storage.namespaces().unwrap(), vec!["ug9x-v0", "ug9x-v1"]);

    storage
      .put("ug9x-v1", &request("/app.js"), &response("/app.js", "v1"))
      .unwrap();
    let hit = storage.get("ug9x-v1", &request("/app.js")).unwrap().unwrap();
    assert_eq!(hit.response.body, b"v1");
    assert!(storage.get("ug9x-v0", &request("/app.js")).unwrap().is_none());

    // Last writer wins
    storage
      .put("ug9x-v1", &request("/app.js"), &response("/app.js", "v1.1"))
      .unwrap();
    let hit = storage.lookup(&request("/app.js")).unwrap().unwrap();
    assert_eq!(hit.response.body, b"v1.1");

    storage
      .put_all(
        "ug9x-v1",
        &[
          (request("/"), response("/", "index")),
          (request("/styles.css"), response("/styles.css", "css")),
        ],
      )
      .unwrap();
    assert_eq!(
      storage.urls("ug9x-v1").unwrap(),
      vec![
        "https://games.example.org/",
        "https://games.example.org/app.js",
        "https://games.example.org/styles.css",
      ]
    );

    assert!(storage.delete("ug9x-v1").unwrap());
    assert!(!storage.delete("ug9x-v1").unwrap());
    assert_eq!(storage.namespaces().unwrap(), vec!["ug9x-v0"]);
    assert!(storage.lookup(&request("/app.js")).unwrap().is_none());
  }

  #[test]
  fn test_memory_storage() {
    exercise(&MemoryStorage::new());
  }

  #[test]
  fn test_sqlite_storage() {
    exercise(&SqliteStorage::open_in_memory().unwrap());
  }

  #[test]
  fn test_put_creates_namespace() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage
      .put("fresh", &request("/"), &response("/", "index"))
      .unwrap();
    assert_eq!(storage.namespaces().unwrap(), vec!["fresh"]);
  }

  #[test]
  fn test_parse_datetime() {
    let dt = parse_datetime("2024-03-01 12:30:45").unwrap();
    assert_eq!(dt.to_rfc3339(), "2024-03-01T12:30:45+00:00");
    assert!(parse_datetime("yesterday").is_err());
  }
}
