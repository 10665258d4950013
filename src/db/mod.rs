use color_eyre::{eyre::eyre, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "UG9X_DB";

/// Resolve the database path: `$UG9X_DB`, then the user data directory
pub fn default_path() -> Result<PathBuf> {
  if let Some(path) = std::env::var_os(DB_PATH_ENV) {
    return Ok(PathBuf::from(path));
  }

  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("ug9x").join("ug9x.db"))
}

/// Open (creating if needed) the database at `path` and apply `schema`
pub fn open(path: &Path, schema: &str) -> Result<Connection> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .map_err(|e| eyre!("Failed to create database directory: {}", e))?;
  }

  let conn = Connection::open(path)
    .map_err(|e| eyre!("Failed to open database at {}: {}", path.display(), e))?;
  migrate(&conn, schema)?;

  Ok(conn)
}

/// Open a private in-memory database with `schema` applied
#[cfg(test)]
pub fn open_in_memory(schema: &str) -> Result<Connection> {
  let conn =
    Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory database: {}", e))?;
  migrate(&conn, schema)?;
  Ok(conn)
}

fn migrate(conn: &Connection, schema: &str) -> Result<()> {
  conn
    .execute_batch(schema)
    .map_err(|e| eyre!("Failed to run migrations: {}", e))
}
