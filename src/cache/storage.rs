//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// A cached asset body with its metadata.
#[derive(Debug, Clone)]
pub struct CachedAsset {
  /// Byte-exact copy of the response body
  pub body: Vec<u8>,
  /// Content type as reported by the origin, if any
  pub content_type: Option<String>,
  /// When the copy was stored
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// Entries are keyed by (generation, path). A generation is one versioned
/// snapshot of the asset set; exactly one is active at a time.
pub trait CacheStorage: Send + Sync {
  /// Store an asset body, replacing any prior copy under the same key.
  fn store_asset(
    &self,
    generation: &str,
    path: &str,
    content_type: Option<&str>,
    body: &[u8],
  ) -> Result<()>;

  /// Look up an asset by (generation, path).
  fn get_asset(&self, generation: &str, path: &str) -> Result<Option<CachedAsset>>;

  /// Every generation tag currently present in the store.
  fn list_generations(&self) -> Result<Vec<String>>;

  /// Drop a whole generation and all its assets.
  fn delete_generation(&self, generation: &str) -> Result<()>;
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

/// File name of the cache database inside the data directory.
const CACHE_DB_FILE: &str = "cache.db";

impl SqliteStorage {
  /// Open (or create) the cache database under the data directory.
  pub fn open(data_dir: &Path) -> Result<Self> {
    std::fs::create_dir_all(data_dir)
      .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;

    let path = data_dir.join(CACHE_DB_FILE);
    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// In-memory store for tests.
  #[cfg(test)]
  pub fn in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- Byte-exact asset copies, one row per (generation, path)
CREATE TABLE IF NOT EXISTS asset_cache (
    generation TEXT NOT NULL,
    path TEXT NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (generation, path)
);

CREATE INDEX IF NOT EXISTS idx_asset_cache_generation
    ON asset_cache(generation);
"#;

impl CacheStorage for SqliteStorage {
  fn store_asset(
    &self,
    generation: &str,
    path: &str,
    content_type: Option<&str>,
    body: &[u8],
  ) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO asset_cache (generation, path, content_type, body, cached_at)
         VALUES (?, ?, ?, ?, datetime('now'))",
        params![generation, path, content_type, body],
      )
      .map_err(|e| eyre!("Failed to store asset: {}", e))?;

    Ok(())
  }

  fn get_asset(&self, generation: &str, path: &str) -> Result<Option<CachedAsset>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare(
        "SELECT body, content_type, cached_at FROM asset_cache
         WHERE generation = ? AND path = ?",
      )
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let result: Option<(Vec<u8>, Option<String>, String)> = stmt
      .query_row(params![generation, path], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
      })
      .ok();

    match result {
      Some((body, content_type, cached_at_str)) => {
        let cached_at = parse_datetime(&cached_at_str)?;
        Ok(Some(CachedAsset {
          body,
          content_type,
          cached_at,
        }))
      }
      None => Ok(None),
    }
  }

  fn list_generations(&self) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT DISTINCT generation FROM asset_cache ORDER BY generation")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let generations: Vec<String> = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to query generations: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(generations)
  }

  fn delete_generation(&self, generation: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "DELETE FROM asset_cache WHERE generation = ?",
        params![generation],
      )
      .map_err(|e| eyre!("Failed to delete generation: {}", e))?;

    Ok(())
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

  #[test]
  fn test_store_and_get() {
    let storage = SqliteStorage::in_memory().unwrap();
    storage
      .store_asset("v1", "index.html", Some("text/html"), b"<html>")
      .unwrap();

    let asset = storage.get_asset("v1", "index.html").unwrap().unwrap();
    assert_eq!(asset.body, b"<html>");
    assert_eq!(asset.content_type.as_deref(), Some("text/html"));
  }

  #[test]
  fn test_miss_on_other_generation() {
    let storage = SqliteStorage::in_memory().unwrap();
    storage
      .store_asset("v1", "index.html", None, b"<html>")
      .unwrap();
    assert!(storage.get_asset("v2", "index.html").unwrap().is_none());
  }

  #[test]
  fn test_store_replaces_prior_copy() {
    let storage = SqliteStorage::in_memory().unwrap();
    storage.store_asset("v1", "a.js", None, b"old").unwrap();
    storage.store_asset("v1", "a.js", None, b"new").unwrap();
    let asset = storage.get_asset("v1", "a.js").unwrap().unwrap();
    assert_eq!(asset.body, b"new");
  }

  #[test]
  fn test_list_and_delete_generations() {
    let storage = SqliteStorage::in_memory().unwrap();
    storage.store_asset("v1", "a", None, b"1").unwrap();
    storage.store_asset("v2", "a", None, b"2").unwrap();
    assert_eq!(storage.list_generations().unwrap(), vec!["v1", "v2"]);

    storage.delete_generation("v1").unwrap();
    assert_eq!(storage.list_generations().unwrap(), vec!["v2"]);
    assert!(storage.get_asset("v1", "a").unwrap().is_none());
    assert!(storage.get_asset("v2", "a").unwrap().is_some());
  }

}
