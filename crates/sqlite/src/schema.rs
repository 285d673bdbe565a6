//! Table layout and schema versioning
//!
//! Live records and tombstones sit in separate tables so a `get_all`
//! without tombstones never touches them. The per-collection high-water
//! mark has its own table: it must outlive the records that produced it.

use rusqlite::{params, Connection, OptionalExtension};
use syncstore_core::{Result, StoreError};

use crate::backend_error;

/// Version written to `metadata` by this release
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS metadata (
  name TEXT PRIMARY KEY,
  value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS records (
  id TEXT NOT NULL,
  parent_id TEXT NOT NULL,
  collection_id TEXT NOT NULL,
  last_modified INTEGER NOT NULL,
  data TEXT NOT NULL DEFAULT '{}',
  PRIMARY KEY (id, parent_id, collection_id)
);
CREATE INDEX IF NOT EXISTS idx_records_parent_collection
  ON records(parent_id, collection_id);

CREATE TABLE IF NOT EXISTS deleted (
  id TEXT NOT NULL,
  parent_id TEXT NOT NULL,
  collection_id TEXT NOT NULL,
  last_modified INTEGER NOT NULL,
  PRIMARY KEY (id, parent_id, collection_id)
);
CREATE INDEX IF NOT EXISTS idx_deleted_last_modified
  ON deleted(parent_id, collection_id, last_modified);

CREATE TABLE IF NOT EXISTS timestamps (
  parent_id TEXT NOT NULL,
  collection_id TEXT NOT NULL,
  last_modified INTEGER NOT NULL,
  PRIMARY KEY (parent_id, collection_id)
);
"#;

/// Schema version recorded in the database, if the schema exists
pub fn installed_version(conn: &Connection) -> Result<Option<u32>> {
    let has_metadata: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'metadata'",
            [],
            |row| row.get(0),
        )
        .map_err(backend_error)?;
    if !has_metadata {
        return Ok(None);
    }
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE name = 'storage_schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(backend_error)?;
    match value {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| StoreError::unavailable(format!("corrupt schema version '{}'", v))),
    }
}

/// Create the schema if missing; no-op when already current
pub fn initialize(conn: &mut Connection) -> Result<()> {
    match installed_version(conn)? {
        Some(SCHEMA_VERSION) => {
            tracing::info!(version = SCHEMA_VERSION, "SQLite schema up to date");
            Ok(())
        }
        Some(other) => Err(StoreError::unavailable(format!(
            "database schema version {} is not supported (expected {})",
            other, SCHEMA_VERSION
        ))),
        None => {
            let tx = conn.transaction().map_err(backend_error)?;
            tx.execute_batch(SCHEMA).map_err(backend_error)?;
            tx.execute(
                "INSERT OR REPLACE INTO metadata (name, value) VALUES ('storage_schema_version', ?1)",
                params![SCHEMA_VERSION.to_string()],
            )
            .map_err(backend_error)?;
            tx.commit().map_err(backend_error)?;
            tracing::info!(version = SCHEMA_VERSION, "Created SQLite schema");
            Ok(())
        }
    }
}
