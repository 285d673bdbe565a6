//! One collection seen through an open SQLite transaction

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use syncstore_core::{
    CollectionKey, CollectionTxn, CollectionView, Record, Result, StoreError, StoredRecord,
};

use crate::backend_error;

/// Versions are stored as SQLite INTEGER (i64)
fn to_sql(version: u64) -> Result<i64> {
    i64::try_from(version)
        .map_err(|_| StoreError::unavailable(format!("version {} exceeds storage range", version)))
}

fn from_sql(version: i64) -> Result<u64> {
    u64::try_from(version)
        .map_err(|_| StoreError::unavailable(format!("negative version {} in storage", version)))
}

fn decode(id: String, version: i64, data: &str) -> Result<StoredRecord> {
    let map: Map<String, Value> = serde_json::from_str(data)
        .map_err(|e| StoreError::unavailable(format!("corrupt record {}: {}", id, e)))?;
    Ok(StoredRecord {
        id,
        last_modified: from_sql(version)?,
        data: Record::from(map),
    })
}

/// Collection operations bound to a transaction's connection
pub(crate) struct SqliteCollection<'c> {
    conn: &'c Connection,
    key: &'c CollectionKey,
}

impl<'c> SqliteCollection<'c> {
    pub(crate) fn new(conn: &'c Connection, key: &'c CollectionKey) -> Self {
        Self { conn, key }
    }
}

impl CollectionView for SqliteCollection<'_> {
    fn high_water(&self) -> Result<Option<u64>> {
        let version: Option<i64> = self
            .conn
            .query_row(
                "SELECT last_modified FROM timestamps WHERE parent_id = ?1 AND collection_id = ?2",
                params![self.key.parent_id, self.key.collection_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend_error)?;
        version.map(from_sql).transpose()
    }

    fn get_live(&self, id: &str) -> Result<Option<StoredRecord>> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                r#"
                SELECT last_modified, data
                FROM records
                WHERE id = ?1 AND parent_id = ?2 AND collection_id = ?3
                "#,
                params![id, self.key.parent_id, self.key.collection_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(backend_error)?;
        row.map(|(version, data)| decode(id.to_string(), version, &data))
            .transpose()
    }

    fn live_records(&self) -> Result<Vec<StoredRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                r#"
                SELECT id, last_modified, data
                FROM records
                WHERE parent_id = ?1 AND collection_id = ?2
                "#,
            )
            .map_err(backend_error)?;
        let rows = stmt
            .query_map(params![self.key.parent_id, self.key.collection_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(backend_error)?;

        let mut records = Vec::new();
        for row in rows {
            let (id, version, data) = row.map_err(backend_error)?;
            records.push(decode(id, version, &data)?);
        }
        Ok(records)
    }

    fn tombstones(&self) -> Result<Vec<(String, u64)>> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT id, last_modified FROM deleted WHERE parent_id = ?1 AND collection_id = ?2",
            )
            .map_err(backend_error)?;
        let rows = stmt
            .query_map(params![self.key.parent_id, self.key.collection_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(backend_error)?;

        let mut tombstones = Vec::new();
        for row in rows {
            let (id, version) = row.map_err(backend_error)?;
            tombstones.push((id, from_sql(version)?));
        }
        Ok(tombstones)
    }
}

impl CollectionTxn for SqliteCollection<'_> {
    fn set_high_water(&mut self, version: u64) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO timestamps (parent_id, collection_id, last_modified)
                VALUES (?1, ?2, ?3)
                ON CONFLICT (parent_id, collection_id)
                DO UPDATE SET last_modified = excluded.last_modified
                "#,
                params![self.key.parent_id, self.key.collection_id, to_sql(version)?],
            )
            .map_err(backend_error)?;
        Ok(())
    }

    fn put_live(&mut self, record: StoredRecord) -> Result<()> {
        let data = serde_json::to_string(record.data.as_map())
            .map_err(|e| StoreError::invalid_input(format!("record is not serializable: {}", e)))?;
        self.conn
            .execute(
                r#"
                INSERT INTO records (id, parent_id, collection_id, last_modified, data)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT (id, parent_id, collection_id)
                DO UPDATE SET last_modified = excluded.last_modified, data = excluded.data
                "#,
                params![
                    record.id,
                    self.key.parent_id,
                    self.key.collection_id,
                    to_sql(record.last_modified)?,
                    data
                ],
            )
            .map_err(backend_error)?;
        Ok(())
    }

    fn remove_live(&mut self, id: &str) -> Result<Option<StoredRecord>> {
        let existing = self.get_live(id)?;
        if existing.is_some() {
            self.conn
                .execute(
                    "DELETE FROM records WHERE id = ?1 AND parent_id = ?2 AND collection_id = ?3",
                    params![id, self.key.parent_id, self.key.collection_id],
                )
                .map_err(backend_error)?;
        }
        Ok(existing)
    }

    fn put_tombstone(&mut self, id: &str, version: u64) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO deleted (id, parent_id, collection_id, last_modified)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (id, parent_id, collection_id)
                DO UPDATE SET last_modified = excluded.last_modified
                "#,
                params![id, self.key.parent_id, self.key.collection_id, to_sql(version)?],
            )
            .map_err(backend_error)?;
        Ok(())
    }

    fn remove_tombstone(&mut self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM deleted WHERE id = ?1 AND parent_id = ?2 AND collection_id = ?3",
                params![id, self.key.parent_id, self.key.collection_id],
            )
            .map_err(backend_error)?;
        Ok(removed > 0)
    }

    fn purge_tombstones(&mut self, before: Option<u64>) -> Result<usize> {
        let removed = match before {
            // Stored versions never exceed i64::MAX, so a larger bound purges all
            Some(before) => self.conn.execute(
                "DELETE FROM deleted WHERE parent_id = ?1 AND collection_id = ?2 AND last_modified < ?3",
                params![
                    self.key.parent_id,
                    self.key.collection_id,
                    i64::try_from(before).unwrap_or(i64::MAX)
                ],
            ),
            None => self.conn.execute(
                "DELETE FROM deleted WHERE parent_id = ?1 AND collection_id = ?2",
                params![self.key.parent_id, self.key.collection_id],
            ),
        }
        .map_err(backend_error)?;
        Ok(removed)
    }
}
