//! Backend abstraction
//!
//! A backend only knows how to hold the state of each collection and how to
//! run a closure against it atomically. Everything with semantics (version
//! stamping, uniqueness, tombstones, filtering, pagination) sits above it in
//! `StorageEngine`, so swapping the in-memory map for SQLite does not change
//! behaviour.
//!
//! ## Atomicity
//!
//! `Backend::write` is the unit of concurrency control: two `write` calls on
//! the same collection never interleave, and either every change made by the
//! closure becomes visible or none does (the closure returning `Err` rolls
//! back). `Backend::read` sees a consistent snapshot of one collection.

use crate::error::Result;
use crate::record::{CollectionKey, FieldNames, Record};

/// A live record as a backend holds it: engine fields kept apart from data
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Identifier
    pub id: String,
    /// Version of the last write
    pub last_modified: u64,
    /// Caller fields, without the identifier and version fields
    pub data: Record,
}

impl StoredRecord {
    /// Split engine fields out of `record`
    pub fn new(id: impl Into<String>, last_modified: u64, mut data: Record, fields: &FieldNames) -> Self {
        data.remove(&fields.id);
        data.remove(&fields.modified);
        Self {
            id: id.into(),
            last_modified,
            data,
        }
    }

    /// Rebuild the caller-visible record under the given field names
    pub fn to_record(&self, fields: &FieldNames) -> Record {
        let mut record = self.data.clone();
        record.stamp(&self.id, self.last_modified, fields);
        record
    }
}

/// Read access to one collection
pub trait CollectionView {
    /// Highest version ever assigned in this collection, if any
    fn high_water(&self) -> Result<Option<u64>>;

    /// Live record by id
    fn get_live(&self, id: &str) -> Result<Option<StoredRecord>>;

    /// Every live record, in no particular order
    fn live_records(&self) -> Result<Vec<StoredRecord>>;

    /// Every tombstone as `(id, version)`, in no particular order
    fn tombstones(&self) -> Result<Vec<(String, u64)>>;
}

/// Write access to one collection, inside the backend's atomic unit
pub trait CollectionTxn: CollectionView {
    /// Record a new high-water version
    fn set_high_water(&mut self, version: u64) -> Result<()>;

    /// Insert or overwrite a live record
    fn put_live(&mut self, record: StoredRecord) -> Result<()>;

    /// Remove a live record, returning it
    fn remove_live(&mut self, id: &str) -> Result<Option<StoredRecord>>;

    /// Insert or replace the tombstone of `id`
    fn put_tombstone(&mut self, id: &str, version: u64) -> Result<()>;

    /// Remove the tombstone of `id`; true if there was one
    fn remove_tombstone(&mut self, id: &str) -> Result<bool>;

    /// Remove tombstones older than `before` (all when `None`), returning the count
    fn purge_tombstones(&mut self, before: Option<u64>) -> Result<usize>;
}

/// Storage backend: holds collections and runs closures against them atomically
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait Backend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Provision backend structures; idempotent
    fn initialize_schema(&self) -> Result<()>;

    /// Remove every collection, record, tombstone and high-water mark
    fn flush(&self) -> Result<()>;

    /// Run `f` against a consistent view of one collection
    fn read<R, F>(&self, key: &CollectionKey, f: F) -> Result<R>
    where
        F: FnOnce(&dyn CollectionView) -> Result<R>;

    /// Run `f` atomically against one collection, serialized with other writers
    fn write<R, F>(&self, key: &CollectionKey, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn CollectionTxn) -> Result<R>;
}
