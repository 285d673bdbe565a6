//! The storage capability interface
//!
//! Callers depend on `dyn Storage` and never on a concrete backend.

use syncstore_core::{
    DeleteOptions, FieldNames, Filter, GetAllQuery, Page, Record, Result, WriteOptions,
};

/// Versioned, multi-tenant record store
///
/// Every record operation addresses one collection through
/// `(collection_id, parent_id)`. Versions are per collection: unique,
/// strictly increasing in the order writes complete.
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait Storage: Send + Sync {
    /// Short name of the underlying backend
    fn backend_name(&self) -> &'static str;

    /// Provision backend structures; idempotent
    fn initialize_schema(&self) -> Result<()>;

    /// Remove all data across all collections
    fn flush(&self) -> Result<()>;

    /// Randomized write-or-delete self-test; never fails, returns health
    fn ping(&self) -> bool;

    /// Latest version of the collection, or a current-time baseline if it
    /// was never written
    fn collection_timestamp(&self, collection_id: &str, parent_id: &str) -> Result<u64>;

    /// Store a new record, assigning its id (if absent) and version
    ///
    /// # Errors
    ///
    /// - `UnicityConflict` if the id is already live or a unique field
    ///   constraint would be violated
    fn create(
        &self,
        collection_id: &str,
        parent_id: &str,
        record: Record,
        options: &WriteOptions,
    ) -> Result<Record>;

    /// Fetch a live record
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` if absent or tombstoned
    fn get(
        &self,
        collection_id: &str,
        parent_id: &str,
        object_id: &str,
        fields: &FieldNames,
    ) -> Result<Record>;

    /// Replace a record, creating it under `object_id` if it does not exist
    fn update(
        &self,
        collection_id: &str,
        parent_id: &str,
        object_id: &str,
        record: Record,
        options: &WriteOptions,
    ) -> Result<Record>;

    /// Delete a live record, leaving a tombstone unless `with_deleted` is off
    ///
    /// Returns the tombstone (id, deletion version, `deleted = true`).
    fn delete(
        &self,
        collection_id: &str,
        parent_id: &str,
        object_id: &str,
        options: &DeleteOptions,
    ) -> Result<Record>;

    /// Delete every live record matching all `filters`
    ///
    /// Returns one tombstone per deleted record, each with its own version.
    fn delete_all(
        &self,
        collection_id: &str,
        parent_id: &str,
        filters: &[Filter],
        options: &DeleteOptions,
    ) -> Result<Vec<Record>>;

    /// Permanently remove tombstones older than `before` (all when `None`)
    fn purge_deleted(&self, collection_id: &str, parent_id: &str, before: Option<u64>) -> Result<usize>;

    /// Filter, sort and paginate the collection
    fn get_all(&self, collection_id: &str, parent_id: &str, query: &GetAllQuery) -> Result<Page>;
}
