//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::sync::Arc;
pub use syncstore::{
    json, DeleteOptions, FieldNames, Filter, GetAllQuery, Page, PaginationCursor, Record, Sort,
    Storage, StorageEngine, StoreError, Value, WriteOptions,
};
use syncstore::{MemoryBackend, SqliteBackend};
use tempfile::TempDir;

// ============================================================================
// TestStore - a storage plus whatever keeps it alive
// ============================================================================

/// A store under test, with the temp dir of its database file if any
pub struct TestStore {
    pub name: &'static str,
    pub storage: Arc<dyn Storage>,
    pub dir: Option<TempDir>,
}

impl TestStore {
    /// In-memory backend
    pub fn memory() -> Self {
        TestStore {
            name: "memory",
            storage: Arc::new(StorageEngine::new(MemoryBackend::new())),
            dir: None,
        }
    }

    /// SQLite backend on a fresh database file
    pub fn sqlite() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let backend =
            SqliteBackend::open(dir.path().join("store.db")).expect("Failed to open database");
        let storage = StorageEngine::new(backend);
        storage.initialize_schema().expect("Failed to create schema");
        TestStore {
            name: "sqlite",
            storage: Arc::new(storage),
            dir: Some(dir),
        }
    }

    /// One store per backend
    pub fn all() -> Vec<TestStore> {
        vec![TestStore::memory(), TestStore::sqlite()]
    }
}

impl std::ops::Deref for TestStore {
    type Target = dyn Storage;

    fn deref(&self) -> &Self::Target {
        self.storage.as_ref()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Build a record from a JSON object literal
pub fn rec(value: Value) -> Record {
    Record::from_value(value).expect("record literal must be an object")
}

/// Id of a record under default field names
pub fn id_of(record: &Record) -> String {
    record
        .id(&FieldNames::default())
        .expect("record must have an id")
        .to_string()
}

/// Version of a record under default field names
pub fn version_of(record: &Record) -> u64 {
    record
        .last_modified(&FieldNames::default())
        .expect("record must have a version")
}

/// Ids of a page, in order
pub fn ids(records: &[Record]) -> Vec<String> {
    records.iter().map(id_of).collect()
}

/// Fetch every page of `query` through cursor tokens, `limit` records at a time
pub fn fetch_all_pages(
    storage: &dyn Storage,
    collection: &str,
    parent: &str,
    query: &GetAllQuery,
    limit: usize,
) -> Vec<Record> {
    let mut collected = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let rules = match &token {
            Some(token) => PaginationCursor::from_token(token, &query.sorting, &query.fields)
                .expect("token must decode")
                .rules(),
            None => Vec::new(),
        };
        let page = storage
            .get_all(
                collection,
                parent,
                &query.clone().pagination_rules(rules).limit(limit),
            )
            .expect("get_all must succeed");
        collected.extend(page.records.iter().cloned());
        if page.is_last(Some(limit)) {
            return collected;
        }
        let last = page.last().expect("a full page has a last record");
        token = Some(PaginationCursor::after(last, &query.sorting, &query.fields).token());
    }
}
