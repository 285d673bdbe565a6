//! In-memory backend
//!
//! Collections are sharded in a `DashMap` keyed by `(collection, parent)`,
//! each holding its records and tombstones in `FxHashMap`s behind its own
//! `RwLock`. Different collections never contend; writers on one collection
//! are serialized by the write lock, and readers see the state between two
//! writes.
//!
//! # Rollback
//!
//! A write mutates the collection in place and keeps an undo log. If the
//! closure returns `Err`, the log is replayed backwards before the lock is
//! released, so a failed write leaves nothing behind.
//!
//! Nothing survives the process: this backend is for tests, development
//! and single-process deployments.

use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use syncstore_core::{
    Backend, CollectionKey, CollectionTxn, CollectionView, Result, StoredRecord,
};

/// State of one collection
#[derive(Debug, Default)]
pub struct CollectionState {
    high_water: Option<u64>,
    records: FxHashMap<String, StoredRecord>,
    tombstones: FxHashMap<String, u64>,
}

impl CollectionView for CollectionState {
    fn high_water(&self) -> Result<Option<u64>> {
        Ok(self.high_water)
    }

    fn get_live(&self, id: &str) -> Result<Option<StoredRecord>> {
        Ok(self.records.get(id).cloned())
    }

    fn live_records(&self) -> Result<Vec<StoredRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn tombstones(&self) -> Result<Vec<(String, u64)>> {
        Ok(self
            .tombstones
            .iter()
            .map(|(id, version)| (id.clone(), *version))
            .collect())
    }
}

impl CollectionState {
    /// True when the collection was never written
    fn is_empty(&self) -> bool {
        self.high_water.is_none() && self.records.is_empty() && self.tombstones.is_empty()
    }
}

/// Inverse of one change, replayed on rollback
enum Undo {
    HighWater(Option<u64>),
    Live(String, Option<StoredRecord>),
    Tombstone(String, Option<u64>),
    Purged(Vec<(String, u64)>),
}

/// Write access to a locked collection
struct MemoryTxn<'a> {
    state: &'a mut CollectionState,
    undo: Vec<Undo>,
}

impl MemoryTxn<'_> {
    fn rollback(mut self) {
        while let Some(step) = self.undo.pop() {
            match step {
                Undo::HighWater(previous) => self.state.high_water = previous,
                Undo::Live(id, Some(previous)) => {
                    self.state.records.insert(id, previous);
                }
                Undo::Live(id, None) => {
                    self.state.records.remove(&id);
                }
                Undo::Tombstone(id, Some(previous)) => {
                    self.state.tombstones.insert(id, previous);
                }
                Undo::Tombstone(id, None) => {
                    self.state.tombstones.remove(&id);
                }
                Undo::Purged(entries) => self.state.tombstones.extend(entries),
            }
        }
    }
}

impl CollectionView for MemoryTxn<'_> {
    fn high_water(&self) -> Result<Option<u64>> {
        self.state.high_water()
    }

    fn get_live(&self, id: &str) -> Result<Option<StoredRecord>> {
        self.state.get_live(id)
    }

    fn live_records(&self) -> Result<Vec<StoredRecord>> {
        self.state.live_records()
    }

    fn tombstones(&self) -> Result<Vec<(String, u64)>> {
        self.state.tombstones()
    }
}

impl CollectionTxn for MemoryTxn<'_> {
    fn set_high_water(&mut self, version: u64) -> Result<()> {
        let previous = self.state.high_water.replace(version);
        self.undo.push(Undo::HighWater(previous));
        Ok(())
    }

    fn put_live(&mut self, record: StoredRecord) -> Result<()> {
        let id = record.id.clone();
        let previous = self.state.records.insert(id.clone(), record);
        self.undo.push(Undo::Live(id, previous));
        Ok(())
    }

    fn remove_live(&mut self, id: &str) -> Result<Option<StoredRecord>> {
        let previous = self.state.records.remove(id);
        if previous.is_some() {
            self.undo.push(Undo::Live(id.to_string(), previous.clone()));
        }
        Ok(previous)
    }

    fn put_tombstone(&mut self, id: &str, version: u64) -> Result<()> {
        let previous = self.state.tombstones.insert(id.to_string(), version);
        self.undo.push(Undo::Tombstone(id.to_string(), previous));
        Ok(())
    }

    fn remove_tombstone(&mut self, id: &str) -> Result<bool> {
        match self.state.tombstones.remove(id) {
            Some(previous) => {
                self.undo.push(Undo::Tombstone(id.to_string(), Some(previous)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn purge_tombstones(&mut self, before: Option<u64>) -> Result<usize> {
        let purged: Vec<(String, u64)> = match before {
            Some(before) => {
                let ids: Vec<String> = self
                    .state
                    .tombstones
                    .iter()
                    .filter(|(_, version)| **version < before)
                    .map(|(id, _)| id.clone())
                    .collect();
                ids.into_iter()
                    .filter_map(|id| self.state.tombstones.remove_entry(&id))
                    .collect()
            }
            None => self.state.tombstones.drain().collect(),
        };
        let count = purged.len();
        if count > 0 {
            self.undo.push(Undo::Purged(purged));
        }
        Ok(count)
    }
}

/// Backend keeping every collection in process memory
///
/// # Example
///
/// ```ignore
/// use syncstore_storage::{MemoryBackend, StorageEngine};
///
/// let storage = StorageEngine::new(MemoryBackend::new());
/// ```
#[derive(Default)]
pub struct MemoryBackend {
    collections: DashMap<CollectionKey, Arc<RwLock<CollectionState>>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of collections that have been written to
    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    fn collection(&self, key: &CollectionKey) -> Option<Arc<RwLock<CollectionState>>> {
        self.collections.get(key).map(|entry| Arc::clone(entry.value()))
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn initialize_schema(&self) -> Result<()> {
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.collections.clear();
        Ok(())
    }

    fn read<R, F>(&self, key: &CollectionKey, f: F) -> Result<R>
    where
        F: FnOnce(&dyn CollectionView) -> Result<R>,
    {
        match self.collection(key) {
            Some(collection) => {
                let state = collection.read();
                f(&*state)
            }
            None => f(&CollectionState::default()),
        }
    }

    fn write<R, F>(&self, key: &CollectionKey, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn CollectionTxn) -> Result<R>,
    {
        // Clone the Arc out so the DashMap shard lock is not held during f
        let collection = Arc::clone(self.collections.entry(key.clone()).or_default().value());
        let mut state = collection.write();
        let mut txn = MemoryTxn {
            state: &mut state,
            undo: Vec::new(),
        };
        match f(&mut txn) {
            Ok(result) => Ok(result),
            Err(e) => {
                txn.rollback();
                drop(state);
                drop(collection);
                // A failed write on a collection nobody else holds leaves no entry
                self.collections.remove_if(key, |_, c| {
                    Arc::strong_count(c) == 1 && c.read().is_empty()
                });
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("collections", &self.collections.len())
            .finish()
    }
}
