//! StorageEngine: record semantics over any backend
//!
//! The engine owns everything a backend should not have to know about:
//! id assignment, version stamping, uniqueness, tombstones, the `get_all`
//! pipeline and the heartbeat. Each mutation is a single `Backend::write`
//! closure, so the uniqueness check, the version bump and the store happen
//! as one atomic step per collection.

use serde_json::Value;
use std::sync::Arc;
use syncstore_concurrency::{Clock, TimestampAuthority};
use syncstore_core::{
    Backend, CollectionKey, CollectionTxn, DeleteOptions, FieldNames, Filter, GetAllQuery,
    IdGenerator, Page, RandomSource, Record, Result, StoreError, StoredRecord, ThreadRandom,
    Uuid4, WriteOptions,
};
use syncstore_query::{execute, matches_all};

use crate::facade::Storage;
use crate::heartbeat::{self, DEFAULT_DELETE_RATE};
use crate::tombstone;
use crate::unicity::UnicityEnforcer;

/// Default cap on the number of records one `get_all` returns
pub const DEFAULT_MAX_FETCH_SIZE: usize = 10_000;

/// Record store over backend `B`
///
/// # Example
///
/// ```ignore
/// use syncstore_storage::{MemoryBackend, Storage, StorageEngine};
/// use syncstore_core::{json, Record, WriteOptions};
///
/// let storage = StorageEngine::new(MemoryBackend::new());
/// let record = Record::from_value(json!({"title": "hello"}))?;
/// let created = storage.create("articles", "alice", record, &WriteOptions::new())?;
/// ```
pub struct StorageEngine<B: Backend> {
    backend: B,
    timestamps: TimestampAuthority,
    id_generator: Arc<dyn IdGenerator>,
    random: Arc<dyn RandomSource>,
    max_fetch_size: Option<usize>,
    heartbeat_delete_rate: f64,
}

impl<B: Backend> StorageEngine<B> {
    /// Engine with the system clock, UUID ids and default limits
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            timestamps: TimestampAuthority::system(),
            id_generator: Arc::new(Uuid4),
            random: Arc::new(ThreadRandom),
            max_fetch_size: Some(DEFAULT_MAX_FETCH_SIZE),
            heartbeat_delete_rate: DEFAULT_DELETE_RATE,
        }
    }

    /// Read versions from `clock`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.timestamps = TimestampAuthority::new(clock);
        self
    }

    /// Default id generator for records created without an id
    pub fn with_id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = generator;
        self
    }

    /// Randomness of the heartbeat probe
    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Cap `get_all` pages (`None` lifts the cap)
    pub fn with_max_fetch_size(mut self, max: Option<usize>) -> Self {
        self.max_fetch_size = max;
        self
    }

    /// Probability that `ping` exercises the delete path
    pub fn with_heartbeat_delete_rate(mut self, rate: f64) -> Self {
        self.heartbeat_delete_rate = rate;
        self
    }

    /// The underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn generator<'a>(&'a self, options: &'a WriteOptions) -> &'a dyn IdGenerator {
        match &options.id_generator {
            Some(generator) => generator.as_ref(),
            None => self.id_generator.as_ref(),
        }
    }

    /// Bump the collection version inside `txn` and persist it
    fn next_version(&self, txn: &mut dyn CollectionTxn) -> Result<u64> {
        let version = self.timestamps.bump(txn.high_water()?);
        txn.set_high_water(version)?;
        Ok(version)
    }
}

/// Identifier carried by a record about to be created, if any
fn supplied_id(record: &Record, fields: &FieldNames) -> Result<Option<String>> {
    match record.get(&fields.id) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) if !id.is_empty() => Ok(Some(id.clone())),
        Some(other) => Err(StoreError::invalid_input(format!(
            "record {} must be a non-empty string, got {}",
            fields.id, other
        ))),
    }
}

impl<B: Backend> Storage for StorageEngine<B> {
    fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn initialize_schema(&self) -> Result<()> {
        self.backend.initialize_schema()?;
        tracing::info!(backend = self.backend.name(), "Storage schema initialized");
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.backend.flush()?;
        tracing::info!(backend = self.backend.name(), "Storage flushed");
        Ok(())
    }

    fn ping(&self) -> bool {
        heartbeat::probe(self, self.random.as_ref(), self.heartbeat_delete_rate)
    }

    fn collection_timestamp(&self, collection_id: &str, parent_id: &str) -> Result<u64> {
        let key = CollectionKey::new(collection_id, parent_id);
        let high_water = self.backend.read(&key, |view| view.high_water())?;
        Ok(self.timestamps.current(high_water))
    }

    fn create(
        &self,
        collection_id: &str,
        parent_id: &str,
        record: Record,
        options: &WriteOptions,
    ) -> Result<Record> {
        let key = CollectionKey::new(collection_id, parent_id);
        let fields = &options.fields;
        let id = match supplied_id(&record, fields)? {
            Some(id) => id,
            None => self.generator(options).generate(),
        };
        let enforcer = UnicityEnforcer::new(&options.unique_fields, fields);

        let created = self.backend.write(&key, |txn| {
            if let Some(existing) = txn.get_live(&id)? {
                return Err(StoreError::conflict(
                    vec![fields.id.clone()],
                    existing.to_record(fields),
                ));
            }
            enforcer.check(&*txn, &record, &id, fields)?;
            let version = self.next_version(txn)?;
            tombstone::revive(txn, &id)?;
            let stored = StoredRecord::new(id.as_str(), version, record, fields);
            let created = stored.to_record(fields);
            txn.put_live(stored)?;
            Ok(created)
        })?;

        tracing::debug!(
            collection = collection_id,
            parent = parent_id,
            id = %id,
            version = created.last_modified(fields),
            "Record created"
        );
        Ok(created)
    }

    fn get(
        &self,
        collection_id: &str,
        parent_id: &str,
        object_id: &str,
        fields: &FieldNames,
    ) -> Result<Record> {
        let key = CollectionKey::new(collection_id, parent_id);
        self.backend
            .read(&key, |view| view.get_live(object_id))?
            .map(|stored| stored.to_record(fields))
            .ok_or_else(|| StoreError::not_found(object_id))
    }

    fn update(
        &self,
        collection_id: &str,
        parent_id: &str,
        object_id: &str,
        record: Record,
        options: &WriteOptions,
    ) -> Result<Record> {
        if object_id.is_empty() {
            return Err(StoreError::invalid_input("record id must not be empty"));
        }
        let key = CollectionKey::new(collection_id, parent_id);
        let fields = &options.fields;
        let enforcer = UnicityEnforcer::new(&options.unique_fields, fields);

        let (updated, existed) = self.backend.write(&key, |txn| {
            enforcer.check(&*txn, &record, object_id, fields)?;
            let existed = txn.get_live(object_id)?.is_some();
            let version = self.next_version(txn)?;
            if !existed {
                tombstone::revive(txn, object_id)?;
            }
            let stored = StoredRecord::new(object_id, version, record, fields);
            let updated = stored.to_record(fields);
            txn.put_live(stored)?;
            Ok((updated, existed))
        })?;

        tracing::debug!(
            collection = collection_id,
            parent = parent_id,
            id = object_id,
            version = updated.last_modified(fields),
            created = !existed,
            "Record updated"
        );
        Ok(updated)
    }

    fn delete(
        &self,
        collection_id: &str,
        parent_id: &str,
        object_id: &str,
        options: &DeleteOptions,
    ) -> Result<Record> {
        let key = CollectionKey::new(collection_id, parent_id);
        let fields = &options.fields;

        let deleted = self.backend.write(&key, |txn| {
            if txn.get_live(object_id)?.is_none() {
                return Err(StoreError::not_found(object_id));
            }
            let version = self.next_version(txn)?;
            if options.with_deleted {
                tombstone::bury(txn, object_id, version, fields)
            } else {
                txn.remove_live(object_id)?;
                Ok(Record::tombstone(object_id, version, fields))
            }
        })?;

        tracing::debug!(
            collection = collection_id,
            parent = parent_id,
            id = object_id,
            version = deleted.last_modified(fields),
            soft = options.with_deleted,
            "Record deleted"
        );
        Ok(deleted)
    }

    fn delete_all(
        &self,
        collection_id: &str,
        parent_id: &str,
        filters: &[Filter],
        options: &DeleteOptions,
    ) -> Result<Vec<Record>> {
        let key = CollectionKey::new(collection_id, parent_id);
        let fields = &options.fields;

        let deleted = self.backend.write(&key, |txn| {
            let mut ids: Vec<String> = txn
                .live_records()?
                .into_iter()
                .filter(|stored| filters.is_empty() || matches_all(&stored.to_record(fields), filters))
                .map(|stored| stored.id)
                .collect();
            ids.sort();

            let mut deleted = Vec::with_capacity(ids.len());
            for id in &ids {
                let version = self.next_version(txn)?;
                if options.with_deleted {
                    deleted.push(tombstone::bury(txn, id, version, fields)?);
                } else {
                    txn.remove_live(id)?;
                    deleted.push(Record::tombstone(id, version, fields));
                }
            }
            Ok(deleted)
        })?;

        tracing::debug!(
            collection = collection_id,
            parent = parent_id,
            count = deleted.len(),
            soft = options.with_deleted,
            "Records deleted"
        );
        Ok(deleted)
    }

    fn purge_deleted(&self, collection_id: &str, parent_id: &str, before: Option<u64>) -> Result<usize> {
        let key = CollectionKey::new(collection_id, parent_id);
        let count = self.backend.write(&key, |txn| tombstone::purge(txn, before))?;
        tracing::debug!(
            collection = collection_id,
            parent = parent_id,
            before,
            count,
            "Tombstones purged"
        );
        Ok(count)
    }

    fn get_all(&self, collection_id: &str, parent_id: &str, query: &GetAllQuery) -> Result<Page> {
        let key = CollectionKey::new(collection_id, parent_id);
        let candidates = self.backend.read(&key, |view| {
            tombstone::candidates(view, query.include_deleted, &query.fields)
        })?;
        Ok(execute(candidates, query, self.max_fetch_size))
    }
}

impl<B: Backend + std::fmt::Debug> std::fmt::Debug for StorageEngine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("backend", &self.backend)
            .field("timestamps", &self.timestamps)
            .field("max_fetch_size", &self.max_fetch_size)
            .field("heartbeat_delete_rate", &self.heartbeat_delete_rate)
            .finish()
    }
}
