//! Syncstore - multi-tenant versioned record store for sync services
//!
//! Records are JSON objects grouped in collections scoped to a parent
//! (tenant, user, bucket). Every write stamps a per-collection version that
//! only moves forward, deletions leave tombstones, and `get_all` pages
//! through filtered, sorted results with seek cursors, so a client can pull
//! "everything changed since version V" without gaps.
//!
//! # Quick Start
//!
//! ```ignore
//! use syncstore::{json, open, Filter, GetAllQuery, Record, StoreConfig, WriteOptions};
//!
//! let storage = open(&StoreConfig::default())?;
//! let record = Record::from_value(json!({"title": "hello"}))?;
//! let created = storage.create("articles", "alice", record, &WriteOptions::new())?;
//!
//! let since = storage.collection_timestamp("articles", "alice")?;
//! let changes = storage.get_all(
//!     "articles",
//!     "alice",
//!     &GetAllQuery::new()
//!         .filter(Filter::since(&Default::default(), since))
//!         .include_deleted(true),
//! )?;
//! ```
//!
//! # Architecture
//!
//! Callers hold an `Arc<dyn Storage>`. `StorageEngine` implements it over
//! any `Backend` (in-memory or SQLite); backends only provide atomic
//! per-collection reads and writes.

pub use syncstore_concurrency::{Clock, ManualClock, SystemClock, TimestampAuthority};
pub use syncstore_core::*;
pub use syncstore_engine::{
    logging, open, BackendKind, BoundPermissions, MemoryPermission, ObjectPermissions,
    PermissionBackend, StoreConfig, CONFIG_FILE_NAME,
};
pub use syncstore_query::PaginationCursor;
pub use syncstore_sqlite::SqliteBackend;
pub use syncstore_storage::{
    MemoryBackend, Storage, StorageEngine, UnicityEnforcer, DEFAULT_MAX_FETCH_SIZE,
    HEARTBEAT_COLLECTION,
};
