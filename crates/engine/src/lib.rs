//! Store assembly for Syncstore
//!
//! This crate turns a configuration into a running store:
//! - StoreConfig: `syncstore.toml` loading and validation
//! - open: backend selection, schema initialization
//! - logging: tracing subscriber setup
//! - permission: principals, ACEs and authorization checks

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod logging;
pub mod permission;

pub use config::{BackendKind, StoreConfig, CONFIG_FILE_NAME};
pub use permission::{BoundPermissions, MemoryPermission, ObjectPermissions, PermissionBackend};

use std::sync::Arc;
use syncstore_core::Result;
use syncstore_sqlite::SqliteBackend;
use syncstore_storage::{MemoryBackend, Storage, StorageEngine};

/// Build the configured store, ready for use
///
/// Validates `config`, opens the backend and runs `initialize_schema`.
pub fn open(config: &StoreConfig) -> Result<Arc<dyn Storage>> {
    config.validate()?;
    let storage: Arc<dyn Storage> = match config.backend_kind()? {
        BackendKind::Memory => Arc::new(
            StorageEngine::new(MemoryBackend::new())
                .with_max_fetch_size(Some(config.max_fetch_size))
                .with_heartbeat_delete_rate(config.heartbeat_delete_rate),
        ),
        BackendKind::Sqlite => Arc::new(
            StorageEngine::new(SqliteBackend::open(&config.sqlite_path)?)
                .with_max_fetch_size(Some(config.max_fetch_size))
                .with_heartbeat_delete_rate(config.heartbeat_delete_rate),
        ),
    };
    storage.initialize_schema()?;
    tracing::info!(backend = storage.backend_name(), "Store opened");
    Ok(storage)
}
