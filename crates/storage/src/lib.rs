//! Storage layer for Syncstore
//!
//! This crate implements the record store on top of a pluggable backend:
//! - Storage: the object-safe capability interface callers depend on
//! - StorageEngine: ids, versions, uniqueness, tombstones and `get_all`
//!   over any `Backend`
//! - UnicityEnforcer: per-field uniqueness checked inside the write
//! - tombstone: soft deletes, sync merges and purging
//! - heartbeat: the randomized `ping` probe
//! - MemoryBackend: DashMap-sharded collections with per-collection locks

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod facade;
pub mod heartbeat;
pub mod memory;
pub mod tombstone;
pub mod unicity;

pub use engine::{StorageEngine, DEFAULT_MAX_FETCH_SIZE};
pub use facade::Storage;
pub use heartbeat::{HEARTBEAT_COLLECTION, DEFAULT_DELETE_RATE};
pub use memory::MemoryBackend;
pub use unicity::UnicityEnforcer;
