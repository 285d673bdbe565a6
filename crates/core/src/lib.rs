//! Core types and traits for Syncstore
//!
//! This crate defines the foundational types used throughout the system:
//! - Record: JSON object with engine-assigned id and version fields
//! - FieldNames: per-call names of the id / version / tombstone fields
//! - CollectionKey: (collection, parent) partition key
//! - Filter, Comparison, Sort, Direction, PaginationRule: query description
//! - GetAllQuery, Page, WriteOptions, DeleteOptions: operation parameters
//! - StoreError: error type hierarchy
//! - Traits: Backend, CollectionView, CollectionTxn, IdGenerator, RandomSource

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod options;
pub mod query;
pub mod random;
pub mod record;
pub mod traits;

pub use error::{Result, StoreError};
pub use id::{IdGenerator, Uuid4};
pub use options::{DeleteOptions, WriteOptions};
pub use query::{Comparison, Direction, Filter, GetAllQuery, Page, PaginationRule, Sort};
pub use random::{FixedRandom, RandomSource, ThreadRandom};
pub use record::{
    json_type_name, CollectionKey, FieldNames, Record, DEFAULT_DELETED_FIELD, DEFAULT_ID_FIELD,
    DEFAULT_MODIFIED_FIELD,
};
pub use traits::{Backend, CollectionTxn, CollectionView, StoredRecord};

pub use serde_json::{json, Map, Value};
