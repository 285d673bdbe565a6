//! Error types for the record store
//!
//! This module defines the single error type returned by every storage
//! operation. We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! ## Propagation
//!
//! - `RecordNotFound` and `UnicityConflict` are expected conditions the caller
//!   reacts to; they are never rewritten on the way up.
//! - `BackendUnavailable` is a catch-all for transient or internal backend
//!   failures. Only the heartbeat probe swallows it.

use std::io;
use thiserror::Error;

use crate::record::Record;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error types for the record store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted record does not exist or has been tombstoned
    #[error("Record not found: {id}")]
    RecordNotFound {
        /// Identifier that was looked up
        id: String,
    },

    /// A uniqueness constraint would be violated by the write
    #[error("Unicity conflict on {}", fields.join(", "))]
    UnicityConflict {
        /// Constrained fields the conflicting record shares
        fields: Vec<String>,
        /// The existing record the write collides with
        existing: Box<Record>,
    },

    /// Transient, connectivity or backend-internal failure
    #[error("Backend unavailable: {message}")]
    BackendUnavailable {
        /// Description of the underlying failure
        message: String,
    },

    /// Malformed caller input (bad token, non-object payload, ...)
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input
        message: String,
    },

    /// Configuration could not be loaded or is out of range
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong with the configuration
        message: String,
    },
}

impl StoreError {
    /// Record `id` is absent or tombstoned
    pub fn not_found(id: impl Into<String>) -> Self {
        StoreError::RecordNotFound { id: id.into() }
    }

    /// Write collides with `existing` on `fields`
    pub fn conflict(fields: Vec<String>, existing: Record) -> Self {
        StoreError::UnicityConflict {
            fields,
            existing: Box::new(existing),
        }
    }

    /// Backend failure
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::BackendUnavailable {
            message: message.into(),
        }
    }

    /// Malformed caller input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        StoreError::InvalidInput {
            message: message.into(),
        }
    }

    /// Configuration failure
    pub fn config(message: impl Into<String>) -> Self {
        StoreError::Config {
            message: message.into(),
        }
    }

    /// True for `RecordNotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::RecordNotFound { .. })
    }

    /// True for `UnicityConflict`
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::UnicityConflict { .. })
    }

    /// True for `BackendUnavailable`
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::BackendUnavailable { .. })
    }

    /// The existing record of a `UnicityConflict`
    pub fn conflicting_record(&self) -> Option<&Record> {
        match self {
            StoreError::UnicityConflict { existing, .. } => Some(existing),
            _ => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::unavailable(format!("I/O error: {}", e))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::invalid_input(format!("JSON error: {}", e))
    }
}
