//! SQLite backend for Syncstore
//!
//! Every collection lives in shared tables keyed by
//! `(id, parent_id, collection_id)`. A write runs in an `IMMEDIATE`
//! transaction: SQLite takes the database write lock up front, so the
//! high-water read, the uniqueness scan and the insert cannot interleave
//! with another writer, in this process or any other sharing the file.
//! High-water marks are committed with the records, which keeps versions
//! increasing across restarts.
//!
//! Filtering, sorting and pagination are not pushed down to SQL; the
//! engine runs them over the collection's rows, so both backends answer
//! queries identically.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod collection;
pub mod schema;

use parking_lot::Mutex;
use rusqlite::{Connection, TransactionBehavior};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use syncstore_core::{Backend, CollectionKey, CollectionTxn, CollectionView, Result, StoreError};

use crate::collection::SqliteCollection;

/// How long a writer waits for another process's lock before giving up
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Path that opens a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

pub(crate) fn backend_error(e: rusqlite::Error) -> StoreError {
    StoreError::unavailable(format!("sqlite: {}", e))
}

/// Backend storing collections in a SQLite database
pub struct SqliteBackend {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) the database file at `path`; `":memory:"` opens a
    /// private in-memory database
    ///
    /// The schema is not created here; call `initialize_schema`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = if path.as_os_str() == OsStr::new(IN_MEMORY) {
            Connection::open_in_memory()
        } else {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            Connection::open(&path)
        }
        .map_err(backend_error)?;

        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT).map_err(backend_error)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(backend_error)?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(backend_error)?;

        tracing::debug!(path = %path.display(), "Opened SQLite database");
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::open(IN_MEMORY)
    }

    /// Database location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Schema version recorded in the database
    pub fn schema_version(&self) -> Result<Option<u32>> {
        schema::installed_version(&self.conn.lock())
    }
}

impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn initialize_schema(&self) -> Result<()> {
        schema::initialize(&mut self.conn.lock())
    }

    fn flush(&self) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(backend_error)?;
        tx.execute_batch(
            r#"
            DELETE FROM records;
            DELETE FROM deleted;
            DELETE FROM timestamps;
            "#,
        )
        .map_err(backend_error)?;
        tx.commit().map_err(backend_error)
    }

    fn read<R, F>(&self, key: &CollectionKey, f: F) -> Result<R>
    where
        F: FnOnce(&dyn CollectionView) -> Result<R>,
    {
        let mut conn = self.conn.lock();
        // Deferred transaction: a consistent snapshot, rolled back on drop
        let tx = conn.transaction().map_err(backend_error)?;
        let view = SqliteCollection::new(&tx, key);
        f(&view)
    }

    fn write<R, F>(&self, key: &CollectionKey, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn CollectionTxn) -> Result<R>,
    {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(backend_error)?;
        let result = {
            let mut txn = SqliteCollection::new(&tx, key);
            f(&mut txn)?
        };
        tx.commit().map_err(|e| {
            tracing::error!(collection = %key, error = %e, "SQLite commit failed");
            backend_error(e)
        })?;
        Ok(result)
    }
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("path", &self.path)
            .finish()
    }
}
