//! Store configuration via `syncstore.toml`
//!
//! A flat TOML file selects the backend and its limits. Missing keys take
//! their defaults, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use syncstore_core::{Result, StoreError};
use syncstore_storage::{DEFAULT_DELETE_RATE, DEFAULT_MAX_FETCH_SIZE};

/// Config file name looked up by callers
pub const CONFIG_FILE_NAME: &str = "syncstore.toml";

/// Backend selected by the `backend` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Process memory, nothing persisted
    Memory,
    /// SQLite database at `sqlite_path`
    Sqlite,
}

/// Store configuration loaded from `syncstore.toml`.
///
/// # Example
///
/// ```toml
/// backend = "sqlite"
/// sqlite_path = "/var/lib/syncstore/store.db"
/// max_fetch_size = 10000
/// log_level = "info"
/// heartbeat_delete_rate = 0.6
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Backend: `"memory"` or `"sqlite"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Database file of the SQLite backend (`":memory:"` allowed).
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
    /// Most records a single `get_all` returns.
    #[serde(default = "default_max_fetch_size")]
    pub max_fetch_size: usize,
    /// Log verbosity: error, warn, info, debug or trace.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Probability that the heartbeat exercises the delete path.
    #[serde(default = "default_heartbeat_delete_rate")]
    pub heartbeat_delete_rate: f64,
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("syncstore.db")
}

fn default_max_fetch_size() -> usize {
    DEFAULT_MAX_FETCH_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_heartbeat_delete_rate() -> f64 {
    DEFAULT_DELETE_RATE
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            sqlite_path: default_sqlite_path(),
            max_fetch_size: default_max_fetch_size(),
            log_level: default_log_level(),
            heartbeat_delete_rate: default_heartbeat_delete_rate(),
        }
    }
}

impl StoreConfig {
    /// Parse the backend name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not `"memory"` or `"sqlite"`.
    pub fn backend_kind(&self) -> Result<BackendKind> {
        match self.backend.as_str() {
            "memory" => Ok(BackendKind::Memory),
            "sqlite" => Ok(BackendKind::Sqlite),
            other => Err(StoreError::config(format!(
                "Invalid backend '{}' in {}. Expected \"memory\" or \"sqlite\".",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Parse the log level.
    pub fn tracing_level(&self) -> Result<tracing::Level> {
        self.log_level.parse().map_err(|_| {
            StoreError::config(format!(
                "Invalid log_level '{}'. Expected error, warn, info, debug or trace.",
                self.log_level
            ))
        })
    }

    /// Check every value, not only the ones the selected backend reads.
    pub fn validate(&self) -> Result<()> {
        self.backend_kind()?;
        self.tracing_level()?;
        if !(0.0..=1.0).contains(&self.heartbeat_delete_rate) {
            return Err(StoreError::config(format!(
                "heartbeat_delete_rate must lie in [0, 1], got {}",
                self.heartbeat_delete_rate
            )));
        }
        if self.max_fetch_size == 0 {
            return Err(StoreError::config("max_fetch_size must be at least 1"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Syncstore configuration
#
# Backend: "memory" (default) or "sqlite"
#   "memory" = process memory, lost on restart
#   "sqlite" = database file at sqlite_path
backend = "memory"

# SQLite database file (":memory:" for a private in-memory database)
sqlite_path = "syncstore.db"

# Most records a single get_all returns, whatever the requested limit
max_fetch_size = 10000

# Log verbosity: error, warn, info, debug or trace
log_level = "info"

# Probability that the heartbeat probe deletes rather than creates
heartbeat_delete_rate = 0.6
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            StoreError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                StoreError::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StoreError::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
