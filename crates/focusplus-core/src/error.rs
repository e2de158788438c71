//! Core error types for focusplus-core.
//!
//! Every engine operation returns a typed [`Result`]; nothing in the library
//! panics on bad input or a failing store.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusplus-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A query that needs a running session was made while idle.
    #[error("No focus session is active")]
    NoActiveSession,

    /// The allowed-app registry has no entry with this id.
    #[error("Unknown app id: {0}")]
    UnknownAppId(String),

    /// Strict mode blocks ending a timed session before its target.
    #[error("Strict mode is on: session cannot end for another {remaining_ms} ms")]
    StrictModeActive { remaining_ms: u64 },

    /// The key-value store rejected a read or write.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// A stored value could not be decoded.
    #[error("Corrupt record under '{key}': {source}")]
    CorruptRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// Backend refused the write (quota, read-only media, ...)
    #[error("Write rejected: {0}")]
    WriteRejected(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the document
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Could not determine where data lives
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Invalid calendar date
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Range end precedes its start
    #[error("Invalid date range: {to} is before {from}")]
    InvalidRange {
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => match e.code {
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                    StorageError::Locked
                }
                rusqlite::ErrorCode::DiskFull | rusqlite::ErrorCode::ReadOnly => {
                    StorageError::WriteRejected(err.to_string())
                }
                _ => StorageError::QueryFailed(err.to_string()),
            },
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
