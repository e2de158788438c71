//! Key-value persistence.
//!
//! Everything the engine keeps lives under string keys holding JSON values:
//!
//! - `focus_settings` -> [`FocusSettings`](crate::FocusSettings)
//! - `focus_allowed_apps` -> ordered list of [`AllowedApp`](crate::AllowedApp)
//! - `focus_sessions_<YYYY-MM-DD>` -> finalized sessions started that day
//! - `focus_engine_state` -> the running session, pending break and cycle count
//!
//! Backends implement [`KeyValueStore`]. [`MemoryStore`] is the non-persisting
//! fallback, [`SqliteStore`] the durable one.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ConfigError, CoreError, Result, StorageError};

pub const KEY_PREFIX: &str = "focus_";
pub const SETTINGS_KEY: &str = "focus_settings";
pub const ALLOWED_APPS_KEY: &str = "focus_allowed_apps";
pub const ENGINE_STATE_KEY: &str = "focus_engine_state";
pub const SESSIONS_KEY_PREFIX: &str = "focus_sessions_";

/// History key for one calendar date.
pub fn sessions_key(date: NaiveDate) -> String {
    format!("{SESSIONS_KEY_PREFIX}{}", date.format("%Y-%m-%d"))
}

/// Keys removed by a full data reset.
pub fn is_focus_key(key: &str) -> bool {
    key.starts_with(KEY_PREFIX) || key.contains("focus")
}

/// One write in an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Set { key: String, value: String },
    Remove { key: String },
}

impl StoreOp {
    pub fn set_json<T: Serialize>(key: impl Into<String>, value: &T) -> Result<Self> {
        Ok(StoreOp::Set {
            key: key.into(),
            value: serde_json::to_string(value)?,
        })
    }

    pub fn key(&self) -> &str {
        match self {
            StoreOp::Set { key, .. } | StoreOp::Remove { key } => key,
        }
    }
}

/// Synchronous string key-value store.
///
/// Implementations use interior mutability so one store can be shared by
/// reference; all methods take `&self`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently present, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Apply every op or none of them.
    ///
    /// The default applies ops one by one and is only atomic for backends
    /// whose individual writes cannot fail; real backends override it.
    fn apply(&self, ops: &[StoreOp]) -> Result<(), StorageError> {
        for op in ops {
            match op {
                StoreOp::Set { key, value } => self.set(key, value)?,
                StoreOp::Remove { key } => self.remove(key)?,
            }
        }
        Ok(())
    }
}

/// Read and decode a JSON value. Missing keys are `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CoreError::CorruptRecord {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Returns the directory holding the database and `config.toml`.
///
/// `FOCUSPLUS_DATA_DIR` wins when set. Otherwise `~/.config/focusplus`, or
/// `~/.config/focusplus-dev` when `FOCUSPLUS_ENV=dev`.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSPLUS_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSPLUS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusplus-dev")
            } else {
                base_dir.join("focusplus")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
