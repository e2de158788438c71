//! In-memory store.
//!
//! Used when nothing should outlive the process, and as the default test
//! backend.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{KeyValueStore, StoreOp};
use crate::error::StorageError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.lock().keys().cloned().collect())
    }

    fn apply(&self, ops: &[StoreOp]) -> Result<(), StorageError> {
        let mut entries = self.lock();
        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                StoreOp::Remove { key } => {
                    entries.remove(key);
                }
            }
        }
        Ok(())
    }
}
