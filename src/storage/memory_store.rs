//! In-process key-value store
//!
//! Session-scoped analog: contents live exactly as long as the store
//! instance does. Also the backend used by most tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StorageError;

use super::{check_quota, KeyValueStore};

/// Map-backed store with an optional capacity in bytes
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Unlimited store
    pub fn new() -> Self {
        Self::with_quota(None)
    }

    pub fn with_quota(quota: Option<usize>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota,
        }
    }

    /// Total bytes currently held, counting keys and values
    pub fn usage(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        let current: usize = entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        check_quota(key, value, current, self.quota)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
