//! In-memory key-value store

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::error::{Error, Result};
use super::KeyValueStore;

/// Process-local store, mainly for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of stored keys
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self
            .entries
            .read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read()
            .map_err(|_| Error::Persistence("Memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!("Setting memory store key: {}", key);
        let mut entries = self.entries.write()
            .map_err(|_| Error::Persistence("Memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        debug!("Removing memory store key: {}", key);
        let mut entries = self.entries.write()
            .map_err(|_| Error::Persistence("Memory store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}
