use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{validate_key, KeyValueStore, StoreError};

/// In-memory store. Clones share the same underlying map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        let docs = self.docs.read().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = docs.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        let docs = self.docs.read().unwrap_or_else(|e| e.into_inner());
        Ok(docs.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut docs = self.docs.write().unwrap_or_else(|e| e.into_inner());
        docs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut docs = self.docs.write().unwrap_or_else(|e| e.into_inner());
        docs.remove(key);
        Ok(())
    }
}
