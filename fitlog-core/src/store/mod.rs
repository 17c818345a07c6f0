//! Key-value document storage.
//!
//! Every persisted document is a JSON string stored under a string key. The
//! raw operations report failures; the typed helpers on [`KeyValueStore`]
//! absorb them. A corrupt or unreadable document reads as absent, a failed
//! write reads as `false`, and both are logged. Nothing above this layer has
//! to handle storage errors.

mod file;
mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors from the raw storage medium.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Synchronous string-keyed document storage.
pub trait KeyValueStore {
    /// Reads the raw document for `key`, `Ok(None)` if it does not exist.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the raw document for `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes `key`. Deleting a missing key succeeds.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Typed read. Missing, unreadable and corrupt documents are all `None`.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read '{}': {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring corrupt document '{}': {}", key, e);
                None
            }
        }
    }

    /// Typed write. Returns `false` if serialization or the write fails.
    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Failed to serialize '{}': {}", key, e);
                return false;
            }
        };

        match self.write(key, &raw) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to write '{}': {}", key, e);
                false
            }
        }
    }

    /// Removes `key`. Returns `true` when the key is gone afterwards.
    fn remove(&self, key: &str) -> bool {
        match self.delete(key) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to remove '{}': {}", key, e);
                false
            }
        }
    }

    /// Whether a document exists for `key`, regardless of whether it parses.
    fn contains(&self, key: &str) -> bool {
        matches!(self.read(key), Ok(Some(_)))
    }
}

/// Keys become file names, so path separators and traversal are rejected.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.contains(['/', '\\'])
        && !key.starts_with('.')
        && key != "..";
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("workouts").is_ok());
        assert!(validate_key("sync.accessToken").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key(".hidden").is_err());
    }

    #[test]
    fn test_typed_roundtrip() {
        let store = MemoryStore::new();
        let doc = Doc {
            name: "a".to_string(),
            count: 3,
        };

        assert!(store.set("doc", &doc));
        assert_eq!(store.get::<Doc>("doc"), Some(doc));
    }

    #[test]
    fn test_corrupt_document_reads_as_none() {
        let store = MemoryStore::new();
        store.write("doc", "{not json").unwrap();

        assert!(store.contains("doc"));
        assert_eq!(store.get::<Doc>("doc"), None);
    }

    #[test]
    fn test_wrong_shape_reads_as_none() {
        let store = MemoryStore::new();
        store.write("doc", r#"{"unexpected": true}"#).unwrap();

        assert_eq!(store.get::<Doc>("doc"), None);
    }

    #[test]
    fn test_remove_missing_key_succeeds() {
        let store = MemoryStore::new();
        assert!(store.remove("nothing"));
    }

    #[test]
    fn test_invalid_key_write_returns_false() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = FileStore::new(temp.path().to_path_buf());

        assert!(!store.set("../escape", &1));
        assert_eq!(store.get::<i32>("../escape"), None);
    }
}
