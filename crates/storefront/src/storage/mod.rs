//! Persistent key-value storage for client-side state.
//!
//! Mirrors browser local storage: string keys, string values, synchronous
//! access. Two backends are provided: [`MemoryStore`] for tests and
//! short-lived sessions, and [`FileStore`] which keeps one JSON file per key
//! under a directory.
//!
//! Typed access goes through [`load_or_default`] and [`save`], which read
//! leniently: a missing or corrupt entry yields the default value rather than
//! an error, the same way a page reload with garbage in storage simply starts
//! fresh.

pub mod keys;

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded.
    #[error("storage encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,

    /// Key contains characters that cannot map to a file name.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-process storage backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// Directory-backed storage: each key is a `<key>.json` file.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory this store writes into.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && !key
                .chars()
                .any(|c| c.is_control() || matches!(c, '/' | '\\' | ':'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // Write-then-rename so a crash never leaves a half-written entry.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Typed helpers
// =============================================================================

/// Load and decode a JSON value, falling back to `T::default()`.
///
/// Read failures and malformed JSON are logged and treated as absent.
pub fn load_or_default<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    load(store, key).unwrap_or_default()
}

/// Load and decode a JSON value; `None` if absent or unreadable.
pub fn load<T>(store: &dyn KeyValueStore, key: &str) -> Option<T>
where
    T: DeserializeOwned,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "Failed to read from storage");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Discarding malformed stored value");
            None
        }
    }
}

/// Encode a value as JSON and store it.
///
/// # Errors
///
/// Returns `StorageError` if encoding or writing fails.
pub fn save<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("cart").unwrap(), None);
        store.set("cart", "[]").unwrap();
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("[]"));
        store.remove("cart").unwrap();
        store.remove("cart").unwrap();
        assert_eq!(store.get("cart").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::open(dir.path()).unwrap().set("token", "\"abc\"").unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("\"abc\""));
        assert!(dir.path().join("token.json").exists());
    }

    #[test]
    fn test_file_store_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_corrupt_value_loads_as_default() {
        let store = MemoryStore::new();
        store.set("recently-viewed", "{not json").unwrap();
        let ids: Vec<String> = load_or_default(&store, "recently-viewed");
        assert!(ids.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        save(&store, "ids", &vec!["a", "b"]).unwrap();
        let ids: Vec<String> = load_or_default(&store, "ids");
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}
