//! Persistent storage of per-session code buffers
//!
//! Code is stored under a [`SessionKey`] in a synchronous key/value backend,
//! the way a browser keeps it in origin-scoped local storage. Two backends are
//! provided: [`MemoryStorage`] and the JSON-file backed [`FileStorage`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::config::DEFAULT_STORAGE_PREFIX;
use crate::error::{CodepadError, Result};

/// Identifies one persisted code buffer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub task_id: String,
    pub problem_id: String,
}

impl SessionKey {
    /// Create a new session key
    pub fn new(task_id: impl Into<String>, problem_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            problem_id: problem_id.into(),
        }
    }

    /// Storage key under the given namespace prefix.
    ///
    /// The task id is length-prefixed, so identifiers may contain any
    /// character (including the `_` separator) without two pairs colliding.
    pub fn storage_key(&self, prefix: &str) -> String {
        format!(
            "{}{}:{}_{}",
            prefix,
            self.task_id.len(),
            self.task_id,
            self.problem_id
        )
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.task_id, self.problem_id)
    }
}

/// Whether a persisted entry counts as "saved": present and non-blank.
///
/// Only this check trims; stored text is always kept verbatim.
pub fn is_saved(entry: Option<&str>) -> bool {
    entry.is_some_and(|text| !text.trim().is_empty())
}

/// Raw origin-scoped key/value storage
pub trait StorageBackend: Send + Sync {
    /// Read an item, `None` when absent
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write an item, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove an item; removing an absent item is not an error
    fn remove_item(&self, key: &str) -> Result<()>;

    /// All keys currently stored
    fn keys(&self) -> Result<Vec<String>>;
}

/// Code persistence keyed by (task, problem)
pub trait SessionStore: Send + Sync {
    /// Persisted text for the key, `None` when never saved
    fn get(&self, key: &SessionKey) -> Result<Option<String>>;

    /// Persist text verbatim
    fn set(&self, key: &SessionKey, text: &str) -> Result<()>;

    /// Remove the persisted entry
    fn clear(&self, key: &SessionKey) -> Result<()>;
}

/// [`SessionStore`] over any [`StorageBackend`] with a namespaced key scheme
pub struct KeyValueSessionStore {
    backend: Arc<dyn StorageBackend>,
    prefix: String,
}

impl KeyValueSessionStore {
    /// Create a store using the default namespace prefix
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_prefix(backend, DEFAULT_STORAGE_PREFIX)
    }

    /// Create a store using a custom namespace prefix
    pub fn with_prefix(backend: Arc<dyn StorageBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    /// Namespace prefix in use
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl SessionStore for KeyValueSessionStore {
    fn get(&self, key: &SessionKey) -> Result<Option<String>> {
        self.backend.get_item(&key.storage_key(&self.prefix))
    }

    fn set(&self, key: &SessionKey, text: &str) -> Result<()> {
        tracing::debug!("Persisting {} bytes for {}", text.len(), key);
        self.backend.set_item(&key.storage_key(&self.prefix), text)
    }

    fn clear(&self, key: &SessionKey) -> Result<()> {
        tracing::debug!("Clearing persisted code for {}", key);
        self.backend.remove_item(&key.storage_key(&self.prefix))
    }
}

/// In-process storage backend
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .read()
            .map_err(|_| CodepadError::storage("Memory storage lock poisoned"))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| CodepadError::storage("Memory storage lock poisoned"))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| CodepadError::storage("Memory storage lock poisoned"))?;
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let items = self
            .items
            .read()
            .map_err(|_| CodepadError::storage("Memory storage lock poisoned"))?;
        Ok(items.keys().cloned().collect())
    }
}

/// Storage backend persisted as a JSON object file.
///
/// The whole map is rewritten on every mutation; reads are served from memory.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the storage file, starting empty when it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                CodepadError::Storage(format!(
                    "Failed to read storage file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    CodepadError::Storage(format!(
                        "Corrupt storage file {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(
            "Opened storage file {} with {} entries",
            path.display(),
            items.len()
        );

        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CodepadError::Storage(format!("Failed to create storage directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(items)?;
        std::fs::write(&self.path, content).map_err(|e| {
            CodepadError::Storage(format!(
                "Failed to write storage file {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .read()
            .map_err(|_| CodepadError::storage("File storage lock poisoned"))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| CodepadError::storage("File storage lock poisoned"))?;
        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&items) {
            // keep memory in line with what is on disk
            match previous {
                Some(previous) => items.insert(key.to_string(), previous),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| CodepadError::storage("File storage lock poisoned"))?;
        if let Some(previous) = items.remove(key) {
            if let Err(e) = self.flush(&items) {
                items.insert(key.to_string(), previous);
                return Err(e);
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let items = self
            .items
            .read()
            .map_err(|_| CodepadError::storage("File storage lock poisoned"))?;
        Ok(items.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn memory_store() -> KeyValueSessionStore {
        KeyValueSessionStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_set_get_clear() {
        let store = memory_store();
        let key = SessionKey::new("1", "a");

        assert_eq!(store.get(&key).unwrap(), None);

        store.set(&key, "print(1)\n").unwrap();
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("print(1)\n"));

        store.clear(&key).unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[test]
    fn test_empty_string_is_distinct_from_absent() {
        let store = memory_store();
        let key = SessionKey::new("1", "a");

        store.set(&key, "").unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(String::new()));
        assert!(!is_saved(store.get(&key).unwrap().as_deref()));
    }

    #[test]
    fn test_stored_text_is_not_trimmed() {
        let store = memory_store();
        let key = SessionKey::new("1", "a");

        store.set(&key, "   \n\t").unwrap();
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("   \n\t"));
    }

    #[test]
    fn test_keys_do_not_collide() {
        let first = SessionKey::new("a_b", "c");
        let second = SessionKey::new("a", "b_c");
        assert_ne!(
            first.storage_key(DEFAULT_STORAGE_PREFIX),
            second.storage_key(DEFAULT_STORAGE_PREFIX)
        );

        let store = memory_store();
        store.set(&first, "first").unwrap();
        store.set(&second, "second").unwrap();
        assert_eq!(store.get(&first).unwrap().as_deref(), Some("first"));
        assert_eq!(store.get(&second).unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_same_problem_under_different_tasks() {
        let store = memory_store();
        store.set(&SessionKey::new("1", "p"), "one").unwrap();
        assert_eq!(store.get(&SessionKey::new("2", "p")).unwrap(), None);
    }

    #[test]
    fn test_is_saved() {
        assert!(!is_saved(None));
        assert!(!is_saved(Some("")));
        assert!(!is_saved(Some("  \n ")));
        assert!(is_saved(Some(" x ")));
    }

    #[test]
    fn test_file_storage_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let key = SessionKey::new("7", "2");

        {
            let backend = Arc::new(FileStorage::open(&path).unwrap());
            let store = KeyValueSessionStore::new(backend);
            store.set(&key, "x = 1").unwrap();
        }

        let backend = Arc::new(FileStorage::open(&path).unwrap());
        let store = KeyValueSessionStore::new(backend.clone());
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("x = 1"));

        store.clear(&key).unwrap();
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_storage_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStorage::open(&path).unwrap_err();
        assert!(matches!(err, CodepadError::Storage(_)));
    }
}
