// ============================
// crates/auth-lib/src/storage.rs
// ============================
//! Local key-value storage with in-memory and flat-file implementations,
//! plus typed access to the persisted user list.
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use credstore_common::UserRecord;
use parking_lot::Mutex;
use thiserror::Error;

use crate::{error::AuthError, now_millis, sanitize};

/// Failure of the local store itself. Unlike remote failures this is
/// fatal: nothing in the engine works without local storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct StorageError(pub String);

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError(err.to_string())
    }
}

/// Durable, synchronous, process-local string-keyed storage.
///
/// Injected rather than global so tests can substitute [`MemoryStore`].
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and embedded use.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Flat-file implementation: one file per key under a root directory.
#[derive(Clone)]
pub struct FlatFileStore {
    root: PathBuf,
}

impl FlatFileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl LocalStore for FlatFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Typed access to the user list and its version timestamp.
///
/// Every read and write goes through the sanitizer, so the store never
/// holds a record violating the canonical-form invariants.
#[derive(Clone)]
pub struct UserStore {
    store: Arc<dyn LocalStore>,
    namespace: String,
}

impl UserStore {
    pub fn new(store: Arc<dyn LocalStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn users_key(&self) -> String {
        format!("{}.users", self.namespace)
    }

    pub fn version_key(&self) -> String {
        format!("{}.users.updatedAt", self.namespace)
    }

    pub fn session_key(&self) -> String {
        format!("{}.session", self.namespace)
    }

    /// Load the stored user list. Malformed JSON degrades to an empty
    /// list rather than erroring.
    pub fn load(&self) -> Result<Vec<UserRecord>, AuthError> {
        let raw = self.store.get(&self.users_key())?;
        let values = raw
            .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
            .and_then(|value| value.as_array().cloned())
            .unwrap_or_default();
        Ok(sanitize::sanitize(&values))
    }

    /// Persist the user list; `touch` bumps the store version to now.
    pub fn save(&self, users: &[UserRecord], touch: bool) -> Result<(), AuthError> {
        let clean = sanitize::sanitize_records(users.to_vec());
        let json = serde_json::to_string(&clean)?;
        self.store.set(&self.users_key(), &json)?;
        if touch {
            self.set_version(now_millis())?;
        }
        Ok(())
    }

    /// The store version; anything unparseable reads as 0.
    pub fn version(&self) -> Result<i64, AuthError> {
        let raw = self.store.get(&self.version_key())?;
        Ok(raw
            .and_then(|text| text.trim().parse::<i64>().ok())
            .unwrap_or(0))
    }

    pub fn set_version(&self, version: i64) -> Result<(), AuthError> {
        self.store.set(&self.version_key(), &version.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credstore_common::Credential;

    fn hashed(username: &str, updated_at: i64) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            credential: Credential::Hashed {
                password_hash: "ab".to_string(),
                salt: "cd".to_string(),
            },
            created_at: 1,
            updated_at,
        }
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn flat_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlatFileStore::new(dir.path()).unwrap();
        store.set("auth.users", "[]").unwrap();
        assert_eq!(store.get("auth.users").unwrap(), Some("[]".to_string()));

        // a second instance over the same root sees the data
        let reopened = FlatFileStore::new(dir.path()).unwrap();
        assert_eq!(reopened.get("auth.users").unwrap(), Some("[]".to_string()));

        reopened.remove("auth.users").unwrap();
        assert_eq!(store.get("auth.users").unwrap(), None);
        // removing an absent key is fine
        reopened.remove("auth.users").unwrap();
    }

    #[test]
    fn user_store_degrades_malformed_json_to_empty() {
        let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        store.set("auth.users", "not json").unwrap();
        let users = UserStore::new(Arc::clone(&store), "auth");
        assert!(users.load().unwrap().is_empty());

        store.set("auth.users", "{\"an\":\"object\"}").unwrap();
        assert!(users.load().unwrap().is_empty());
    }

    #[test]
    fn user_store_save_touch_bumps_version() {
        let users = UserStore::new(Arc::new(MemoryStore::new()), "auth");
        assert_eq!(users.version().unwrap(), 0);

        users.save(&[hashed("admin", 7)], false).unwrap();
        assert_eq!(users.version().unwrap(), 0);

        let before = now_millis();
        users.save(&[hashed("admin", 7)], true).unwrap();
        assert!(users.version().unwrap() >= before);

        let loaded = users.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].username, "admin");
    }

    #[test]
    fn user_store_version_tolerates_garbage() {
        let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        store.set("auth.users.updatedAt", "garbage").unwrap();
        let users = UserStore::new(store, "auth");
        assert_eq!(users.version().unwrap(), 0);
        users.set_version(42).unwrap();
        assert_eq!(users.version().unwrap(), 42);
    }
}
