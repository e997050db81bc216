/// Persistent key-value store adapter.
///
/// gridcast keeps exactly two records: the logged-in user
/// ([`SESSION_USER_KEY`]) and the prediction history log
/// ([`PREDICTION_HISTORY_KEY`]). Values are JSON text. Callers only ever
/// get, set, or remove whole records.
///
/// [`FileStore`] keeps one `<key>.json` file per record in a directory
/// (`~/.gridcast/store` by default). [`MemoryStore`] backs tests.
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Storage key for the persisted session identity.
pub const SESSION_USER_KEY: &str = "powergrid_user";

/// Storage key for the persisted prediction history log.
pub const PREDICTION_HISTORY_KEY: &str = "prediction_history";

/// Minimal get/set/remove interface over a local persistent store.
pub trait KeyValueStore {
    /// Read a record. `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Create or replace a record.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a record. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Directory of JSON files, one per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.record_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                path,
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.record_path(key);
        let write_err = |source| StorageError::Write {
            key: key.to_string(),
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;

        // Write-then-rename so a crash never leaves a half-written record.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(write_err)?;
        fs::rename(&tmp, &path).map_err(write_err)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.record_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Write {
                key: key.to_string(),
                path,
                source,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile store for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.records.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> FileStore {
        let dir = std::env::temp_dir().join(format!(
            "gridcast-store-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        FileStore::new(dir)
    }

    #[test]
    fn memory_store_get_set_remove() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "[1]").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("[1]"));

        store.remove("k").unwrap();
        assert!(!store.contains("k"));
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let store = temp_store("missing");
        assert_eq!(store.get(PREDICTION_HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_round_trips_and_removes_file() {
        let mut store = temp_store("roundtrip");
        store.set(SESSION_USER_KEY, r#"{"username":"admin"}"#).unwrap();

        let path = store.record_path(SESSION_USER_KEY);
        assert!(path.exists());
        assert_eq!(
            store.get(SESSION_USER_KEY).unwrap().as_deref(),
            Some(r#"{"username":"admin"}"#)
        );

        store.remove(SESSION_USER_KEY).unwrap();
        assert!(!path.exists());
        // Removing twice is fine.
        store.remove(SESSION_USER_KEY).unwrap();

        let _ = fs::remove_dir_all(store.dir());
    }
}
