//! Local key-value persistence.
//!
//! The journal persists exactly one value (the serialized photo list), but
//! the layer is a plain string key-value store so the photo store never
//! knows where its bytes live.
//!
//! - [`FileStorage`]: one file per key inside a data directory.
//! - [`MemoryStorage`]: a `HashMap`, for tests and throwaway sessions.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// String key-value persistence.
pub trait KeyValueStore {
    /// Read the value stored under `key`. `Ok(None)` if it was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes a sibling temp file and renames it over the old blob.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

/// In-memory storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a value, e.g. a corrupt blob in tests.
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut storage = Self::new();
        storage.values.insert(key.to_string(), value.to_string());
        storage
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_storage_missing_key_is_none() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::open(tmp.path()).unwrap();
        assert_eq!(storage.get("travelPhotos").unwrap(), None);
    }

    #[test]
    fn file_storage_set_then_get() {
        let tmp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(tmp.path()).unwrap();
        storage.set("travelPhotos", "[]").unwrap();
        assert_eq!(storage.get("travelPhotos").unwrap().as_deref(), Some("[]"));
        assert!(tmp.path().join("travelPhotos.json").exists());
    }

    #[test]
    fn file_storage_overwrite_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(tmp.path()).unwrap();
        storage.set("travelPhotos", "[1]").unwrap();
        storage.set("travelPhotos", "[1,2]").unwrap();
        assert_eq!(storage.get("travelPhotos").unwrap().as_deref(), Some("[1,2]"));
        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["travelPhotos.json"]);
    }

    #[test]
    fn file_storage_failed_write_keeps_previous_value() {
        let tmp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(tmp.path()).unwrap();
        storage.set("travelPhotos", "[1]").unwrap();
        // A directory in the temp file's place makes the write fail
        fs::create_dir(tmp.path().join("travelPhotos.json.tmp")).unwrap();
        assert!(storage.set("travelPhotos", "[1,2]").is_err());
        assert_eq!(storage.get("travelPhotos").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn file_storage_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b");
        FileStorage::open(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let tmp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(tmp.path()).unwrap();
        assert!(matches!(
            storage.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(storage.get("").is_err());
    }

    #[test]
    fn memory_storage_overwrites() {
        let mut storage = MemoryStorage::new();
        storage.set("k", "1").unwrap();
        storage.set("k", "2").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("2"));
    }
}
