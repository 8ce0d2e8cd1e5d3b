//! File-backed store.
//!
//! All slots live in one JSON object file. Every write rewrites the whole
//! file via a temporary sibling, so a crash mid-write leaves the previous
//! snapshot intact. A missing or corrupt file reads as empty state.

use crate::{KeyValueStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// A single-file JSON key-value store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles; the file itself is the state.
    lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store backed by `path`. The file is created lazily on the
    /// first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// The path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> HashMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read store file, treating as empty");
                return HashMap::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(slots) => slots,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt store file, treating as empty");
                HashMap::new()
            }
        }
    }

    fn save(&self, slots: &HashMap<String, String>) -> StorageResult<()> {
        let raw = serde_json::to_string(slots)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.load().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut slots = self.load();
        slots.insert(key.to_string(), value.to_string());
        self.save(&slots)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut slots = self.load();
        if slots.remove(key).is_some() {
            self.save(&slots)?;
        }
        Ok(())
    }
}
