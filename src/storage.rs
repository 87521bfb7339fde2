use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StorageError;

pub const TICKETS_KEY: &str = "ticketapp_tickets";
pub const SESSION_KEY: &str = "ticketapp_session";
pub const USERS_KEY: &str = "ticketapp_users";

/// A string-valued key-value partition. Every write replaces the entire
/// value for the key; there are no partial updates, which is what makes
/// last-write-wins the consistency model for concurrent writers.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One file per key under the partition directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).map_err(|source| StorageError::WriteFailed {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(FileStorage { dir: dir.to_path_buf() })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::ReadFailed {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Write to a temp file in the same directory, then rename over the
        // target, so a key never holds a partially written value.
        let path = self.key_path(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        let write = fs::write(&tmp, value).and_then(|_| fs::rename(&tmp, &path));
        write.map_err(|source| StorageError::WriteFailed {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::WriteFailed {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// In-memory partition. Two handles over one shared instance behave like
/// two contexts pointed at the same storage, which is how the tests model
/// concurrent tabs.
#[derive(Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.lock().expect("storage lock poisoned").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.map
            .lock()
            .expect("storage lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.map.lock().expect("storage lock poisoned").remove(key);
        Ok(())
    }
}
