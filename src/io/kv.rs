use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};

/// Error type for key-value storage
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize storage: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("write to '{key}' rejected: {reason}")]
    WriteRejected { key: String, reason: String },
}

/// A synchronous string-to-string store.
///
/// Writes either complete before returning or fail without changing what
/// `get` observes.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// A store persisted as a single JSON object of string values.
///
/// Every write rewrites the whole file atomically.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: IndexMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store. A file that
    /// is not a JSON object of strings is moved aside to `<path>.corrupt` and
    /// logged, and the store starts empty.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let entries = match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<IndexMap<String, String>>(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    quarantine(path, &text, &e)?;
                    IndexMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexMap::new(),
            Err(e) => {
                return Err(StorageError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        Ok(FileStore {
            path: path.to_path_buf(),
            entries,
        })
    }

    fn write_entries(&self, entries: &IndexMap<String, String>) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(entries)?;
        recovery::atomic_write(&self.path, content.as_bytes()).map_err(|e| {
            StorageError::WriteError {
                path: self.path.clone(),
                source: e,
            }
        })
    }
}

fn quarantine(path: &Path, text: &str, err: &serde_json::Error) -> Result<(), StorageError> {
    let mut aside = path.as_os_str().to_owned();
    aside.push(".corrupt");
    let aside = PathBuf::from(aside);
    fs::rename(path, &aside).map_err(|e| StorageError::WriteError {
        path: aside.clone(),
        source: e,
    })?;
    if let Some(dir) = path.parent() {
        recovery::log_recovery(
            dir,
            RecoveryEntry::now(RecoveryCategory::Parser, "storage file unreadable, moved aside")
                .field("Source", path.display().to_string())
                .field("Moved to", aside.display().to_string())
                .field("Error", err.to_string())
                .body(text),
        );
    }
    Ok(())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.write_entries(&next)?;
        self.entries = next;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut next = self.entries.clone();
        next.shift_remove(key);
        self.write_entries(&next)?;
        self.entries = next;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryInner {
    entries: IndexMap<String, String>,
    /// Total bytes (keys + values) the store may hold
    quota: Option<usize>,
}

/// In-memory store. Clones share the same entries, so a caller can keep a
/// handle to inspect or corrupt what another owner writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total stored bytes; writes that would exceed it are rejected.
    pub fn set_quota(&self, quota: Option<usize>) {
        self.inner.borrow_mut().quota = quota;
    }

    /// Write a raw value, bypassing the quota.
    pub fn put_raw(&self, key: &str, value: &str) {
        self.inner
            .borrow_mut()
            .entries
            .insert(key.to_string(), value.to_string());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.borrow().entries.contains_key(key)
    }

    fn used_bytes(entries: &IndexMap<String, String>) -> usize {
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        if let Some(quota) = inner.quota {
            let current = inner.entries.get(key).map_or(0, |v| key.len() + v.len());
            let needed = Self::used_bytes(&inner.entries) - current + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::WriteRejected {
                    key: key.to_string(),
                    reason: format!("quota exceeded ({} of {} bytes)", needed, quota),
                });
            }
        }
        inner.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.inner.borrow_mut().entries.shift_remove(key);
        Ok(())
    }
}
