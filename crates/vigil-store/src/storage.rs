//! Durable key/value backends.
//!
//! [`Storage`] is the origin-scoped store the browser would provide:
//! synchronous, string keys, string values, survives a reload. The
//! session layer never touches a backend directly; it goes through
//! [`SessionStore`](crate::SessionStore).

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use crate::StoreError;

/// A synchronous key/value store scoped to one origin.
///
/// Implementations must make a `set` visible to every later `get` on the
/// same origin, including from a fresh process (for durable backends).
/// `remove` of a missing key is not an error.
pub trait Storage: Send + Sync + 'static {
    /// Reads a value. `Ok(None)` means the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes a value. Idempotent.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-process storage.
///
/// Cloning gives another handle to the *same* map, which is how two tabs
/// of one origin see a single store. Used by tests and as the default
/// backend when nothing durable is configured.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError>
    {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("memory storage lock poisoned".into()))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// Storage persisted as a single JSON object on disk.
///
/// Every write rewrites the whole file through a uniquely named sibling
/// temp file and a rename, so a crash mid-write leaves either the old or
/// the new object, never half of one. The file holds a handful of short
/// entries; the rewrite cost doesn't matter.
///
/// Read-modify-write cycles are serialized within one instance only.
/// Several instances or processes on the same path never corrupt the
/// file, but their updates race: the last rename wins.
///
/// A missing file reads as an empty store. A file that exists but isn't a
/// JSON object of strings is [`StoreError::Corrupt`]: the environment is
/// broken and the caller should know.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(StoreError::Corrupt)
    }

    fn write_all(
        &self,
        entries: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        let raw =
            serde_json::to_string_pretty(entries).map_err(StoreError::Encode)?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(raw.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn modify(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Backend("file storage lock poisoned".into()))?;
        let mut entries = self.read_all()?;
        // Skip the rewrite when nothing changed (e.g. removing a missing key).
        if f(&mut entries) {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.modify(|entries| entries.remove(key).is_some())
    }
}
