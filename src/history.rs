use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::types::ScanHistoryItem;

/// Key under which the full history list is stored.
pub const STORAGE_KEY: &str = "aegisai_scan_history";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Minimal string key-value persistence, the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Process-local storage; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(quota),
        }
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        check_quota(self.quota, value)?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed storage: each key is one `<key>.json` file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota: None,
        }
    }

    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        check_quota(self.quota, value)?;
        fs::create_dir_all(&self.dir)?;
        // Readers never observe a partially written list.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn check_quota(quota: Option<usize>, value: &str) -> Result<(), StorageError> {
    match quota {
        Some(quota) if value.len() > quota => Err(StorageError::QuotaExceeded {
            needed: value.len(),
            quota,
        }),
        _ => Ok(()),
    }
}

/// Most-recent-first list of past scans persisted through a [`KeyValueStore`].
///
/// Storage failures never reach the caller: a bad read behaves as empty history
/// and a failed write leaves only the in-memory list updated.
pub struct ScanHistory<S: KeyValueStore> {
    storage: S,
    items: Option<Vec<ScanHistoryItem>>,
}

impl<S: KeyValueStore> ScanHistory<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            items: None,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn loaded(&mut self) -> &mut Vec<ScanHistoryItem> {
        if self.items.is_none() {
            self.items = Some(load_items(&self.storage));
        }
        self.items.get_or_insert_with(Vec::new)
    }

    /// Prepend `item` and persist the whole list.
    pub fn add_scan(&mut self, item: ScanHistoryItem) {
        let items = self.loaded();
        items.insert(0, item);
        let serialized = match serde_json::to_string(items) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "failed to serialize scan history");
                return;
            }
        };
        if let Err(e) = self.storage.set(STORAGE_KEY, &serialized) {
            error!(error = %e, "failed to save scan history");
        }
    }

    pub fn get_scan_by_id(&mut self, id: &str) -> Option<ScanHistoryItem> {
        self.loaded().iter().find(|item| item.id == id).cloned()
    }

    /// Snapshot of the list, newest first.
    pub fn items(&mut self) -> Vec<ScanHistoryItem> {
        self.loaded().clone()
    }

    pub fn len(&mut self) -> usize {
        self.loaded().len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.loaded().is_empty()
    }
}

fn load_items<S: KeyValueStore>(storage: &S) -> Vec<ScanHistoryItem> {
    let raw = match storage.get(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "failed to load scan history, starting empty");
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<ScanHistoryItem>>(&raw) {
        Ok(items) => {
            debug!(count = items.len(), "loaded scan history");
            items
        }
        Err(e) => {
            warn!(error = %e, "stored scan history is unreadable, starting empty");
            Vec::new()
        }
    }
}
