mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::model::{DocId, DocumentRecord};

/// Key under which the document list is persisted
pub const DOCUMENT_LIST_KEY: &str = "uploadedFiles";

/// String key-value storage backing the persisted client cache.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Persisted list of previously uploaded documents.
///
/// Advisory only: it speeds up the first render and metadata lookups, but
/// the backend file list always wins. Writes replace the whole list.
#[derive(Clone)]
pub struct DocumentCache {
    store: Arc<dyn KeyValueStore>,
}

impl DocumentCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Build the cache described by `config`: sled on disk, or process
    /// memory when persistence is disabled.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self::in_memory());
        }

        let path = config
            .path
            .clone()
            .unwrap_or_else(crate::util::document_cache_path);
        Ok(Self::new(Arc::new(DiskStore::open(path)?)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Read the cached list. Unreadable or corrupt entries read as empty.
    pub fn load(&self) -> Vec<DocumentRecord> {
        let raw = match self.store.get(DOCUMENT_LIST_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Ignoring unreadable document cache: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!("Ignoring corrupt document cache: {}", e);
                Vec::new()
            }
        }
    }

    /// Overwrite the cached list with `records`.
    pub fn replace(&self, records: &[DocumentRecord]) -> Result<()> {
        let json = serde_json::to_string(records).map_err(|e| Error::CacheWrite(e.to_string()))?;
        self.store.set(DOCUMENT_LIST_KEY, &json)?;
        debug!("Cached {} document records", records.len());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(DOCUMENT_LIST_KEY)
    }

    pub fn lookup(&self, id: &DocId) -> Option<DocumentRecord> {
        self.load().into_iter().find(|record| &record.id == id)
    }
}
