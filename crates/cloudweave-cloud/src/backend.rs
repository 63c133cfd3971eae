//! Key/value backends for the metadata store
//!
//! The store only needs three primitives: put, recursive prefix get, and
//! delete. `MemoryBackend` serves tests and ephemeral runs; `FileBackend`
//! persists a single JSON document, keeping the previous version as a
//! `.backup` next to it.

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tokio::fs;

const STORE_VERSION: u32 = 1;

/// One stored entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
}

/// Generic persistent key/value backend
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Every entry whose key starts with `prefix`, in key order.
    async fn get_prefix(&self, prefix: &str) -> Result<Vec<KvEntry>>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// In-memory backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> CloudError {
    CloudError::StoreUnavailable("memory backend lock poisoned".to_string())
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_prefix(&self, prefix: &str) -> Result<Vec<KvEntry>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| KvEntry {
                key: k.clone(),
                value: v.clone(),
            })
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        Ok(entries.remove(key).is_some())
    }
}

/// On-disk document layout
#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    entries: BTreeMap<String, String>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// JSON file backend
///
/// Each call reads and rewrites the whole document. Callers serialize
/// access through the metadata store lock.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".backup");
        PathBuf::from(name)
    }

    async fn load(&self) -> Result<StoreDocument> {
        if !self.path.exists() {
            tracing::debug!("Store file not found, starting empty: {}", self.path.display());
            return Ok(StoreDocument::default());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| CloudError::StoreUnavailable(format!("read {}: {}", self.path.display(), e)))?;
        let doc: StoreDocument = serde_json::from_str(&content).map_err(|e| {
            CloudError::StoreUnavailable(format!("parse {}: {}", self.path.display(), e))
        })?;

        if doc.version > STORE_VERSION {
            return Err(CloudError::StoreUnavailable(format!(
                "Store file version {} is newer than supported version {}",
                doc.version, STORE_VERSION
            )));
        }
        Ok(doc)
    }

    async fn save(&self, doc: &StoreDocument) -> Result<()> {
        let unavailable =
            |e: std::io::Error| CloudError::StoreUnavailable(format!("{}: {}", self.path.display(), e));

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).await.map_err(unavailable)?;
            }
        }

        if self.path.exists() {
            fs::copy(&self.path, self.backup_path())
                .await
                .map_err(unavailable)?;
        }

        let content = serde_json::to_string_pretty(doc)?;
        fs::write(&self.path, content).await.map_err(unavailable)?;
        tracing::debug!("Saved store with {} entries", doc.entries.len());
        Ok(())
    }
}

#[async_trait]
impl KvBackend for FileBackend {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut doc = self.load().await?;
        doc.entries.insert(key.to_string(), value.to_string());
        self.save(&doc).await
    }

    async fn get_prefix(&self, prefix: &str) -> Result<Vec<KvEntry>> {
        let doc = self.load().await?;
        Ok(doc
            .entries
            .into_iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(key, value)| KvEntry { key, value })
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut doc = self.load().await?;
        let existed = doc.entries.remove(key).is_some();
        if existed {
            self.save(&doc).await?;
        }
        Ok(existed)
    }
}
