//! Credential-scoped metadata store
//!
//! Persists what providers do not keep themselves: generated private keys,
//! VPC registration records, and security-group to VM associations.
//!
//! Keys follow the persisted layout
//! `/driver-info-spaces/{namespace}/{provider}/{credentialHash}/{nameId}`.
//! A single lock serializes every read and write; record volume is small and
//! calls are rare compared to provider round trips.

use crate::backend::KvBackend;
use crate::error::{CloudError, Result};
use crate::iid::{escape_name_id, unescape_name_id};
use std::sync::Arc;
use tokio::sync::Mutex;

const KEY_ROOT: &str = "/driver-info-spaces";

/// Kind of record kept in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    KeyPair,
    Vpc,
    SecurityGroup,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::KeyPair => "KEYPAIR",
            Namespace::Vpc => "VPC",
            Namespace::SecurityGroup => "SECURITYGROUP",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Namespace {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "KEYPAIR" => Ok(Namespace::KeyPair),
            "VPC" => Ok(Namespace::Vpc),
            "SECURITYGROUP" | "SG" => Ok(Namespace::SecurityGroup),
            other => Err(CloudError::InvalidArgument(format!(
                "unknown metadata namespace: {}",
                other
            ))),
        }
    }
}

/// A record as returned by `list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub namespace: Namespace,
    pub provider: String,
    pub credential_hash: String,
    pub name_id: String,
    pub value: String,
}

/// Build the persisted key for one record.
pub fn record_key(namespace: Namespace, provider: &str, credential_hash: &str, name_id: &str) -> String {
    format!(
        "{}{}",
        scope_prefix(namespace, provider, credential_hash),
        escape_name_id(name_id)
    )
}

fn scope_prefix(namespace: Namespace, provider: &str, credential_hash: &str) -> String {
    format!("{}/{}/{}/{}/", KEY_ROOT, namespace, provider, credential_hash)
}

/// Shared metadata store
///
/// Constructed once at startup and handed to every handler as
/// `Arc<MetadataStore>`.
pub struct MetadataStore {
    backend: Box<dyn KvBackend>,
    lock: Mutex<()>,
}

impl MetadataStore {
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            lock: Mutex::new(()),
        }
    }

    pub fn shared(backend: impl KvBackend + 'static) -> Arc<Self> {
        Arc::new(Self::new(backend))
    }

    pub async fn put(
        &self,
        namespace: Namespace,
        provider: &str,
        credential_hash: &str,
        name_id: &str,
        value: &str,
    ) -> Result<()> {
        let _guard = self.lock.lock().await;
        let key = record_key(namespace, provider, credential_hash, name_id);
        tracing::debug!("store put {}", key);
        self.backend.put(&key, value).await.map_err(unavailable)
    }

    /// Point lookup, resolved by listing the tenant scope and matching the
    /// final key segment. A plain prefix get would also match `name-01`
    /// when asked for `name`.
    pub async fn get(
        &self,
        namespace: Namespace,
        provider: &str,
        credential_hash: &str,
        name_id: &str,
    ) -> Result<String> {
        let _guard = self.lock.lock().await;
        self.scan(namespace, provider, credential_hash)
            .await?
            .into_iter()
            .find(|r| r.name_id == name_id)
            .map(|r| r.value)
            .ok_or_else(|| {
                CloudError::NotFound(format!(
                    "{} record {} for provider {}",
                    namespace, name_id, provider
                ))
            })
    }

    pub async fn list(
        &self,
        namespace: Namespace,
        provider: &str,
        credential_hash: &str,
    ) -> Result<Vec<MetadataRecord>> {
        let _guard = self.lock.lock().await;
        self.scan(namespace, provider, credential_hash).await
    }

    pub async fn delete(
        &self,
        namespace: Namespace,
        provider: &str,
        credential_hash: &str,
        name_id: &str,
    ) -> Result<()> {
        let _guard = self.lock.lock().await;
        let key = record_key(namespace, provider, credential_hash, name_id);
        tracing::debug!("store delete {}", key);
        if self.backend.delete(&key).await.map_err(unavailable)? {
            Ok(())
        } else {
            Err(CloudError::NotFound(format!(
                "{} record {} for provider {}",
                namespace, name_id, provider
            )))
        }
    }

    /// Read-modify-write of one record under a single lock acquisition.
    ///
    /// `apply` receives the current value (`None` when absent) and returns
    /// the value to store; `None` removes the record. Returns the stored
    /// value.
    pub async fn update<F>(
        &self,
        namespace: Namespace,
        provider: &str,
        credential_hash: &str,
        name_id: &str,
        apply: F,
    ) -> Result<Option<String>>
    where
        F: FnOnce(Option<String>) -> Option<String> + Send,
    {
        let _guard = self.lock.lock().await;
        let current = self
            .scan(namespace, provider, credential_hash)
            .await?
            .into_iter()
            .find(|r| r.name_id == name_id)
            .map(|r| r.value);
        let existed = current.is_some();
        let key = record_key(namespace, provider, credential_hash, name_id);

        let next = apply(current);
        match &next {
            Some(value) => {
                tracing::debug!("store update {}", key);
                self.backend.put(&key, value).await.map_err(unavailable)?;
            }
            None if existed => {
                tracing::debug!("store update {} (removed)", key);
                self.backend.delete(&key).await.map_err(unavailable)?;
            }
            None => {}
        }
        Ok(next)
    }

    pub async fn exists(
        &self,
        namespace: Namespace,
        provider: &str,
        credential_hash: &str,
        name_id: &str,
    ) -> Result<bool> {
        match self.get(namespace, provider, credential_hash, name_id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Caller must hold the lock.
    async fn scan(
        &self,
        namespace: Namespace,
        provider: &str,
        credential_hash: &str,
    ) -> Result<Vec<MetadataRecord>> {
        let prefix = scope_prefix(namespace, provider, credential_hash);
        let entries = self.backend.get_prefix(&prefix).await.map_err(unavailable)?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let segment = entry.key.strip_prefix(&prefix)?;
                // deeper paths belong to someone else's layout
                if segment.is_empty() || segment.contains('/') {
                    return None;
                }
                Some(MetadataRecord {
                    namespace,
                    provider: provider.to_string(),
                    credential_hash: credential_hash.to_string(),
                    name_id: unescape_name_id(segment),
                    value: entry.value,
                })
            })
            .collect())
    }
}

fn unavailable(err: CloudError) -> CloudError {
    match err {
        CloudError::StoreUnavailable(_) => err,
        other => CloudError::StoreUnavailable(other.to_string()),
    }
}

/// Store view bound to one provider and one tenant
///
/// This is what handlers hold; it never caches values across calls.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<MetadataStore>,
    provider: String,
    credential_hash: String,
}

impl CredentialStore {
    pub fn new(
        store: Arc<MetadataStore>,
        provider: impl Into<String>,
        credential_hash: impl Into<String>,
    ) -> Self {
        Self {
            store,
            provider: provider.into(),
            credential_hash: credential_hash.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn credential_hash(&self) -> &str {
        &self.credential_hash
    }

    pub async fn put(&self, namespace: Namespace, name_id: &str, value: &str) -> Result<()> {
        self.store
            .put(namespace, &self.provider, &self.credential_hash, name_id, value)
            .await
    }

    pub async fn get(&self, namespace: Namespace, name_id: &str) -> Result<String> {
        self.store
            .get(namespace, &self.provider, &self.credential_hash, name_id)
            .await
    }

    pub async fn list(&self, namespace: Namespace) -> Result<Vec<MetadataRecord>> {
        self.store
            .list(namespace, &self.provider, &self.credential_hash)
            .await
    }

    pub async fn delete(&self, namespace: Namespace, name_id: &str) -> Result<()> {
        self.store
            .delete(namespace, &self.provider, &self.credential_hash, name_id)
            .await
    }

    pub async fn update<F>(
        &self,
        namespace: Namespace,
        name_id: &str,
        apply: F,
    ) -> Result<Option<String>>
    where
        F: FnOnce(Option<String>) -> Option<String> + Send,
    {
        self.store
            .update(namespace, &self.provider, &self.credential_hash, name_id, apply)
            .await
    }

    pub async fn exists(&self, namespace: Namespace, name_id: &str) -> Result<bool> {
        self.store
            .exists(namespace, &self.provider, &self.credential_hash, name_id)
            .await
    }
}
