//! Config file structure
//!
//! ```yaml
//! store:
//!   kind: file
//!   path: /var/lib/cloudweave/metadata.json
//! reconciler:
//!   infra: { max_attempts: 60, delay_ms: 2000 }
//! connections:
//!   cloudit-dev:
//!     driver: CLOUDIT
//!     region: kr-1
//!     credential:
//!       IdentityEndpoint: https://cloudit.example
//!       Username: ops
//!       Password: ${CLOUDIT_PASSWORD}
//!       TenantId: tenant-1
//!       ClusterId: cluster-a
//! ```

use crate::error::{ConfigError, Result};
use cloudweave_cloud::{
    ConnectionInfo, CredentialInfo, FileBackend, MemoryBackend, MetadataStore, PollPolicy,
    ReconcilerConfig, RegionInfo,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

const STORE_FILE_NAME: &str = "metadata.json";

static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env reference pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub reconciler: ReconcilerSettings,
    pub connections: BTreeMap<String, ConnectionProfile>,
}

impl Config {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn connection(&self, name: &str) -> Result<&ConnectionProfile> {
        self.connections
            .get(name)
            .ok_or_else(|| ConfigError::ConnectionNotFound(name.to_string()))
    }

    pub fn connection_names(&self) -> Vec<&str> {
        self.connections.keys().map(String::as_str).collect()
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        self.reconciler.to_config()
    }
}

/// Where the metadata store keeps its records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    Memory,
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File { path: None }
    }
}

impl StoreConfig {
    /// Backing file, if any; `None` for the memory store
    pub fn file_path(&self) -> Result<Option<PathBuf>> {
        match self {
            StoreConfig::Memory => Ok(None),
            StoreConfig::File { path: Some(path) } => Ok(Some(path.clone())),
            StoreConfig::File { path: None } => default_store_path().map(Some),
        }
    }

    pub fn open(&self) -> Result<Arc<MetadataStore>> {
        match self.file_path()? {
            None => {
                tracing::debug!("Using in-memory metadata store");
                Ok(MetadataStore::shared(MemoryBackend::new()))
            }
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                tracing::debug!("Using metadata store file {}", path.display());
                Ok(MetadataStore::shared(FileBackend::new(path)))
            }
        }
    }
}

/// `{data_dir}/cloudweave/metadata.json`
pub fn default_store_path() -> Result<PathBuf> {
    Ok(dirs::data_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("cloudweave")
        .join(STORE_FILE_NAME))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerSettings {
    pub infra: PolicySettings,
    pub compute: PolicySettings,
}

impl ReconcilerSettings {
    pub fn to_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            infrastructure: self.infra.apply(PollPolicy::infrastructure()),
            compute: self.compute.apply(PollPolicy::compute()),
        }
    }
}

/// Overrides for one poll budget; unset fields keep the built-in value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl PolicySettings {
    fn apply(&self, base: PollPolicy) -> PollPolicy {
        PollPolicy::new(
            self.max_attempts.unwrap_or(base.max_attempts),
            self.delay_ms.map(Duration::from_millis).unwrap_or(base.delay),
        )
    }
}

/// One named provider account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionProfile {
    pub driver: String,
    pub region: String,
    pub zone: String,
    pub credential: BTreeMap<String, String>,
}

impl ConnectionProfile {
    /// Connection info with `${VAR}` references resolved
    pub fn connection_info(&self) -> Result<ConnectionInfo> {
        if self.driver.is_empty() {
            return Err(ConfigError::Invalid("connection has no driver".into()));
        }
        let mut credential = CredentialInfo::new();
        for (key, value) in &self.credential {
            credential.set(key.as_str(), expand_env(key, value)?);
        }
        Ok(ConnectionInfo {
            credential,
            region: RegionInfo {
                region: self.region.clone(),
                zone: self.zone.clone(),
            },
        })
    }
}

/// Replace every `${VAR}` in `value` with the environment value
pub fn expand_env(key: &str, value: &str) -> Result<String> {
    let mut expanded = String::with_capacity(value.len());
    let mut last = 0;
    for caps in ENV_REF.captures_iter(value) {
        let Some(whole) = caps.get(0) else { continue };
        let var = &caps[1];
        let resolved = std::env::var(var).map_err(|_| ConfigError::MissingEnvVar {
            key: key.to_string(),
            var: var.to_string(),
        })?;
        expanded.push_str(&value[last..whole.start()]);
        expanded.push_str(&resolved);
        last = whole.end();
    }
    expanded.push_str(&value[last..]);
    Ok(expanded)
}
