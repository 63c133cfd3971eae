//! Credential context and tenant hash

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

pub const IDENTITY_ENDPOINT: &str = "IdentityEndpoint";
pub const USERNAME: &str = "Username";
pub const PASSWORD: &str = "Password";
pub const TENANT_ID: &str = "TenantId";
pub const AUTH_TOKEN: &str = "AuthToken";
pub const CLUSTER_ID: &str = "ClusterId";

/// Generic key/value pair used for credentials and provider extras
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(rename = "Key")]
    pub key: String,

    #[serde(rename = "Value")]
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Tenant credential as an ordered list of key/value pairs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialInfo {
    pub fields: Vec<KeyValue>,
}

impl CredentialInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|kv| kv.key == key) {
            Some(kv) => kv.value = value,
            None => self.fields.push(KeyValue { key, value }),
        }
    }

    /// Value of a field, empty when unset.
    pub fn get(&self, key: &str) -> &str {
        self.fields
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| kv.value.as_str())
            .unwrap_or("")
    }

    pub fn identity_endpoint(&self) -> &str {
        self.get(IDENTITY_ENDPOINT)
    }

    pub fn username(&self) -> &str {
        self.get(USERNAME)
    }

    pub fn password(&self) -> &str {
        self.get(PASSWORD)
    }

    pub fn tenant_id(&self) -> &str {
        self.get(TENANT_ID)
    }

    pub fn auth_token(&self) -> &str {
        self.get(AUTH_TOKEN)
    }

    pub fn cluster_id(&self) -> &str {
        self.get(CLUSTER_ID)
    }

    /// Partition key for the metadata store.
    ///
    /// The named fields are concatenated in the given order and digested
    /// with MD5, rendered as lowercase hex. Records persisted under earlier
    /// releases depend on this exact layout.
    pub fn hash_fields(&self, order: &[&str]) -> String {
        let key_string: String = order.iter().map(|k| self.get(k)).collect();
        let digest = Md5::digest(key_string.as_bytes());
        hex::encode(digest)
    }
}

/// Region placement of a connection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionInfo {
    pub region: String,
    pub zone: String,
}

/// Everything a driver needs to open a connection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub credential: CredentialInfo,
    pub region: RegionInfo,
}
