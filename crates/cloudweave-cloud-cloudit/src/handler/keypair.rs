//! Key pair handler
//!
//! Cloudit has no key pair API. Key material is generated locally and the
//! private PEM lives in the metadata store (`KEYPAIR` namespace); the public
//! key and fingerprint are re-derived from it on every read.

use super::ClouditContext;
use async_trait::async_trait;
use cloudweave_cloud::keygen::fingerprint;
use cloudweave_cloud::{
    CloudError, Iid, KeyPairHandler, KeyPairInfo, KeyPairReqInfo, Namespace, Result,
};

/// Login user provisioned on Linux servers for key based access
pub const SSH_DEFAULT_USER: &str = "cb-user";

pub struct ClouditKeyPairHandler {
    ctx: ClouditContext,
}

impl ClouditKeyPairHandler {
    pub fn new(ctx: ClouditContext) -> Self {
        Self { ctx }
    }

    fn key_info(&self, name: &str, private_key: String) -> Result<KeyPairInfo> {
        let public_key = self.ctx.keygen.public_key_from_private(&private_key)?;
        Ok(KeyPairInfo {
            iid: Iid::new(name, name),
            fingerprint: fingerprint(&public_key)?,
            public_key,
            private_key,
            vm_user_id: SSH_DEFAULT_USER.to_string(),
            key_value_list: vec![],
        })
    }

    fn key_name(iid: &Iid) -> Result<&str> {
        iid.require_valid("KeyPair")?;
        // SystemId mirrors NameId for locally managed keys
        Ok(if iid.name_id.is_empty() {
            &iid.system_id
        } else {
            &iid.name_id
        })
    }
}

#[async_trait]
impl KeyPairHandler for ClouditKeyPairHandler {
    async fn create_key(&self, req: KeyPairReqInfo) -> Result<KeyPairInfo> {
        let name = req.iid.name_id.as_str();
        if name.is_empty() {
            return Err(CloudError::InvalidArgument("key pair NameId is required".into()));
        }
        if self.ctx.store.exists(Namespace::KeyPair, name).await? {
            return Err(CloudError::AlreadyExists(format!("key pair '{}'", name)));
        }

        tracing::info!("Generating key pair {}", name);
        let material = self.ctx.keygen.generate()?;
        self.ctx
            .store
            .put(Namespace::KeyPair, name, &material.private_key)
            .await?;

        self.key_info(name, material.private_key)
    }

    async fn list_key(&self) -> Result<Vec<KeyPairInfo>> {
        self.ctx
            .store
            .list(Namespace::KeyPair)
            .await?
            .into_iter()
            .map(|record| self.key_info(&record.name_id, record.value))
            .collect()
    }

    async fn get_key(&self, iid: &Iid) -> Result<KeyPairInfo> {
        let name = Self::key_name(iid)?;
        let private_key = self
            .ctx
            .store
            .get(Namespace::KeyPair, name)
            .await
            .map_err(|e| e.context(format!("key pair '{}'", name)))?;
        self.key_info(name, private_key)
    }

    async fn delete_key(&self, iid: &Iid) -> Result<bool> {
        let name = Self::key_name(iid)?;
        tracing::info!("Deleting key pair {}", name);
        self.ctx
            .store
            .delete(Namespace::KeyPair, name)
            .await
            .map_err(|e| e.context(format!("key pair '{}'", name)))?;
        Ok(true)
    }
}
