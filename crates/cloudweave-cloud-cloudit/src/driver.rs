//! Cloudit driver and connection

use crate::api::{ClouditApi, RestClouditApi};
use crate::client::{PasswordAuth, RestClient};
use crate::handler::{
    ClouditContext, ClouditDiskHandler, ClouditImageHandler, ClouditKeyPairHandler,
    ClouditMyImageHandler, ClouditNlbHandler, ClouditSecurityHandler, ClouditVmHandler,
    ClouditVpcHandler,
};
use async_trait::async_trait;
use cloudweave_cloud::credential::{IDENTITY_ENDPOINT, PASSWORD, TENANT_ID, USERNAME};
use cloudweave_cloud::{
    CancelToken, CloudDriver, CloudError, DiskHandler, DriverCapability, ImageHandler,
    KeyMaterialGenerator, KeyPairHandler, MyImageHandler, NlbHandler, ProviderConnection,
    ProviderContext, ResourceKind, Result, RsaKeyGenerator, SecurityHandler, VmHandler,
    VpcHandler,
};
use std::sync::Arc;

pub const DRIVER_NAME: &str = "CLOUDIT";

/// Credential keys, in hash order, that identify one Cloudit tenant
pub const CREDENTIAL_HASH_FIELDS: &[&str] = &[IDENTITY_ENDPOINT, USERNAME, PASSWORD, TENANT_ID];

pub struct ClouditDriver {
    keygen: Arc<dyn KeyMaterialGenerator>,
    api: Option<Arc<dyn ClouditApi>>,
    api_version: Option<String>,
    cancel: Option<CancelToken>,
}

impl ClouditDriver {
    pub fn new() -> Self {
        Self {
            keygen: Arc::new(RsaKeyGenerator::new()),
            api: None,
            api_version: None,
            cancel: None,
        }
    }

    pub fn with_keygen(mut self, keygen: Arc<dyn KeyMaterialGenerator>) -> Self {
        self.keygen = keygen;
        self
    }

    /// Use `api` instead of the REST transport
    pub fn with_api(mut self, api: Arc<dyn ClouditApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    async fn rest_api(&self, ctx: &ProviderContext) -> Result<Arc<dyn ClouditApi>> {
        let credential = &ctx.connection.credential;
        let endpoint = credential.identity_endpoint();
        if endpoint.is_empty() {
            return Err(CloudError::InvalidArgument(format!(
                "the {} credential is required",
                IDENTITY_ENDPOINT
            )));
        }

        let auth = Arc::new(PasswordAuth::new(
            endpoint,
            credential.username(),
            credential.password(),
        ));
        let token = if credential.auth_token().is_empty() {
            tracing::debug!("Issuing Cloudit token for {}", credential.username());
            auth.issue_token().await?
        } else {
            credential.auth_token().to_string()
        };

        let mut client = RestClient::new(endpoint, credential.tenant_id(), token)
            .with_reauthenticate(auth);
        if let Some(version) = &self.api_version {
            client = client.with_version(version);
        }
        Ok(Arc::new(RestClouditApi::new(client)))
    }
}

impl Default for ClouditDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudDriver for ClouditDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn capability(&self) -> DriverCapability {
        DriverCapability::new()
            .with(ResourceKind::Image)
            .with(ResourceKind::Vpc)
            .with(ResourceKind::Security)
            .with(ResourceKind::KeyPair)
            .with(ResourceKind::Vm)
            .with(ResourceKind::Nlb)
            .with(ResourceKind::MyImage)
            .with(ResourceKind::Disk)
            .with_single_vpc(true)
            .with_vpc_cidr(false)
            .with_zone_based_control(false)
    }

    fn credential_hash_fields(&self) -> &'static [&'static str] {
        CREDENTIAL_HASH_FIELDS
    }

    async fn connect_provider(&self, ctx: ProviderContext) -> Result<Box<dyn ProviderConnection>> {
        let api = match &self.api {
            Some(api) => api.clone(),
            None => self.rest_api(&ctx).await?,
        };
        tracing::info!(
            "Connected to Cloudit tenant {}",
            ctx.connection.credential.tenant_id()
        );

        Ok(Box::new(ClouditConnection::new(ClouditContext {
            api,
            store: ctx.store,
            reconciler: ctx.reconciler,
            credential: ctx.connection.credential,
            keygen: self.keygen.clone(),
            cancel: self.cancel.clone(),
        })))
    }
}

/// Handler factory for one Cloudit tenant
pub struct ClouditConnection {
    ctx: ClouditContext,
}

impl ClouditConnection {
    pub fn new(ctx: ClouditContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ClouditContext {
        &self.ctx
    }
}

#[async_trait]
impl ProviderConnection for ClouditConnection {
    fn create_image_handler(&self) -> Result<Box<dyn ImageHandler>> {
        Ok(Box::new(ClouditImageHandler::new(self.ctx.clone())))
    }

    fn create_vpc_handler(&self) -> Result<Box<dyn VpcHandler>> {
        Ok(Box::new(ClouditVpcHandler::new(self.ctx.clone())))
    }

    fn create_security_handler(&self) -> Result<Box<dyn SecurityHandler>> {
        Ok(Box::new(ClouditSecurityHandler::new(self.ctx.clone())))
    }

    fn create_key_pair_handler(&self) -> Result<Box<dyn KeyPairHandler>> {
        Ok(Box::new(ClouditKeyPairHandler::new(self.ctx.clone())))
    }

    fn create_vm_handler(&self) -> Result<Box<dyn VmHandler>> {
        Ok(Box::new(ClouditVmHandler::new(self.ctx.clone())))
    }

    fn create_nlb_handler(&self) -> Result<Box<dyn NlbHandler>> {
        Ok(Box::new(ClouditNlbHandler::new(self.ctx.clone())))
    }

    fn create_disk_handler(&self) -> Result<Box<dyn DiskHandler>> {
        Ok(Box::new(ClouditDiskHandler::new(self.ctx.clone())))
    }

    fn create_my_image_handler(&self) -> Result<Box<dyn MyImageHandler>> {
        Ok(Box::new(ClouditMyImageHandler::new(self.ctx.clone())))
    }

    async fn is_connected(&self) -> Result<bool> {
        match self.ctx.api.list_clusters().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::debug!("Cloudit connection check failed: {}", e);
                Ok(false)
            }
        }
    }
}
