//! Driver and connection entry points
//!
//! A [`CloudDriver`] turns connection info into a provider connection.
//! [`Connection`] wraps it and checks the driver's capability flags before
//! any handler is built, so an unsupported kind never reaches provider code.

use crate::capability::{DriverCapability, ResourceKind};
use crate::credential::ConnectionInfo;
use crate::error::{CloudError, Result};
use crate::handler::{
    DiskHandler, ImageHandler, KeyPairHandler, MyImageHandler, NlbHandler, SecurityHandler,
    VmHandler, VpcHandler,
};
use crate::reconciler::ReconcilerConfig;
use crate::store::{CredentialStore, MetadataStore};
use async_trait::async_trait;
use std::sync::Arc;

/// Everything a provider needs to build its handlers
#[derive(Clone)]
pub struct ProviderContext {
    pub connection: ConnectionInfo,
    pub store: CredentialStore,
    pub reconciler: ReconcilerConfig,
}

fn unsupported(kind: ResourceKind) -> CloudError {
    CloudError::NotSupported(format!("{} handler", kind))
}

/// Provider side of a connection
///
/// Defaults refuse every kind; a provider overrides what it implements.
#[async_trait]
pub trait ProviderConnection: Send + Sync {
    fn create_image_handler(&self) -> Result<Box<dyn ImageHandler>> {
        Err(unsupported(ResourceKind::Image))
    }

    fn create_vpc_handler(&self) -> Result<Box<dyn VpcHandler>> {
        Err(unsupported(ResourceKind::Vpc))
    }

    fn create_security_handler(&self) -> Result<Box<dyn SecurityHandler>> {
        Err(unsupported(ResourceKind::Security))
    }

    fn create_key_pair_handler(&self) -> Result<Box<dyn KeyPairHandler>> {
        Err(unsupported(ResourceKind::KeyPair))
    }

    fn create_vm_handler(&self) -> Result<Box<dyn VmHandler>> {
        Err(unsupported(ResourceKind::Vm))
    }

    fn create_nlb_handler(&self) -> Result<Box<dyn NlbHandler>> {
        Err(unsupported(ResourceKind::Nlb))
    }

    fn create_disk_handler(&self) -> Result<Box<dyn DiskHandler>> {
        Err(unsupported(ResourceKind::Disk))
    }

    fn create_my_image_handler(&self) -> Result<Box<dyn MyImageHandler>> {
        Err(unsupported(ResourceKind::MyImage))
    }

    async fn is_connected(&self) -> Result<bool>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
pub trait CloudDriver: Send + Sync {
    /// Provider label used in store keys (e.g. "CLOUDIT")
    fn name(&self) -> &str;

    fn capability(&self) -> DriverCapability;

    /// Credential keys, in hash order, that identify one tenant
    fn credential_hash_fields(&self) -> &'static [&'static str];

    async fn connect_provider(&self, ctx: ProviderContext) -> Result<Box<dyn ProviderConnection>>;
}

/// An open, capability-gated connection to one provider tenant
pub struct Connection {
    driver_name: String,
    capability: DriverCapability,
    credential_hash: String,
    provider: Box<dyn ProviderConnection>,
}

impl Connection {
    pub async fn open(
        driver: &dyn CloudDriver,
        info: ConnectionInfo,
        store: Arc<MetadataStore>,
        reconciler: ReconcilerConfig,
    ) -> Result<Self> {
        let credential_hash = info.credential.hash_fields(driver.credential_hash_fields());
        tracing::debug!(
            "Opening {} connection (region={}, credential={})",
            driver.name(),
            info.region.region,
            credential_hash
        );

        let ctx = ProviderContext {
            store: CredentialStore::new(store, driver.name(), credential_hash.clone()),
            connection: info,
            reconciler,
        };
        let provider = driver.connect_provider(ctx).await?;

        Ok(Self {
            driver_name: driver.name().to_string(),
            capability: driver.capability(),
            credential_hash,
            provider,
        })
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    pub fn capability(&self) -> &DriverCapability {
        &self.capability
    }

    pub fn credential_hash(&self) -> &str {
        &self.credential_hash
    }

    fn gate(&self, kind: ResourceKind) -> Result<()> {
        if self.capability.supports(kind) {
            Ok(())
        } else {
            Err(CloudError::NotSupported(format!(
                "{} driver does not support {} handler",
                self.driver_name, kind
            )))
        }
    }

    pub fn create_image_handler(&self) -> Result<Box<dyn ImageHandler>> {
        self.gate(ResourceKind::Image)?;
        self.provider.create_image_handler()
    }

    pub fn create_vpc_handler(&self) -> Result<Box<dyn VpcHandler>> {
        self.gate(ResourceKind::Vpc)?;
        self.provider.create_vpc_handler()
    }

    pub fn create_security_handler(&self) -> Result<Box<dyn SecurityHandler>> {
        self.gate(ResourceKind::Security)?;
        self.provider.create_security_handler()
    }

    pub fn create_key_pair_handler(&self) -> Result<Box<dyn KeyPairHandler>> {
        self.gate(ResourceKind::KeyPair)?;
        self.provider.create_key_pair_handler()
    }

    pub fn create_vm_handler(&self) -> Result<Box<dyn VmHandler>> {
        self.gate(ResourceKind::Vm)?;
        self.provider.create_vm_handler()
    }

    pub fn create_nlb_handler(&self) -> Result<Box<dyn NlbHandler>> {
        self.gate(ResourceKind::Nlb)?;
        self.provider.create_nlb_handler()
    }

    pub fn create_disk_handler(&self) -> Result<Box<dyn DiskHandler>> {
        self.gate(ResourceKind::Disk)?;
        self.provider.create_disk_handler()
    }

    pub fn create_my_image_handler(&self) -> Result<Box<dyn MyImageHandler>> {
        self.gate(ResourceKind::MyImage)?;
        self.provider.create_my_image_handler()
    }

    pub async fn is_connected(&self) -> Result<bool> {
        self.provider.is_connected().await
    }

    pub async fn close(self) -> Result<()> {
        self.provider.close().await
    }
}
