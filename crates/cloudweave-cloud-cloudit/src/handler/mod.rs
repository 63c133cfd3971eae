//! Cloudit resource handlers
//!
//! Every handler shares one [`ClouditContext`]: the provider API, the
//! tenant-scoped metadata store, and the poll budgets.

pub mod disk;
pub mod image;
pub mod keypair;
pub mod myimage;
pub mod nlb;
pub mod security;
pub mod vm;
pub mod vpc;

pub use disk::ClouditDiskHandler;
pub use image::ClouditImageHandler;
pub use keypair::ClouditKeyPairHandler;
pub use myimage::ClouditMyImageHandler;
pub use nlb::ClouditNlbHandler;
pub use security::ClouditSecurityHandler;
pub use vm::ClouditVmHandler;
pub use vpc::ClouditVpcHandler;

use crate::api::ClouditApi;
use crate::model::{RawAvailableIp, RawServer};
use cloudweave_cloud::{
    CancelToken, CloudError, CredentialInfo, CredentialStore, Iid, KeyMaterialGenerator,
    Reconciler, ReconcilerConfig, Result, VmStatus,
};
use std::sync::Arc;

/// State shared by every handler of one connection
#[derive(Clone)]
pub struct ClouditContext {
    pub api: Arc<dyn ClouditApi>,
    pub store: CredentialStore,
    pub reconciler: ReconcilerConfig,
    pub credential: CredentialInfo,
    pub keygen: Arc<dyn KeyMaterialGenerator>,
    pub cancel: Option<CancelToken>,
}

impl ClouditContext {
    /// Poll loop for network objects (subnets, load balancers)
    pub fn infra(&self) -> Reconciler {
        self.with_cancel(Reconciler::new(self.reconciler.infrastructure))
    }

    /// Poll loop for compute objects (VM boot, snapshots)
    pub fn compute(&self) -> Reconciler {
        self.with_cancel(Reconciler::new(self.reconciler.compute))
    }

    fn with_cancel(&self, reconciler: Reconciler) -> Reconciler {
        match &self.cancel {
            Some(token) => reconciler.with_cancel(token.clone()),
            None => reconciler,
        }
    }

    pub(crate) async fn find_server(&self, iid: &Iid) -> Result<RawServer> {
        iid.require_valid("VM")?;
        self.api
            .list_servers()
            .await?
            .into_iter()
            .find(|s| iid.matches(&s.name, &s.id))
            .ok_or_else(|| CloudError::NotFound(format!("VM '{}'", iid)))
    }

    /// Resolve the `ClusterId` credential (a cluster name) to its id
    pub(crate) async fn cluster_id(&self) -> Result<String> {
        let cluster = self.credential.cluster_id();
        if cluster.is_empty() {
            return Err(CloudError::InvalidArgument(
                "the ClusterId credential is required".into(),
            ));
        }
        if cluster.eq_ignore_ascii_case("default") {
            return Err(CloudError::InvalidArgument(
                "Cloudit does not support the \"default\" cluster".into(),
            ));
        }
        self.api
            .list_clusters()
            .await?
            .into_iter()
            .find(|c| c.name == cluster || c.id == cluster)
            .map(|c| c.id)
            .ok_or_else(|| CloudError::NotFound(format!("cluster '{}'", cluster)))
    }

    /// First-fit public IP
    pub(crate) async fn first_available_ip(&self) -> Result<RawAvailableIp> {
        self.api
            .list_available_ips()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CloudError::UpstreamError("no public IP available to allocate".into()))
    }
}

/// Map a Cloudit server state onto the canonical lifecycle
pub fn vm_status(state: &str) -> VmStatus {
    match state.to_ascii_uppercase().as_str() {
        "CREATING" | "PENDING" => VmStatus::Creating,
        "RUNNING" => VmStatus::Running,
        "STOPPED" => VmStatus::Suspended,
        "REBOOTING" => VmStatus::Rebooting,
        "TERMINATED" | "DELETING" => VmStatus::Terminating,
        _ => VmStatus::Failed,
    }
}

/// `"2024-01-02 03:04:05"` as RFC 3339, or the input untouched
pub(crate) fn normalize_time(created_at: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(created_at, "%Y-%m-%d %H:%M:%S")
        .map(|t| t.and_utc().to_rfc3339())
        .unwrap_or_else(|_| created_at.to_string())
}
