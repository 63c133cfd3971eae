//! cloudweave core
//!
//! Provider-agnostic half of the cloudweave multi-cloud driver framework:
//! canonical identities and resource shapes, capability gating, the
//! credential-scoped metadata store, the subnet CIDR allocator, and the
//! bounded poll/verify reconciler with compensating rollback.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  weave CLI / caller              │
//! └─────────────────┬───────────────────────────────┘
//!                   │ ConnectionInfo
//! ┌─────────────────▼───────────────────────────────┐
//! │               cloudweave-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  CloudDriver → Connection (capability)    │   │
//! │  │  trait VmHandler / NlbHandler / ...       │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐ ┌────────────┐ ┌──────────┐   │
//! │  │ MetadataStore│ │ Reconciler │ │   CIDR   │   │
//! │  └──────────────┘ └────────────┘ └──────────┘   │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │    cloudit    │
//! │   provider    │
//! └───────────────┘
//! ```

pub mod backend;
pub mod capability;
pub mod cidr;
pub mod compensation;
pub mod credential;
pub mod driver;
pub mod error;
pub mod handler;
pub mod iid;
pub mod keygen;
pub mod reconciler;
pub mod resources;
pub mod store;

// Re-exports
pub use backend::{FileBackend, KvBackend, KvEntry, MemoryBackend};
pub use capability::{DriverCapability, ResourceKind};
pub use cidr::{Ipv4Block, allocatable_blocks, validate_block};
pub use compensation::Compensation;
pub use credential::{ConnectionInfo, CredentialInfo, KeyValue, RegionInfo};
pub use driver::{CloudDriver, Connection, ProviderConnection, ProviderContext};
pub use error::{CloudError, ErrorKind, Result};
pub use handler::{
    DiskHandler, ImageHandler, KeyPairHandler, MyImageHandler, NlbHandler, SecurityHandler,
    VmHandler, VpcHandler,
};
pub use iid::Iid;
pub use keygen::{KeyMaterial, KeyMaterialGenerator, RsaKeyGenerator};
pub use reconciler::{CancelToken, PollPolicy, PollStatus, Reconciler, ReconcilerConfig};
pub use resources::{
    DiskInfo, DiskReqInfo, DiskStatus, HealthCheckerInfo, HealthInfo, ImageInfo, ImageStatus,
    ImageType, KeyPairInfo, KeyPairReqInfo, ListenerInfo, MyImageInfo, MyImageReqInfo,
    MyImageStatus, NlbInfo, NlbReqInfo, NlbScope, SecurityInfo, SecurityReqInfo, SecurityRuleInfo,
    SubnetInfo, VmGroupInfo, VmInfo, VmReqInfo, VmStatus, VmStatusInfo, VpcInfo, VpcReqInfo,
};
pub use store::{CredentialStore, MetadataRecord, MetadataStore, Namespace};
