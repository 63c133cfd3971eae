//! Canonical resource structures
//!
//! Every structure is built around an [`Iid`](crate::Iid) and is what
//! handlers hand back to callers, whatever the provider's own shape.
//! Provider-specific extras travel in `key_value_list`.

pub mod disk;
pub mod image;
pub mod keypair;
pub mod nlb;
pub mod security;
pub mod vm;
pub mod vpc;

pub use disk::{DiskInfo, DiskReqInfo, DiskStatus};
pub use image::{ImageInfo, ImageStatus, MyImageInfo, MyImageReqInfo, MyImageStatus};
pub use keypair::{KeyPairInfo, KeyPairReqInfo};
pub use nlb::{
    HealthCheckerInfo, HealthInfo, ListenerInfo, NlbInfo, NlbReqInfo, NlbScope, VmGroupInfo,
};
pub use security::{SecurityInfo, SecurityReqInfo, SecurityRuleInfo};
pub use vm::{ImageType, VmInfo, VmReqInfo, VmStatus, VmStatusInfo};
pub use vpc::{SubnetInfo, VpcInfo, VpcReqInfo};
