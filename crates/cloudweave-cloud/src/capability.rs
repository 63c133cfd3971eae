//! Resource kinds and per-driver capability flags

use serde::{Deserialize, Serialize};

/// Kinds of canonical resources a driver may expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Image,
    Vpc,
    Security,
    KeyPair,
    VNic,
    PublicIp,
    Vm,
    VmSpec,
    Nlb,
    Cluster,
    MyImage,
    Disk,
    RegionZone,
    PriceInfo,
    Tag,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 15] = [
        ResourceKind::Image,
        ResourceKind::Vpc,
        ResourceKind::Security,
        ResourceKind::KeyPair,
        ResourceKind::VNic,
        ResourceKind::PublicIp,
        ResourceKind::Vm,
        ResourceKind::VmSpec,
        ResourceKind::Nlb,
        ResourceKind::Cluster,
        ResourceKind::MyImage,
        ResourceKind::Disk,
        ResourceKind::RegionZone,
        ResourceKind::PriceInfo,
        ResourceKind::Tag,
    ];
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Image => write!(f, "IMAGE"),
            ResourceKind::Vpc => write!(f, "VPC"),
            ResourceKind::Security => write!(f, "SECURITYGROUP"),
            ResourceKind::KeyPair => write!(f, "KEYPAIR"),
            ResourceKind::VNic => write!(f, "VNIC"),
            ResourceKind::PublicIp => write!(f, "PUBLICIP"),
            ResourceKind::Vm => write!(f, "VM"),
            ResourceKind::VmSpec => write!(f, "VMSPEC"),
            ResourceKind::Nlb => write!(f, "NLB"),
            ResourceKind::Cluster => write!(f, "CLUSTER"),
            ResourceKind::MyImage => write!(f, "MYIMAGE"),
            ResourceKind::Disk => write!(f, "DISK"),
            ResourceKind::RegionZone => write!(f, "REGIONZONE"),
            ResourceKind::PriceInfo => write!(f, "PRICEINFO"),
            ResourceKind::Tag => write!(f, "TAG"),
        }
    }
}

/// Capability flags attached to a driver at construction
///
/// Read-only once the driver is built; the connection consults it before
/// constructing any handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DriverCapability {
    pub image_handler: bool,
    pub vpc_handler: bool,
    pub security_handler: bool,
    pub key_pair_handler: bool,
    pub vnic_handler: bool,
    pub public_ip_handler: bool,
    pub vm_handler: bool,
    pub vm_spec_handler: bool,
    pub nlb_handler: bool,
    pub cluster_handler: bool,
    pub my_image_handler: bool,
    pub disk_handler: bool,
    pub region_zone_handler: bool,
    pub price_info_handler: bool,
    pub tag_handler: bool,

    /// Provider exposes exactly one VPC per account
    #[serde(rename = "SINGLE_VPC")]
    pub single_vpc: bool,

    /// Resources are placed per zone rather than per region
    pub zone_based_control: bool,

    /// VPC CIDR is caller-controlled
    #[serde(rename = "VPC_CIDR")]
    pub vpc_cidr: bool,
}

impl DriverCapability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn supports(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Image => self.image_handler,
            ResourceKind::Vpc => self.vpc_handler,
            ResourceKind::Security => self.security_handler,
            ResourceKind::KeyPair => self.key_pair_handler,
            ResourceKind::VNic => self.vnic_handler,
            ResourceKind::PublicIp => self.public_ip_handler,
            ResourceKind::Vm => self.vm_handler,
            ResourceKind::VmSpec => self.vm_spec_handler,
            ResourceKind::Nlb => self.nlb_handler,
            ResourceKind::Cluster => self.cluster_handler,
            ResourceKind::MyImage => self.my_image_handler,
            ResourceKind::Disk => self.disk_handler,
            ResourceKind::RegionZone => self.region_zone_handler,
            ResourceKind::PriceInfo => self.price_info_handler,
            ResourceKind::Tag => self.tag_handler,
        }
    }

    pub fn with(mut self, kind: ResourceKind) -> Self {
        *self.flag_mut(kind) = true;
        self
    }

    pub fn with_single_vpc(mut self, single_vpc: bool) -> Self {
        self.single_vpc = single_vpc;
        self
    }

    pub fn with_zone_based_control(mut self, zone_based: bool) -> Self {
        self.zone_based_control = zone_based;
        self
    }

    pub fn with_vpc_cidr(mut self, vpc_cidr: bool) -> Self {
        self.vpc_cidr = vpc_cidr;
        self
    }

    pub fn supported_kinds(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|k| self.supports(*k))
            .collect()
    }

    fn flag_mut(&mut self, kind: ResourceKind) -> &mut bool {
        match kind {
            ResourceKind::Image => &mut self.image_handler,
            ResourceKind::Vpc => &mut self.vpc_handler,
            ResourceKind::Security => &mut self.security_handler,
            ResourceKind::KeyPair => &mut self.key_pair_handler,
            ResourceKind::VNic => &mut self.vnic_handler,
            ResourceKind::PublicIp => &mut self.public_ip_handler,
            ResourceKind::Vm => &mut self.vm_handler,
            ResourceKind::VmSpec => &mut self.vm_spec_handler,
            ResourceKind::Nlb => &mut self.nlb_handler,
            ResourceKind::Cluster => &mut self.cluster_handler,
            ResourceKind::MyImage => &mut self.my_image_handler,
            ResourceKind::Disk => &mut self.disk_handler,
            ResourceKind::RegionZone => &mut self.region_zone_handler,
            ResourceKind::PriceInfo => &mut self.price_info_handler,
            ResourceKind::Tag => &mut self.tag_handler,
        }
    }
}
