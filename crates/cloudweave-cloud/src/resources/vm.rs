use crate::credential::KeyValue;
use crate::iid::Iid;
use serde::{Deserialize, Serialize};

/// Where the boot image of a VM comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageType {
    #[default]
    PublicImage,
    MyImage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VmReqInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    #[serde(rename = "ImageIID")]
    pub image_iid: Iid,

    pub image_type: ImageType,

    #[serde(rename = "VpcIID")]
    pub vpc_iid: Iid,

    #[serde(rename = "SubnetIID")]
    pub subnet_iid: Iid,

    #[serde(rename = "SecurityGroupIIDs")]
    pub security_group_iids: Vec<Iid>,

    pub vm_spec_name: String,

    #[serde(rename = "KeyPairIID")]
    pub key_pair_iid: Iid,

    pub root_disk_size: String,

    #[serde(rename = "DataDiskIIDs")]
    pub data_disk_iids: Vec<Iid>,

    pub vm_user_id: String,

    pub vm_user_passwd: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VmInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    pub start_time: String,

    #[serde(rename = "ImageIId")]
    pub image_iid: Iid,

    pub vm_spec_name: String,

    #[serde(rename = "VpcIID")]
    pub vpc_iid: Iid,

    #[serde(rename = "SubnetIID")]
    pub subnet_iid: Iid,

    #[serde(rename = "SecurityGroupIIds")]
    pub security_group_iids: Vec<Iid>,

    #[serde(rename = "KeyPairIId")]
    pub key_pair_iid: Iid,

    #[serde(rename = "PublicIP")]
    pub public_ip: String,

    #[serde(rename = "PrivateIP")]
    pub private_ip: String,

    pub root_disk_size: String,

    #[serde(rename = "DataDiskIIDs")]
    pub data_disk_iids: Vec<Iid>,

    pub ssh_access_point: String,

    pub vm_user_id: String,

    pub key_value_list: Vec<KeyValue>,
}

/// Lifecycle state of a VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmStatus {
    Creating,
    Running,
    Suspending,
    Suspended,
    Resuming,
    Rebooting,
    Terminating,
    Terminated,
    NotExist,
    Failed,
}

impl std::fmt::Display for VmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VmStatus::Creating => write!(f, "Creating"),
            VmStatus::Running => write!(f, "Running"),
            VmStatus::Suspending => write!(f, "Suspending"),
            VmStatus::Suspended => write!(f, "Suspended"),
            VmStatus::Resuming => write!(f, "Resuming"),
            VmStatus::Rebooting => write!(f, "Rebooting"),
            VmStatus::Terminating => write!(f, "Terminating"),
            VmStatus::Terminated => write!(f, "Terminated"),
            VmStatus::NotExist => write!(f, "NotExist"),
            VmStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VmStatusInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    pub vm_status: VmStatus,
}
