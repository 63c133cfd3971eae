use crate::credential::KeyValue;
use crate::iid::Iid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiskStatus {
    Creating,
    Available,
    Attached,
    Deleting,
    Failed,
}

impl std::fmt::Display for DiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiskStatus::Creating => write!(f, "Creating"),
            DiskStatus::Available => write!(f, "Available"),
            DiskStatus::Attached => write!(f, "Attached"),
            DiskStatus::Deleting => write!(f, "Deleting"),
            DiskStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiskReqInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    pub disk_type: String,

    /// Size in GB as text; empty selects the provider default
    pub disk_size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiskInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    pub disk_type: String,

    pub disk_size: String,

    pub status: DiskStatus,

    #[serde(rename = "OwnerVM")]
    pub owner_vm: Iid,

    pub created_time: String,

    pub key_value_list: Vec<KeyValue>,
}
