use crate::credential::KeyValue;
use crate::iid::Iid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageStatus {
    Available,
    Unavailable,
}

/// Public template image
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    #[serde(rename = "GuestOS")]
    pub guest_os: String,

    pub status: ImageStatus,

    pub key_value_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MyImageStatus {
    Available,
    Unavailable,
    Deleting,
}

impl std::fmt::Display for MyImageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MyImageStatus::Available => write!(f, "Available"),
            MyImageStatus::Unavailable => write!(f, "Unavailable"),
            MyImageStatus::Deleting => write!(f, "Deleting"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MyImageReqInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    #[serde(rename = "SourceVM")]
    pub source_vm: Iid,
}

/// User snapshot image of a VM, possibly spanning several volume snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MyImageInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    #[serde(rename = "SourceVM")]
    pub source_vm: Iid,

    pub status: MyImageStatus,

    pub created_time: String,

    pub key_value_list: Vec<KeyValue>,
}
