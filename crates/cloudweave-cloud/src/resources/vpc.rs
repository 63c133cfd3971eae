use crate::credential::KeyValue;
use crate::iid::Iid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    /// Empty in a request lets the provider pick a free block
    #[serde(rename = "IPv4_CIDR")]
    pub ipv4_cidr: String,

    pub zone: String,

    pub key_value_list: Vec<KeyValue>,
}

impl SubnetInfo {
    pub fn new(iid: Iid, ipv4_cidr: impl Into<String>) -> Self {
        Self {
            iid,
            ipv4_cidr: ipv4_cidr.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcReqInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    #[serde(rename = "IPv4_CIDR")]
    pub ipv4_cidr: String,

    pub subnet_info_list: Vec<SubnetInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    #[serde(rename = "IPv4_CIDR")]
    pub ipv4_cidr: String,

    pub subnet_info_list: Vec<SubnetInfo>,

    pub key_value_list: Vec<KeyValue>,
}

impl VpcInfo {
    pub fn subnet(&self, iid: &Iid) -> Option<&SubnetInfo> {
        self.subnet_info_list
            .iter()
            .find(|s| iid.matches(&s.iid.name_id, &s.iid.system_id))
    }
}
