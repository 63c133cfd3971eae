use crate::credential::KeyValue;
use crate::iid::Iid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityRuleInfo {
    /// `inbound` or `outbound`
    pub direction: String,

    #[serde(rename = "IPProtocol")]
    pub ip_protocol: String,

    pub from_port: String,

    pub to_port: String,

    #[serde(rename = "CIDR")]
    pub cidr: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityReqInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    #[serde(rename = "VpcIID")]
    pub vpc_iid: Iid,

    pub security_rules: Vec<SecurityRuleInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    #[serde(rename = "VpcIID")]
    pub vpc_iid: Iid,

    pub security_rules: Vec<SecurityRuleInfo>,

    /// VMs currently associated with the group
    #[serde(rename = "VMIIds")]
    pub vm_iids: Vec<Iid>,

    pub key_value_list: Vec<KeyValue>,
}
