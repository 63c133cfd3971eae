//! Network load balancer structures
//!
//! An NLB is a listener (public endpoint), a VM group (members plus the
//! port traffic is forwarded to) and a health checker probing the members.

use crate::credential::KeyValue;
use crate::iid::Iid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NlbScope {
    #[default]
    Region,
    Global,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListenerInfo {
    pub protocol: String,

    #[serde(rename = "IP")]
    pub ip: String,

    pub port: String,

    #[serde(rename = "DNSName")]
    pub dns_name: String,

    #[serde(rename = "CspID")]
    pub csp_id: String,

    pub key_value_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VmGroupInfo {
    pub protocol: String,

    pub port: String,

    #[serde(rename = "VMs")]
    pub vms: Vec<Iid>,

    #[serde(rename = "CspID")]
    pub csp_id: String,

    pub key_value_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheckerInfo {
    pub protocol: String,

    pub port: String,

    /// Seconds between health checks
    pub interval: i32,

    /// Seconds before a health check counts as failed
    pub timeout: i32,

    pub threshold: i32,

    #[serde(rename = "CspID")]
    pub csp_id: String,

    pub key_value_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NlbReqInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    #[serde(rename = "VpcIID")]
    pub vpc_iid: Iid,

    /// `PUBLIC` or `INTERNAL`
    #[serde(rename = "Type")]
    pub nlb_type: String,

    pub scope: NlbScope,

    pub listener: ListenerInfo,

    #[serde(rename = "VMGroup")]
    pub vm_group: VmGroupInfo,

    pub health_checker: HealthCheckerInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NlbInfo {
    #[serde(rename = "IId")]
    pub iid: Iid,

    #[serde(rename = "VpcIID")]
    pub vpc_iid: Iid,

    #[serde(rename = "Type")]
    pub nlb_type: String,

    pub scope: NlbScope,

    pub listener: ListenerInfo,

    #[serde(rename = "VMGroup")]
    pub vm_group: VmGroupInfo,

    pub health_checker: HealthCheckerInfo,

    pub created_time: String,

    pub key_value_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthInfo {
    #[serde(rename = "AllVMs")]
    pub all_vms: Vec<Iid>,

    #[serde(rename = "HealthyVMs")]
    pub healthy_vms: Vec<Iid>,

    #[serde(rename = "UnHealthyVMs")]
    pub unhealthy_vms: Vec<Iid>,
}
