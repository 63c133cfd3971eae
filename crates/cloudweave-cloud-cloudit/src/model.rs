//! Raw Cloudit wire structures
//!
//! These mirror what the Cloudit services send and accept. Fields the
//! canonical structures have no slot for are exported through static
//! key/value tables so callers still see them in `key_value_list`.

use cloudweave_cloud::KeyValue;
use serde::{Deserialize, Serialize};

pub type FieldGetter<T> = (&'static str, fn(&T) -> String);

/// Export the fields named in `table` as key/value pairs, skipping empties.
pub fn key_values<T>(raw: &T, table: &[FieldGetter<T>]) -> Vec<KeyValue> {
    table
        .iter()
        .filter_map(|(key, get)| {
            let value = get(raw);
            (!value.is_empty()).then(|| KeyValue::new(*key, value))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// DNA: subnets, adaptive IPs, load balancers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSubnet {
    pub id: String,
    pub name: String,
    pub addr: String,
    pub prefix: String,
    pub gateway: String,
    pub state: String,
    pub protection: i32,
    pub creator: String,
    pub created_at: String,
}

impl RawSubnet {
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.addr, self.prefix)
    }

    pub fn is_available(&self) -> bool {
        self.state.eq_ignore_ascii_case("available") || self.state.eq_ignore_ascii_case("created")
    }
}

pub const SUBNET_KEY_VALUES: &[FieldGetter<RawSubnet>] = &[
    ("Gateway", |s| s.gateway.clone()),
    ("State", |s| s.state.clone()),
    ("Creator", |s| s.creator.clone()),
    ("CreatedAt", |s| s.created_at.clone()),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetCreateRequest {
    pub name: String,
    pub addr: String,
    pub prefix: String,
}

/// Public IP that is free to allocate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAvailableIp {
    pub id: String,
    pub ip: String,
}

/// Public IP bound to a private address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAdaptiveIp {
    pub id: String,
    pub name: String,
    pub ip: String,
    pub private_ip: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveIpCreateRequest {
    pub name: String,
    pub ip: String,
    pub private_ip: String,
    pub protection: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLbMember {
    pub id: String,
    pub member_ip: String,
    pub member_port: String,
    pub lb_id: String,
    pub network: String,
    pub server_name: String,
    pub state: String,
    pub health_state: String,
    pub host_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLoadBalancer {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub state: String,
    pub ip: String,
    pub port: i32,
    pub protocol: String,
    pub ha_ca_id: String,
    #[serde(rename = "type")]
    pub lb_type: String,
    pub scheduler: String,
    pub members: Vec<RawLbMember>,
    pub member_count: i32,
    pub creator: String,
    pub protection: i32,
    pub monitor_type: String,
    pub response_time: i32,
    pub interval_time: i32,
    pub unhealthy_threshold: i32,
    pub healthy_threshold: i32,
    pub http_url: String,
    pub description: String,
    pub created_at: String,
    pub url: String,
    pub max_conn: i32,
    pub stats_port: i32,
}

pub const LOAD_BALANCER_KEY_VALUES: &[FieldGetter<RawLoadBalancer>] = &[
    ("State", |l| l.state.clone()),
    ("Scheduler", |l| l.scheduler.clone()),
    ("HaCaId", |l| l.ha_ca_id.clone()),
    ("Creator", |l| l.creator.clone()),
    ("MaxConn", |l| l.max_conn.to_string()),
    ("StatsPort", |l| l.stats_port.to_string()),
    ("Url", |l| l.url.clone()),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LbReqMember {
    pub member_ip: String,
    pub member_port: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerCreateRequest {
    pub name: String,
    pub ip: String,
    pub scheduler: String,
    pub port: i32,
    pub protocol: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub network: String,
    pub members: Vec<LbReqMember>,
    pub monitor_type: String,
    pub max_conn: i32,
    pub stats_port: i32,
    #[serde(rename = "type")]
    pub lb_type: String,
    pub response_time: i32,
    pub interval_time: i32,
    pub unhealthy_threshold: i32,
    pub healthy_threshold: i32,
    pub http_url: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LbAddMemberRequest {
    pub network: String,
    pub member_ip: String,
    pub member_port: String,
    pub host_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LbUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LbPolicyUpdateRequest {
    pub scheduler: String,
    pub response_time: i32,
    pub interval_time: i32,
    pub unhealthy_threshold: i32,
    pub healthy_threshold: i32,
}

// ---------------------------------------------------------------------------
// ACE: servers, volumes, snapshots, templates, specs, clusters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSecurityGroupRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawServer {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub host_name: String,
    pub state: String,
    pub cpu_num: f32,
    pub mem_size: f32,
    pub template: String,
    pub template_id: String,
    pub os_type: String,
    pub spec: String,
    pub spec_id: String,
    pub private_ip: String,
    pub adaptive_ip: String,
    pub subnet_addr: String,
    pub volume_id: String,
    pub volume_size: i32,
    pub cluster_id: String,
    pub cluster_name: String,
    pub node_ip: String,
    pub node_host_name: String,
    pub mac_addr: String,
    pub secgroups: Vec<RawSecurityGroupRef>,
    pub description: String,
    pub created_at: String,
}

impl RawServer {
    pub fn is_windows(&self) -> bool {
        self.template.to_ascii_lowercase().contains("window")
            || self.os_type.to_ascii_lowercase().contains("window")
    }
}

pub const SERVER_KEY_VALUES: &[FieldGetter<RawServer>] = &[
    ("State", |s| s.state.clone()),
    ("Template", |s| s.template.clone()),
    ("OsType", |s| s.os_type.clone()),
    ("CpuNum", |s| s.cpu_num.to_string()),
    ("MemSize", |s| s.mem_size.to_string()),
    ("ClusterName", |s| s.cluster_name.clone()),
    ("NodeIp", |s| s.node_ip.clone()),
    ("NodeHostName", |s| s.node_host_name.clone()),
    ("MacAddr", |s| s.mac_addr.clone()),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecGroupId {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCreateRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub template_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub snapshot_id: String,
    pub spec_id: String,
    pub name: String,
    pub host_name: String,
    pub root_password: String,
    pub subnet_addr: String,
    pub secgroups: Vec<SecGroupId>,
    pub description: String,
    pub protection: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cluster_id: String,
}

/// Power actions on a server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerAction {
    Shutdown,
    Start,
    Reboot,
}

impl ServerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerAction::Shutdown => "shutdown",
            ServerAction::Start => "start",
            ServerAction::Reboot => "reboot",
        }
    }
}

/// Volume as seen from the server it is attached to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawServerVolume {
    pub volume_id: String,
    pub volume_name: String,
    pub dev: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawVolume {
    pub id: String,
    pub name: String,
    pub state: String,
    pub size: i32,
    pub created_at: String,
    pub template_id: String,
    pub cluster_id: String,
    pub pool_id: String,
    pub bootable: String,
    pub iops: i32,
    pub throughput: i32,
    pub creator: String,
    pub description: String,
    pub dev: String,
}

pub const VOLUME_KEY_VALUES: &[FieldGetter<RawVolume>] = &[
    ("TemplateId", |v| v.template_id.clone()),
    ("ClusterId", |v| v.cluster_id.clone()),
    ("PoolId", |v| v.pool_id.clone()),
    ("Bootable", |v| v.bootable.clone()),
    ("Iops", |v| v.iops.to_string()),
    ("Throughput", |v| v.throughput.to_string()),
    ("Creator", |v| v.creator.clone()),
    ("Description", |v| v.description.clone()),
    ("Dev", |v| v.dev.clone()),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeCreateRequest {
    pub name: String,
    pub cluster_id: String,
    pub size: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mode: String,
}

/// Body of a volume restored from a snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeFromSnapshotRequest {
    pub volume_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeUpdateRequest {
    pub name: String,
    pub size: i32,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawVolumeOwner {
    pub vm_id: String,
    pub vm_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAttachRequest {
    pub volume_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSnapshot {
    pub id: String,
    pub name: String,
    pub volume_id: String,
    pub state: String,
    pub size: i32,
    pub bootable: String,
    pub template_id: String,
    pub dev: String,
    pub created_at: String,
}

pub const SNAPSHOT_KEY_VALUES: &[FieldGetter<RawSnapshot>] = &[
    ("VolumeId", |s| s.volume_id.clone()),
    ("TemplateId", |s| s.template_id.clone()),
    ("Bootable", |s| s.bootable.clone()),
    ("Dev", |s| s.dev.clone()),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCreateRequest {
    pub name: String,
    pub volume_id: String,
}

/// Public template (image)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTemplate {
    pub id: String,
    pub name: String,
    pub os: String,
    pub state: String,
    pub size: i32,
    pub ownership: String,
    pub cluster_name: String,
    pub created_at: String,
}

pub const TEMPLATE_KEY_VALUES: &[FieldGetter<RawTemplate>] = &[
    ("State", |t| t.state.clone()),
    ("Ownership", |t| t.ownership.clone()),
    ("ClusterName", |t| t.cluster_name.clone()),
    ("CreatedAt", |t| t.created_at.clone()),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSpec {
    pub id: String,
    pub name: String,
    pub cpu: i32,
    pub mem: i32,
    pub gpu: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCluster {
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// IAM: security groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSecurityRule {
    pub id: String,
    pub name: String,
    pub sec_group_id: String,
    /// `inbound` or `outbound`
    #[serde(rename = "type")]
    pub rule_type: String,
    pub port: String,
    pub target: String,
    pub protocol: String,
    pub creator: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSecurityGroup {
    pub id: String,
    pub name: String,
    pub tenant_id: String,
    pub state: String,
    pub rules_count: i32,
    pub protection: i32,
    pub creator: String,
    pub created_at: String,
    pub rules: Vec<RawSecurityRule>,
}

pub const SECURITY_GROUP_KEY_VALUES: &[FieldGetter<RawSecurityGroup>] = &[
    ("State", |g| g.state.clone()),
    ("Creator", |g| g.creator.clone()),
    ("CreatedAt", |g| g.created_at.clone()),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRuleRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    pub port: String,
    pub target: String,
    pub protocol: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupCreateRequest {
    pub name: String,
    pub rules: Vec<SecurityRuleRequest>,
    pub protection: i32,
}
