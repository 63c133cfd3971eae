//! In-memory Cloudit used by the handler tests
//!
//! Every call is appended to a log so tests can assert on ordering and on
//! how often a provider operation ran.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cloudweave_cloud::credential::CLUSTER_ID;
use cloudweave_cloud::{
    CloudError, CredentialInfo, CredentialStore, KeyMaterial, KeyMaterialGenerator, KvBackend,
    KvEntry, MemoryBackend, MetadataStore, Namespace, ReconcilerConfig, Result,
};
use cloudweave_cloud_cloudit::ClouditContext;
use cloudweave_cloud_cloudit::api::ClouditApi;
use cloudweave_cloud_cloudit::model::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const CLUSTER_NAME: &str = "cluster-a";
pub const UBUNTU: &str = "Ubuntu-22.04";
pub const SPEC: &str = "small-2";
pub const KEY_PAIR: &str = "kp-1";

#[derive(Default)]
pub struct FakeState {
    pub subnets: Vec<RawSubnet>,
    pub available_ips: Vec<RawAvailableIp>,
    pub adaptive_ips: Vec<RawAdaptiveIp>,
    pub load_balancers: Vec<RawLoadBalancer>,
    pub servers: Vec<RawServer>,
    pub server_volumes: HashMap<String, Vec<RawServerVolume>>,
    pub volumes: Vec<RawVolume>,
    pub snapshots: Vec<RawSnapshot>,
    pub templates: Vec<RawTemplate>,
    pub specs: Vec<RawSpec>,
    pub clusters: Vec<RawCluster>,
    pub security_groups: Vec<RawSecurityGroup>,
    /// State a new server reports once created
    pub boot_state: String,
    /// State a new load balancer reports once created
    pub lb_state: String,
}

pub struct FakeCloudit {
    pub state: Mutex<FakeState>,
    calls: Mutex<Vec<String>>,
    /// Successful calls left per op before it starts failing
    failing: Mutex<HashMap<String, usize>>,
    next_id: AtomicUsize,
}

impl FakeCloudit {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                boot_state: "RUNNING".into(),
                lb_state: "COMPLETED".into(),
                ..Default::default()
            }),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Default subnet, one template, spec, cluster, the SSH group and three public IPs
    pub fn seeded() -> Arc<Self> {
        let fake = Self::new();
        {
            let mut state = fake.state.lock().unwrap();
            state.subnets.push(RawSubnet {
                id: "subnet-default".into(),
                name: "Default Network".into(),
                addr: "10.0.0.0".into(),
                prefix: "22".into(),
                state: "CREATED".into(),
                ..Default::default()
            });
            state.templates.push(RawTemplate {
                id: "tpl-ubuntu".into(),
                name: UBUNTU.into(),
                os: "Ubuntu".into(),
                state: "AVAILABLE".into(),
                ..Default::default()
            });
            state.specs.push(RawSpec {
                id: "spec-1".into(),
                name: SPEC.into(),
                cpu: 2,
                mem: 4,
                ..Default::default()
            });
            state.clusters.push(RawCluster {
                id: "cluster-1".into(),
                name: CLUSTER_NAME.into(),
                ..Default::default()
            });
            state.security_groups.push(RawSecurityGroup {
                id: "sg-ssh".into(),
                name: "SSH".into(),
                ..Default::default()
            });
            for i in 10..13 {
                state.available_ips.push(RawAvailableIp {
                    id: format!("ip-{}", i),
                    ip: format!("203.0.113.{}", i),
                });
            }
        }
        Arc::new(fake)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == op).count()
    }

    /// Calls that change provider state
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("list_") && !c.starts_with("get_") && c != "volume_owner")
            .collect()
    }

    pub fn fail(&self, op: &str) {
        self.fail_after(op, 0);
    }

    /// Let `op` succeed `calls` more times, then reject it
    pub fn fail_after(&self, op: &str, calls: usize) {
        self.failing.lock().unwrap().insert(op.to_string(), calls);
    }

    pub fn add_server(&self, name: &str, subnet_addr: &str, private_ip: &str) -> String {
        let id = self.id("vm");
        self.state.lock().unwrap().servers.push(RawServer {
            id: id.clone(),
            name: name.into(),
            host_name: name.into(),
            state: "RUNNING".into(),
            private_ip: private_ip.into(),
            subnet_addr: subnet_addr.into(),
            ..Default::default()
        });
        id
    }

    pub fn add_volume(&self, name: &str, size: i32) -> String {
        let id = self.id("vol");
        self.state.lock().unwrap().volumes.push(RawVolume {
            id: id.clone(),
            name: name.into(),
            state: "AVAILABLE".into(),
            size,
            ..Default::default()
        });
        id
    }

    fn id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn call(&self, op: &str) -> Result<()> {
        self.calls.lock().unwrap().push(op.to_string());
        match self.failing.lock().unwrap().get_mut(op) {
            Some(0) => Err(CloudError::UpstreamError(format!("{} rejected by fake", op))),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn not_found(what: &str, id: &str) -> CloudError {
    CloudError::NotFound(format!("{} '{}'", what, id))
}

#[async_trait]
impl ClouditApi for FakeCloudit {
    async fn list_subnets(&self) -> Result<Vec<RawSubnet>> {
        self.call("list_subnets")?;
        Ok(self.state.lock().unwrap().subnets.clone())
    }

    async fn create_subnet(&self, req: &SubnetCreateRequest) -> Result<RawSubnet> {
        self.call("create_subnet")?;
        let subnet = RawSubnet {
            id: self.id("subnet"),
            name: req.name.clone(),
            addr: req.addr.clone(),
            prefix: req.prefix.clone(),
            state: "CREATED".into(),
            ..Default::default()
        };
        self.state.lock().unwrap().subnets.push(subnet.clone());
        Ok(subnet)
    }

    async fn delete_subnet(&self, addr: &str) -> Result<()> {
        self.call("delete_subnet")?;
        self.state.lock().unwrap().subnets.retain(|s| s.addr != addr);
        Ok(())
    }

    async fn list_available_ips(&self) -> Result<Vec<RawAvailableIp>> {
        self.call("list_available_ips")?;
        Ok(self.state.lock().unwrap().available_ips.clone())
    }

    async fn list_adaptive_ips(&self) -> Result<Vec<RawAdaptiveIp>> {
        self.call("list_adaptive_ips")?;
        Ok(self.state.lock().unwrap().adaptive_ips.clone())
    }

    async fn create_adaptive_ip(&self, req: &AdaptiveIpCreateRequest) -> Result<()> {
        self.call("create_adaptive_ip")?;
        let mut state = self.state.lock().unwrap();
        state.available_ips.retain(|ip| ip.ip != req.ip);
        for server in state.servers.iter_mut() {
            if server.private_ip == req.private_ip {
                server.adaptive_ip = req.ip.clone();
            }
        }
        state.adaptive_ips.push(RawAdaptiveIp {
            id: format!("aip-{}", req.ip),
            name: req.name.clone(),
            ip: req.ip.clone(),
            private_ip: req.private_ip.clone(),
            state: "ACTIVE".into(),
        });
        Ok(())
    }

    async fn delete_adaptive_ip(&self, ip: &str) -> Result<()> {
        self.call("delete_adaptive_ip")?;
        let mut state = self.state.lock().unwrap();
        state.adaptive_ips.retain(|a| a.ip != ip);
        for server in state.servers.iter_mut() {
            if server.adaptive_ip == ip {
                server.adaptive_ip.clear();
            }
        }
        state.available_ips.push(RawAvailableIp {
            id: format!("ip-{}", ip),
            ip: ip.to_string(),
        });
        Ok(())
    }

    async fn list_load_balancers(&self) -> Result<Vec<RawLoadBalancer>> {
        self.call("list_load_balancers")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .load_balancers
            .iter()
            .map(|lb| RawLoadBalancer {
                members: Vec::new(),
                ..lb.clone()
            })
            .collect())
    }

    async fn list_lb_members(&self, lb_id: &str) -> Result<Vec<RawLbMember>> {
        self.call("list_lb_members")?;
        self.state
            .lock()
            .unwrap()
            .load_balancers
            .iter()
            .find(|lb| lb.id == lb_id)
            .map(|lb| lb.members.clone())
            .ok_or_else(|| not_found("load balancer", lb_id))
    }

    async fn create_load_balancer(
        &self,
        req: &LoadBalancerCreateRequest,
    ) -> Result<RawLoadBalancer> {
        self.call("create_load_balancer")?;
        let id = self.id("lb");
        let mut state = self.state.lock().unwrap();
        let members = req
            .members
            .iter()
            .map(|m| {
                let server = state.servers.iter().find(|s| s.private_ip == m.member_ip);
                RawLbMember {
                    id: self.id("member"),
                    member_ip: m.member_ip.clone(),
                    member_port: m.member_port.clone(),
                    lb_id: id.clone(),
                    network: req.network.clone(),
                    server_name: server.map(|s| s.name.clone()).unwrap_or_default(),
                    health_state: "OPEN".into(),
                    ..Default::default()
                }
            })
            .collect();
        let lb = RawLoadBalancer {
            id: id.clone(),
            name: req.name.clone(),
            state: state.lb_state.clone(),
            ip: req.ip.clone(),
            port: req.port,
            protocol: req.protocol.clone(),
            lb_type: req.lb_type.clone(),
            scheduler: req.scheduler.clone(),
            members,
            monitor_type: req.monitor_type.clone(),
            response_time: req.response_time,
            interval_time: req.interval_time,
            unhealthy_threshold: req.unhealthy_threshold,
            healthy_threshold: req.healthy_threshold,
            max_conn: req.max_conn,
            stats_port: req.stats_port,
            created_at: "2024-05-01 10:00:00".into(),
            ..Default::default()
        };
        state.available_ips.retain(|ip| ip.ip != req.ip);
        state.load_balancers.push(lb.clone());
        Ok(lb)
    }

    async fn delete_load_balancer(&self, lb_id: &str) -> Result<()> {
        self.call("delete_load_balancer")?;
        self.state
            .lock()
            .unwrap()
            .load_balancers
            .retain(|lb| lb.id != lb_id);
        Ok(())
    }

    async fn update_load_balancer(&self, lb_id: &str, req: &LbUpdateRequest) -> Result<()> {
        self.call("update_load_balancer")?;
        let mut state = self.state.lock().unwrap();
        let lb = state
            .load_balancers
            .iter_mut()
            .find(|lb| lb.id == lb_id)
            .ok_or_else(|| not_found("load balancer", lb_id))?;
        lb.description = req.description.clone();
        if let Some(name) = &req.name {
            lb.name = name.clone();
        }
        Ok(())
    }

    async fn update_lb_policy(&self, lb_id: &str, req: &LbPolicyUpdateRequest) -> Result<()> {
        self.call("update_lb_policy")?;
        let mut state = self.state.lock().unwrap();
        let lb = state
            .load_balancers
            .iter_mut()
            .find(|lb| lb.id == lb_id)
            .ok_or_else(|| not_found("load balancer", lb_id))?;
        lb.response_time = req.response_time;
        lb.interval_time = req.interval_time;
        lb.unhealthy_threshold = req.unhealthy_threshold;
        lb.healthy_threshold = req.healthy_threshold;
        Ok(())
    }

    async fn add_lb_member(&self, lb_id: &str, req: &LbAddMemberRequest) -> Result<()> {
        self.call("add_lb_member")?;
        let member_id = self.id("member");
        let mut state = self.state.lock().unwrap();
        let server_name = state
            .servers
            .iter()
            .find(|s| s.private_ip == req.member_ip)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let lb = state
            .load_balancers
            .iter_mut()
            .find(|lb| lb.id == lb_id)
            .ok_or_else(|| not_found("load balancer", lb_id))?;
        lb.members.push(RawLbMember {
            id: member_id,
            member_ip: req.member_ip.clone(),
            member_port: req.member_port.clone(),
            lb_id: lb_id.to_string(),
            network: req.network.clone(),
            server_name,
            host_name: req.host_name.clone(),
            health_state: "OPEN".into(),
            ..Default::default()
        });
        Ok(())
    }

    async fn delete_lb_member(&self, lb_id: &str, member_id: &str) -> Result<()> {
        self.call("delete_lb_member")?;
        let mut state = self.state.lock().unwrap();
        let lb = state
            .load_balancers
            .iter_mut()
            .find(|lb| lb.id == lb_id)
            .ok_or_else(|| not_found("load balancer", lb_id))?;
        lb.members.retain(|m| m.id != member_id);
        Ok(())
    }

    async fn list_servers(&self) -> Result<Vec<RawServer>> {
        self.call("list_servers")?;
        Ok(self.state.lock().unwrap().servers.clone())
    }

    async fn get_server(&self, id: &str) -> Result<RawServer> {
        self.call("get_server")?;
        self.state
            .lock()
            .unwrap()
            .servers
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| not_found("server", id))
    }

    async fn create_server(&self, req: &ServerCreateRequest) -> Result<RawServer> {
        self.call("create_server")?;
        let id = self.id("vm");
        let mut state = self.state.lock().unwrap();
        let private_ip = format!("10.0.0.{}", state.servers.len() + 10);
        let template = state
            .templates
            .iter()
            .find(|t| t.id == req.template_id)
            .cloned()
            .unwrap_or_default();
        let server = RawServer {
            id: id.clone(),
            name: req.name.clone(),
            host_name: req.host_name.clone(),
            state: state.boot_state.clone(),
            template: template.name,
            template_id: req.template_id.clone(),
            os_type: template.os,
            spec_id: req.spec_id.clone(),
            private_ip,
            subnet_addr: req.subnet_addr.clone(),
            cluster_id: req.cluster_id.clone(),
            description: req.description.clone(),
            secgroups: req
                .secgroups
                .iter()
                .filter_map(|g| state.security_groups.iter().find(|s| s.id == g.id))
                .map(|g| RawSecurityGroupRef {
                    id: g.id.clone(),
                    name: g.name.clone(),
                })
                .collect(),
            created_at: "2024-05-01 10:00:00".into(),
            ..Default::default()
        };
        state.server_volumes.insert(
            id.clone(),
            vec![RawServerVolume {
                volume_id: format!("root-{}", id),
                volume_name: format!("{}-root", req.name),
                dev: "vda".into(),
                ..Default::default()
            }],
        );
        state.servers.push(server.clone());
        Ok(server)
    }

    async fn server_action(&self, id: &str, action: ServerAction) -> Result<()> {
        self.call("server_action")?;
        let mut state = self.state.lock().unwrap();
        let server = state
            .servers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("server", id))?;
        server.state = match action {
            ServerAction::Shutdown => "STOPPED".into(),
            ServerAction::Start | ServerAction::Reboot => "RUNNING".into(),
        };
        Ok(())
    }

    async fn delete_server(&self, id: &str) -> Result<()> {
        self.call("delete_server")?;
        let mut state = self.state.lock().unwrap();
        state.servers.retain(|s| s.id != id);
        state.server_volumes.remove(id);
        Ok(())
    }

    async fn list_server_volumes(&self, server_id: &str) -> Result<Vec<RawServerVolume>> {
        self.call("list_server_volumes")?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .server_volumes
            .get(server_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn attach_volume(&self, server_id: &str, volume_id: &str) -> Result<()> {
        self.call("attach_volume")?;
        let mut state = self.state.lock().unwrap();
        let volume = state
            .volumes
            .iter_mut()
            .find(|v| v.id == volume_id)
            .ok_or_else(|| not_found("volume", volume_id))?;
        volume.state = "IN_USE".into();
        let name = volume.name.clone();
        let attached = state.server_volumes.entry(server_id.to_string()).or_default();
        let dev = format!("vd{}", (b'a' + attached.len() as u8) as char);
        attached.push(RawServerVolume {
            volume_id: volume_id.to_string(),
            volume_name: name,
            dev,
            ..Default::default()
        });
        Ok(())
    }

    async fn detach_volume(&self, server_id: &str, volume_id: &str) -> Result<()> {
        self.call("detach_volume")?;
        let mut state = self.state.lock().unwrap();
        if let Some(attached) = state.server_volumes.get_mut(server_id) {
            attached.retain(|v| v.volume_id != volume_id);
        }
        if let Some(volume) = state.volumes.iter_mut().find(|v| v.id == volume_id) {
            volume.state = "AVAILABLE".into();
        }
        Ok(())
    }

    async fn list_volumes(&self) -> Result<Vec<RawVolume>> {
        self.call("list_volumes")?;
        Ok(self.state.lock().unwrap().volumes.clone())
    }

    async fn create_volume(&self, req: &VolumeCreateRequest) -> Result<RawVolume> {
        self.call("create_volume")?;
        let volume = RawVolume {
            id: self.id("vol"),
            name: req.name.clone(),
            state: "AVAILABLE".into(),
            size: req.size,
            cluster_id: req.cluster_id.clone(),
            ..Default::default()
        };
        self.state.lock().unwrap().volumes.push(volume.clone());
        Ok(volume)
    }

    async fn update_volume(&self, id: &str, req: &VolumeUpdateRequest) -> Result<()> {
        self.call("update_volume")?;
        let mut state = self.state.lock().unwrap();
        let volume = state
            .volumes
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| not_found("volume", id))?;
        volume.size = req.size;
        Ok(())
    }

    async fn delete_volume(&self, id: &str) -> Result<()> {
        self.call("delete_volume")?;
        self.state.lock().unwrap().volumes.retain(|v| v.id != id);
        Ok(())
    }

    async fn volume_owner(&self, id: &str) -> Result<Option<RawVolumeOwner>> {
        self.call("volume_owner")?;
        let state = self.state.lock().unwrap();
        Ok(state.server_volumes.iter().find_map(|(server_id, volumes)| {
            volumes.iter().find(|v| v.volume_id == id).and_then(|_| {
                state
                    .servers
                    .iter()
                    .find(|s| &s.id == server_id)
                    .map(|s| RawVolumeOwner {
                        vm_id: s.id.clone(),
                        vm_name: s.name.clone(),
                    })
            })
        }))
    }

    async fn list_snapshots(&self) -> Result<Vec<RawSnapshot>> {
        self.call("list_snapshots")?;
        Ok(self.state.lock().unwrap().snapshots.clone())
    }

    async fn create_snapshot(&self, req: &SnapshotCreateRequest) -> Result<()> {
        self.call("create_snapshot")?;
        let id = self.id("snap");
        let mut state = self.state.lock().unwrap();
        let attached = state
            .server_volumes
            .iter()
            .find_map(|(server_id, volumes)| {
                volumes
                    .iter()
                    .find(|v| v.volume_id == req.volume_id)
                    .map(|v| (server_id.clone(), v.dev.clone()))
            });
        let (dev, template_id) = match attached {
            Some((server_id, dev)) => {
                let template_id = state
                    .servers
                    .iter()
                    .find(|s| s.id == server_id)
                    .map(|s| s.template_id.clone())
                    .unwrap_or_default();
                (dev, template_id)
            }
            None => (String::new(), String::new()),
        };
        let size = state
            .volumes
            .iter()
            .find(|v| v.id == req.volume_id)
            .map(|v| v.size)
            .unwrap_or_default();
        state.snapshots.push(RawSnapshot {
            id,
            name: req.name.clone(),
            volume_id: req.volume_id.clone(),
            state: "AVAILABLE".into(),
            size,
            bootable: if dev == "vda" { "yes" } else { "no" }.into(),
            template_id,
            dev,
            created_at: "2024-05-01 10:00:00".into(),
            ..Default::default()
        });
        Ok(())
    }

    async fn create_volume_from_snapshot(
        &self,
        snapshot_id: &str,
        req: &VolumeFromSnapshotRequest,
    ) -> Result<()> {
        self.call("create_volume_from_snapshot")?;
        let id = self.id("vol");
        let mut state = self.state.lock().unwrap();
        let snapshot = state
            .snapshots
            .iter()
            .find(|s| s.id == snapshot_id)
            .cloned()
            .ok_or_else(|| not_found("snapshot", snapshot_id))?;
        state.volumes.push(RawVolume {
            id,
            name: req.volume_name.clone(),
            state: "AVAILABLE".into(),
            size: snapshot.size,
            bootable: "no".into(),
            ..Default::default()
        });
        Ok(())
    }

    async fn delete_snapshot(&self, id: &str) -> Result<()> {
        self.call("delete_snapshot")?;
        self.state.lock().unwrap().snapshots.retain(|s| s.id != id);
        Ok(())
    }

    async fn list_templates(&self) -> Result<Vec<RawTemplate>> {
        self.call("list_templates")?;
        Ok(self.state.lock().unwrap().templates.clone())
    }

    async fn list_specs(&self) -> Result<Vec<RawSpec>> {
        self.call("list_specs")?;
        Ok(self.state.lock().unwrap().specs.clone())
    }

    async fn list_clusters(&self) -> Result<Vec<RawCluster>> {
        self.call("list_clusters")?;
        Ok(self.state.lock().unwrap().clusters.clone())
    }

    async fn list_security_groups(&self) -> Result<Vec<RawSecurityGroup>> {
        self.call("list_security_groups")?;
        Ok(self.state.lock().unwrap().security_groups.clone())
    }

    async fn list_security_rules(&self, group_id: &str) -> Result<Vec<RawSecurityRule>> {
        self.call("list_security_rules")?;
        self.state
            .lock()
            .unwrap()
            .security_groups
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.rules.clone())
            .ok_or_else(|| not_found("security group", group_id))
    }

    async fn create_security_group(
        &self,
        req: &SecurityGroupCreateRequest,
    ) -> Result<RawSecurityGroup> {
        self.call("create_security_group")?;
        let id = self.id("sg");
        let rules = req
            .rules
            .iter()
            .map(|r| RawSecurityRule {
                id: self.id("rule"),
                name: r.name.clone(),
                sec_group_id: id.clone(),
                rule_type: r.rule_type.clone(),
                port: r.port.clone(),
                target: r.target.clone(),
                protocol: r.protocol.clone(),
                ..Default::default()
            })
            .collect();
        let group = RawSecurityGroup {
            id,
            name: req.name.clone(),
            rules,
            ..Default::default()
        };
        self.state
            .lock()
            .unwrap()
            .security_groups
            .push(group.clone());
        Ok(group)
    }

    async fn delete_security_group(&self, group_id: &str) -> Result<()> {
        self.call("delete_security_group")?;
        self.state
            .lock()
            .unwrap()
            .security_groups
            .retain(|g| g.id != group_id);
        Ok(())
    }
}

/// Deterministic key material: the "private key" carries the public blob
pub struct FixedKeyGenerator {
    counter: AtomicUsize,
}

const PRIVATE_PREFIX: &str = "TEST PRIVATE KEY ";

impl FixedKeyGenerator {
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(1),
        }
    }
}

impl KeyMaterialGenerator for FixedKeyGenerator {
    fn generate(&self) -> Result<KeyMaterial> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let blob = STANDARD.encode(format!("ssh-rsa-test-key-{}", n));
        Ok(KeyMaterial {
            private_key: format!("{}{}", PRIVATE_PREFIX, blob),
            public_key: format!("ssh-rsa {}", blob),
        })
    }

    fn public_key_from_private(&self, private_key: &str) -> Result<String> {
        private_key
            .strip_prefix(PRIVATE_PREFIX)
            .map(|blob| format!("ssh-rsa {}", blob))
            .ok_or_else(|| CloudError::InvalidArgument("not a test key".into()))
    }
}

/// Handler context over `fake` with an in-memory store and instant polling
pub fn context(fake: Arc<FakeCloudit>) -> ClouditContext {
    context_with_store(fake, MetadataStore::shared(MemoryBackend::new()))
}

/// `context` with [`KEY_PAIR`] already registered, as VM starts require
pub async fn vm_context(fake: Arc<FakeCloudit>) -> ClouditContext {
    let ctx = context(fake);
    ctx.store
        .put(Namespace::KeyPair, KEY_PAIR, "test-private-key")
        .await
        .unwrap();
    ctx
}

/// Store backend that reads like an empty store and rejects every write
pub struct ReadOnlyBackend;

#[async_trait]
impl KvBackend for ReadOnlyBackend {
    async fn put(&self, key: &str, _value: &str) -> Result<()> {
        Err(CloudError::StoreUnavailable(format!("{} is read-only", key)))
    }

    async fn get_prefix(&self, _prefix: &str) -> Result<Vec<KvEntry>> {
        Ok(Vec::new())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Err(CloudError::StoreUnavailable(format!("{} is read-only", key)))
    }
}

pub fn context_with_store(fake: Arc<FakeCloudit>, store: Arc<MetadataStore>) -> ClouditContext {
    ClouditContext {
        api: fake,
        store: CredentialStore::new(store, "CLOUDIT", "test-credential"),
        reconciler: ReconcilerConfig::immediate(5),
        credential: CredentialInfo::new().with(CLUSTER_ID, CLUSTER_NAME),
        keygen: Arc::new(FixedKeyGenerator::new()),
        cancel: None,
    }
}
