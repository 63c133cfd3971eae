//! Typed Cloudit operations
//!
//! Handlers talk to [`ClouditApi`] rather than to URLs, so they can be
//! exercised against an in-memory provider.

use crate::client::{Engine, RestClient};
use crate::model::{
    AdaptiveIpCreateRequest, LbAddMemberRequest, LbPolicyUpdateRequest, LbUpdateRequest,
    LoadBalancerCreateRequest, RawAdaptiveIp, RawAvailableIp, RawCluster, RawLbMember,
    RawLoadBalancer, RawSecurityGroup, RawSecurityRule, RawServer, RawServerVolume, RawSnapshot,
    RawSpec, RawSubnet, RawTemplate, RawVolume, RawVolumeOwner, SecurityGroupCreateRequest,
    ServerAction, ServerCreateRequest, SnapshotCreateRequest, SubnetCreateRequest,
    VolumeAttachRequest, VolumeCreateRequest, VolumeFromSnapshotRequest, VolumeUpdateRequest,
};
use async_trait::async_trait;
use cloudweave_cloud::Result;
use serde::Deserialize;

#[async_trait]
pub trait ClouditApi: Send + Sync {
    // DNA
    async fn list_subnets(&self) -> Result<Vec<RawSubnet>>;
    async fn create_subnet(&self, req: &SubnetCreateRequest) -> Result<RawSubnet>;
    async fn delete_subnet(&self, addr: &str) -> Result<()>;

    async fn list_available_ips(&self) -> Result<Vec<RawAvailableIp>>;
    async fn list_adaptive_ips(&self) -> Result<Vec<RawAdaptiveIp>>;
    async fn create_adaptive_ip(&self, req: &AdaptiveIpCreateRequest) -> Result<()>;
    async fn delete_adaptive_ip(&self, ip: &str) -> Result<()>;

    /// Load balancers without their member lists
    async fn list_load_balancers(&self) -> Result<Vec<RawLoadBalancer>>;
    async fn list_lb_members(&self, lb_id: &str) -> Result<Vec<RawLbMember>>;
    async fn create_load_balancer(&self, req: &LoadBalancerCreateRequest)
    -> Result<RawLoadBalancer>;
    async fn delete_load_balancer(&self, lb_id: &str) -> Result<()>;
    async fn update_load_balancer(&self, lb_id: &str, req: &LbUpdateRequest) -> Result<()>;
    async fn update_lb_policy(&self, lb_id: &str, req: &LbPolicyUpdateRequest) -> Result<()>;
    async fn add_lb_member(&self, lb_id: &str, req: &LbAddMemberRequest) -> Result<()>;
    async fn delete_lb_member(&self, lb_id: &str, member_id: &str) -> Result<()>;

    // ACE
    async fn list_servers(&self) -> Result<Vec<RawServer>>;
    async fn get_server(&self, id: &str) -> Result<RawServer>;
    async fn create_server(&self, req: &ServerCreateRequest) -> Result<RawServer>;
    async fn server_action(&self, id: &str, action: ServerAction) -> Result<()>;
    async fn delete_server(&self, id: &str) -> Result<()>;
    async fn list_server_volumes(&self, server_id: &str) -> Result<Vec<RawServerVolume>>;
    async fn attach_volume(&self, server_id: &str, volume_id: &str) -> Result<()>;
    async fn detach_volume(&self, server_id: &str, volume_id: &str) -> Result<()>;

    async fn list_volumes(&self) -> Result<Vec<RawVolume>>;
    async fn create_volume(&self, req: &VolumeCreateRequest) -> Result<RawVolume>;
    async fn update_volume(&self, id: &str, req: &VolumeUpdateRequest) -> Result<()>;
    async fn delete_volume(&self, id: &str) -> Result<()>;
    async fn volume_owner(&self, id: &str) -> Result<Option<RawVolumeOwner>>;

    async fn list_snapshots(&self) -> Result<Vec<RawSnapshot>>;
    async fn create_snapshot(&self, req: &SnapshotCreateRequest) -> Result<()>;
    async fn delete_snapshot(&self, id: &str) -> Result<()>;
    async fn create_volume_from_snapshot(
        &self,
        snapshot_id: &str,
        req: &VolumeFromSnapshotRequest,
    ) -> Result<()>;

    async fn list_templates(&self) -> Result<Vec<RawTemplate>>;
    async fn list_specs(&self) -> Result<Vec<RawSpec>>;
    async fn list_clusters(&self) -> Result<Vec<RawCluster>>;

    // IAM
    async fn list_security_groups(&self) -> Result<Vec<RawSecurityGroup>>;
    async fn list_security_rules(&self, group_id: &str) -> Result<Vec<RawSecurityRule>>;
    async fn create_security_group(
        &self,
        req: &SecurityGroupCreateRequest,
    ) -> Result<RawSecurityGroup>;
    async fn delete_security_group(&self, group_id: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct SpecList {
    #[serde(default)]
    list: Vec<RawSpec>,
}

/// [`ClouditApi`] over the REST transport
pub struct RestClouditApi {
    client: RestClient,
}

impl RestClouditApi {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }
}

#[async_trait]
impl ClouditApi for RestClouditApi {
    async fn list_subnets(&self) -> Result<Vec<RawSubnet>> {
        let url = self.client.url(Engine::Dna, &["subnets"]);
        Ok(self.client.get(&url).await?)
    }

    async fn create_subnet(&self, req: &SubnetCreateRequest) -> Result<RawSubnet> {
        let url = self.client.url(Engine::Dna, &["subnets"]);
        Ok(self.client.post(&url, req).await?)
    }

    async fn delete_subnet(&self, addr: &str) -> Result<()> {
        let url = self.client.url(Engine::Dna, &["subnets", addr]);
        Ok(self.client.delete(&url).await?)
    }

    async fn list_available_ips(&self) -> Result<Vec<RawAvailableIp>> {
        let url = self.client.url(Engine::Dna, &["adaptive-ips", "available"]);
        Ok(self.client.get(&url).await?)
    }

    async fn list_adaptive_ips(&self) -> Result<Vec<RawAdaptiveIp>> {
        let url = self.client.url(Engine::Dna, &["adaptive-ips"]);
        Ok(self.client.get(&url).await?)
    }

    async fn create_adaptive_ip(&self, req: &AdaptiveIpCreateRequest) -> Result<()> {
        let url = self.client.url(Engine::Dna, &["adaptive-ips"]);
        Ok(self.client.post_empty(&url, Some(req)).await?)
    }

    async fn delete_adaptive_ip(&self, ip: &str) -> Result<()> {
        let url = self.client.url(Engine::Dna, &["adaptive-ips", ip]);
        Ok(self.client.delete(&url).await?)
    }

    async fn list_load_balancers(&self) -> Result<Vec<RawLoadBalancer>> {
        let url = self.client.url(Engine::Dna, &["load-balancers"]);
        Ok(self.client.get(&url).await?)
    }

    async fn list_lb_members(&self, lb_id: &str) -> Result<Vec<RawLbMember>> {
        let url = self.client.url(Engine::Dna, &["load-balancers", lb_id]);
        Ok(self.client.get(&url).await?)
    }

    async fn create_load_balancer(
        &self,
        req: &LoadBalancerCreateRequest,
    ) -> Result<RawLoadBalancer> {
        let url = self.client.url(Engine::Dna, &["load-balancers"]);
        Ok(self.client.post(&url, req).await?)
    }

    async fn delete_load_balancer(&self, lb_id: &str) -> Result<()> {
        let url = self.client.url(Engine::Dna, &["load-balancers", lb_id]);
        Ok(self.client.delete(&url).await?)
    }

    async fn update_load_balancer(&self, lb_id: &str, req: &LbUpdateRequest) -> Result<()> {
        let url = self.client.url(Engine::Dna, &["load-balancers", lb_id, "update"]);
        Ok(self.client.put(&url, req).await?)
    }

    async fn update_lb_policy(&self, lb_id: &str, req: &LbPolicyUpdateRequest) -> Result<()> {
        let url = self.client.url(Engine::Dna, &["load-balancers", lb_id, "policy"]);
        Ok(self.client.put(&url, req).await?)
    }

    async fn add_lb_member(&self, lb_id: &str, req: &LbAddMemberRequest) -> Result<()> {
        let url = self.client.url(Engine::Dna, &["load-balancers", lb_id]);
        Ok(self.client.post_empty(&url, Some(req)).await?)
    }

    async fn delete_lb_member(&self, lb_id: &str, member_id: &str) -> Result<()> {
        let url = self
            .client
            .url(Engine::Dna, &["load-balancers", lb_id, member_id]);
        Ok(self.client.delete(&url).await?)
    }

    async fn list_servers(&self) -> Result<Vec<RawServer>> {
        let url = self.client.url(Engine::Ace, &["servers"]);
        Ok(self.client.get(&url).await?)
    }

    async fn get_server(&self, id: &str) -> Result<RawServer> {
        let url = self.client.url(Engine::Ace, &["servers", id]);
        Ok(self.client.get(&url).await?)
    }

    async fn create_server(&self, req: &ServerCreateRequest) -> Result<RawServer> {
        let url = self.client.url(Engine::Ace, &["servers"]);
        Ok(self.client.post(&url, req).await?)
    }

    async fn server_action(&self, id: &str, action: ServerAction) -> Result<()> {
        let url = self.client.url(Engine::Ace, &["servers", id, action.as_str()]);
        Ok(self.client.post_empty::<()>(&url, None).await?)
    }

    async fn delete_server(&self, id: &str) -> Result<()> {
        let url = self.client.url(Engine::Ace, &["servers", id]);
        Ok(self.client.delete(&url).await?)
    }

    async fn list_server_volumes(&self, server_id: &str) -> Result<Vec<RawServerVolume>> {
        let url = self.client.url(Engine::Ace, &["servers", server_id, "volumes"]);
        Ok(self.client.get(&url).await?)
    }

    async fn attach_volume(&self, server_id: &str, volume_id: &str) -> Result<()> {
        let url = self.client.url(Engine::Ace, &["servers", server_id, "volumes"]);
        let req = VolumeAttachRequest {
            volume_id: volume_id.to_string(),
        };
        Ok(self.client.post_empty(&url, Some(&req)).await?)
    }

    async fn detach_volume(&self, server_id: &str, volume_id: &str) -> Result<()> {
        let url = self
            .client
            .url(Engine::Ace, &["servers", server_id, "volumes", volume_id]);
        Ok(self.client.delete(&url).await?)
    }

    async fn list_volumes(&self) -> Result<Vec<RawVolume>> {
        let url = self.client.url(Engine::Ace, &["volumes"]);
        Ok(self.client.get(&url).await?)
    }

    async fn create_volume(&self, req: &VolumeCreateRequest) -> Result<RawVolume> {
        let url = self.client.url(Engine::Ace, &["volumes"]);
        Ok(self.client.post(&url, req).await?)
    }

    async fn update_volume(&self, id: &str, req: &VolumeUpdateRequest) -> Result<()> {
        let url = self.client.url(Engine::Ace, &["volumes", id, "update"]);
        Ok(self.client.post_empty(&url, Some(req)).await?)
    }

    async fn delete_volume(&self, id: &str) -> Result<()> {
        let url = self.client.url(Engine::Ace, &["volumes", id]);
        Ok(self.client.delete(&url).await?)
    }

    async fn volume_owner(&self, id: &str) -> Result<Option<RawVolumeOwner>> {
        let url = self.client.url(Engine::Ace, &["volumes", id, "servers"]);
        let owners: Vec<RawVolumeOwner> = self.client.get(&url).await?;
        Ok(owners.into_iter().next())
    }

    async fn list_snapshots(&self) -> Result<Vec<RawSnapshot>> {
        let url = self.client.url(Engine::Ace, &["snapshots"]);
        Ok(self.client.get(&url).await?)
    }

    async fn create_snapshot(&self, req: &SnapshotCreateRequest) -> Result<()> {
        let url = self.client.url(Engine::Ace, &["snapshots"]);
        Ok(self.client.post_empty(&url, Some(req)).await?)
    }

    async fn delete_snapshot(&self, id: &str) -> Result<()> {
        let url = self.client.url(Engine::Ace, &["snapshots", id]);
        Ok(self.client.delete(&url).await?)
    }

    async fn create_volume_from_snapshot(
        &self,
        snapshot_id: &str,
        req: &VolumeFromSnapshotRequest,
    ) -> Result<()> {
        let url = self
            .client
            .url(Engine::Ace, &["snapshots", snapshot_id, "volume"]);
        Ok(self.client.post_empty(&url, Some(req)).await?)
    }

    async fn list_templates(&self) -> Result<Vec<RawTemplate>> {
        let url = self.client.url(Engine::Ace, &["templates"]);
        Ok(self.client.get(&url).await?)
    }

    async fn list_specs(&self) -> Result<Vec<RawSpec>> {
        let url = self.client.url(Engine::Ace, &["specs"]);
        let specs: SpecList = self.client.get(&url).await?;
        Ok(specs.list)
    }

    async fn list_clusters(&self) -> Result<Vec<RawCluster>> {
        let url = self.client.url(Engine::Ace, &["clusters"]);
        Ok(self.client.get(&url).await?)
    }

    async fn list_security_groups(&self) -> Result<Vec<RawSecurityGroup>> {
        let url = self.client.url(Engine::Iam, &["securitygroups"]);
        Ok(self.client.get(&url).await?)
    }

    async fn list_security_rules(&self, group_id: &str) -> Result<Vec<RawSecurityRule>> {
        let url = self
            .client
            .url(Engine::Iam, &["securitygroups", group_id, "rules"]);
        Ok(self.client.get(&url).await?)
    }

    async fn create_security_group(
        &self,
        req: &SecurityGroupCreateRequest,
    ) -> Result<RawSecurityGroup> {
        let url = self.client.url(Engine::Iam, &["securitygroups"]);
        Ok(self.client.post(&url, req).await?)
    }

    async fn delete_security_group(&self, group_id: &str) -> Result<()> {
        let url = self.client.url(Engine::Iam, &["securitygroups", group_id]);
        Ok(self.client.delete(&url).await?)
    }
}
