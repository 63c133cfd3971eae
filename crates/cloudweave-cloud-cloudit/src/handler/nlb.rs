//! Network load balancer handler
//!
//! Cloudit load balancers forward TCP only, and every member must sit in one
//! subnet. The VM-group port is written into the description as
//! `vmgroupport:<port>` so it can still be reported once the member list is
//! empty.

use super::vpc::DEFAULT_VPC_NAME;
use super::{ClouditContext, normalize_time};
use crate::model::{
    LOAD_BALANCER_KEY_VALUES, LbAddMemberRequest, LbPolicyUpdateRequest, LbReqMember,
    LbUpdateRequest, LoadBalancerCreateRequest, RawLbMember, RawLoadBalancer, RawServer,
    key_values,
};
use async_trait::async_trait;
use cloudweave_cloud::{
    CloudError, Compensation, HealthCheckerInfo, HealthInfo, Iid, ListenerInfo, NlbHandler,
    NlbInfo, NlbReqInfo, NlbScope, PollStatus, Result, VmGroupInfo,
};
use futures_util::FutureExt;

pub const LB_SCHEDULER: &str = "rr";
pub const LB_MAX_CONN: i32 = 99999;
/// Reserved for the load balancer status page
pub const LB_STATS_PORT: i32 = 65535;
const PORT_TAG: &str = "vmgroupport:";
const HEALTHY_STATE: &str = "OPEN";
const INTERNAL_TYPE: &str = "INTERNAL";
const EXTERNAL_TYPE: &str = "EXTERNAL";
const PUBLIC_TYPE: &str = "PUBLIC";

pub struct ClouditNlbHandler {
    ctx: ClouditContext,
}

/// Ports and monitor settings checked before anything is sent
#[derive(Debug, PartialEq)]
struct ValidatedRequest {
    listener_port: i32,
    vm_group_port: i32,
    monitor_type: String,
}

/// Range checks Cloudit applies to a health checker policy
pub fn validate_health_checker(hc: &HealthCheckerInfo) -> Result<()> {
    if !(2..=10).contains(&hc.threshold) {
        return Err(CloudError::InvalidArgument(format!(
            "health checker threshold {} must be between 2 and 10",
            hc.threshold
        )));
    }
    if !(2..=60).contains(&hc.timeout) {
        return Err(CloudError::InvalidArgument(format!(
            "health checker timeout {} must be between 2 and 60",
            hc.timeout
        )));
    }
    if !(5..=300).contains(&hc.interval) {
        return Err(CloudError::InvalidArgument(format!(
            "health checker interval {} must be between 5 and 300",
            hc.interval
        )));
    }
    if hc.interval < hc.timeout {
        return Err(CloudError::InvalidArgument(format!(
            "health checker interval {} must not be shorter than the timeout {}",
            hc.interval, hc.timeout
        )));
    }
    Ok(())
}

fn parse_port(port: &str, max: i32, what: &str) -> Result<i32> {
    match port.trim().parse::<i32>() {
        Ok(p) if (1..=max).contains(&p) => Ok(p),
        _ => Err(CloudError::InvalidArgument(format!(
            "{} port '{}' must be between 1 and {}",
            what, port, max
        ))),
    }
}

fn validate_request(req: &NlbReqInfo) -> Result<ValidatedRequest> {
    if req.iid.name_id.is_empty() {
        return Err(CloudError::InvalidArgument("NLB NameId is required".into()));
    }

    let monitor_type = match req.health_checker.protocol.to_ascii_uppercase().as_str() {
        "HTTP" | "TCP" => req.health_checker.protocol.to_ascii_lowercase(),
        other => {
            return Err(CloudError::InvalidArgument(format!(
                "health checker protocol '{}' is not supported; use HTTP or TCP",
                other
            )));
        }
    };
    validate_health_checker(&req.health_checker)?;

    if !req
        .listener
        .protocol
        .eq_ignore_ascii_case(&req.vm_group.protocol)
    {
        return Err(CloudError::InvalidArgument(format!(
            "listener protocol '{}' and VM group protocol '{}' must match",
            req.listener.protocol, req.vm_group.protocol
        )));
    }
    if !req.vm_group.protocol.eq_ignore_ascii_case("TCP") {
        return Err(CloudError::InvalidArgument(format!(
            "VM group protocol '{}' is not supported; Cloudit balances TCP only",
            req.vm_group.protocol
        )));
    }

    let vm_group_port = parse_port(&req.vm_group.port, 65535, "VM group")?;
    let listener_port = parse_port(&req.listener.port, LB_STATS_PORT - 1, "listener")?;

    Ok(ValidatedRequest {
        listener_port,
        vm_group_port,
        monitor_type,
    })
}

/// VM-group port recorded in an NLB description
pub fn port_from_description(description: &str) -> Option<String> {
    let start = description.find(PORT_TAG)? + PORT_TAG.len();
    let digits: String = description[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    (!digits.is_empty()).then_some(digits)
}

fn port_tag(port: &str) -> String {
    format!("{}{}", PORT_TAG, port)
}

fn vm_group_port(lb: &RawLoadBalancer) -> Result<String> {
    let port = match lb.members.first() {
        Some(member) => Some(member.member_port.clone()).filter(|p| !p.is_empty()),
        None => port_from_description(&lb.description),
    };
    port.ok_or_else(|| {
        CloudError::UpstreamError(format!(
            "cannot determine the VM group port of NLB '{}'",
            lb.name
        ))
    })
}

fn is_member(member: &RawLbMember, server: &RawServer) -> bool {
    member.server_name.eq_ignore_ascii_case(&server.name)
        || (!member.member_ip.is_empty() && member.member_ip == server.private_ip)
}

fn member_iid(member: &RawLbMember, servers: &[RawServer]) -> Iid {
    servers
        .iter()
        .find(|s| is_member(member, s))
        .map(|s| Iid::new(&s.name, &s.id))
        .unwrap_or_else(|| Iid::named(&member.server_name))
}

/// Subnet the current members live in
fn lb_network(lb: &RawLoadBalancer, servers: &[RawServer]) -> Option<String> {
    lb.members.iter().find_map(|m| {
        if !m.network.is_empty() {
            return Some(m.network.clone());
        }
        servers
            .iter()
            .find(|s| is_member(m, s))
            .map(|s| s.subnet_addr.clone())
    })
}

fn listener_info(lb: &RawLoadBalancer) -> ListenerInfo {
    ListenerInfo {
        protocol: lb.protocol.to_ascii_uppercase(),
        ip: lb.ip.clone(),
        port: lb.port.to_string(),
        ..Default::default()
    }
}

fn vm_group_info(lb: &RawLoadBalancer, servers: &[RawServer]) -> Result<VmGroupInfo> {
    Ok(VmGroupInfo {
        protocol: lb.protocol.to_ascii_uppercase(),
        port: vm_group_port(lb)?,
        vms: lb.members.iter().map(|m| member_iid(m, servers)).collect(),
        ..Default::default()
    })
}

fn health_checker_info(lb: &RawLoadBalancer) -> Result<HealthCheckerInfo> {
    Ok(HealthCheckerInfo {
        protocol: lb.monitor_type.to_ascii_uppercase(),
        port: vm_group_port(lb)?,
        interval: lb.interval_time,
        timeout: lb.response_time,
        threshold: lb.unhealthy_threshold,
        ..Default::default()
    })
}

fn nlb_info(lb: &RawLoadBalancer, servers: &[RawServer]) -> Result<NlbInfo> {
    let nlb_type = if lb.lb_type.eq_ignore_ascii_case(INTERNAL_TYPE) {
        INTERNAL_TYPE
    } else {
        PUBLIC_TYPE
    };
    Ok(NlbInfo {
        iid: Iid::new(&lb.name, &lb.id),
        vpc_iid: Iid::new(DEFAULT_VPC_NAME, DEFAULT_VPC_NAME),
        nlb_type: nlb_type.to_string(),
        scope: NlbScope::Region,
        listener: listener_info(lb),
        vm_group: vm_group_info(lb, servers)?,
        health_checker: health_checker_info(lb)?,
        created_time: normalize_time(&lb.created_at),
        key_value_list: key_values(lb, LOAD_BALANCER_KEY_VALUES),
    })
}

impl ClouditNlbHandler {
    pub fn new(ctx: ClouditContext) -> Self {
        Self { ctx }
    }

    async fn with_members(&self, mut lb: RawLoadBalancer) -> Result<RawLoadBalancer> {
        lb.members = self.ctx.api.list_lb_members(&lb.id).await?;
        Ok(lb)
    }

    async fn find_lb(&self, iid: &Iid) -> Result<RawLoadBalancer> {
        iid.require_valid("NLB")?;
        let lb = self
            .ctx
            .api
            .list_load_balancers()
            .await?
            .into_iter()
            .find(|lb| iid.matches(&lb.name, &lb.id))
            .ok_or_else(|| CloudError::NotFound(format!("NLB '{}'", iid)))?;
        self.with_members(lb).await
    }

    async fn lb_by_id(&self, id: &str) -> Result<Option<RawLoadBalancer>> {
        Ok(self
            .ctx
            .api
            .list_load_balancers()
            .await?
            .into_iter()
            .find(|lb| lb.id == id))
    }

    /// Resolve every requested VM and enforce a single subnet
    async fn resolve_members(&self, vm_iids: &[Iid]) -> Result<(Vec<RawServer>, String)> {
        let servers = self.ctx.api.list_servers().await?;
        let mut members = Vec::with_capacity(vm_iids.len());
        for iid in vm_iids {
            let server = servers
                .iter()
                .find(|s| iid.matches(&s.name, &s.id))
                .ok_or_else(|| CloudError::NotFound(format!("VM '{}'", iid)))?;
            members.push(server.clone());
        }

        let network = members
            .first()
            .map(|s| s.subnet_addr.clone())
            .unwrap_or_default();
        if let Some(other) = members.iter().find(|s| s.subnet_addr != network) {
            return Err(CloudError::InvalidArgument(format!(
                "all NLB members must be in one subnet: VM '{}' is in {} but the group uses {}",
                other.name, other.subnet_addr, network
            )));
        }
        Ok((members, network))
    }

    async fn poll_completed(&self, id: &str) -> Result<PollStatus<RawLoadBalancer>> {
        Ok(match self.lb_by_id(id).await? {
            Some(lb) if lb.state.eq_ignore_ascii_case("COMPLETED") => {
                PollStatus::Reached(self.with_members(lb).await?)
            }
            Some(lb) if lb.state.eq_ignore_ascii_case("FAILED") => PollStatus::Failed(lb.state),
            Some(lb) => PollStatus::Pending(lb.state),
            None => PollStatus::Pending("not listed".into()),
        })
    }

    async fn poll_description(&self, id: &str, expected: &str) -> Result<PollStatus<()>> {
        Ok(match self.lb_by_id(id).await? {
            Some(lb) if lb.description == expected => PollStatus::Reached(()),
            Some(lb) => PollStatus::Pending(format!("description '{}'", lb.description)),
            None => PollStatus::Pending("not listed".into()),
        })
    }

    async fn poll_member_count(&self, id: &str, expected: usize) -> Result<PollStatus<()>> {
        let count = self.ctx.api.list_lb_members(id).await?.len();
        Ok(if count == expected {
            PollStatus::Reached(())
        } else {
            PollStatus::Pending(format!("{} members, want {}", count, expected))
        })
    }

    async fn poll_policy(&self, id: &str, policy: &LbPolicyUpdateRequest) -> Result<PollStatus<()>> {
        Ok(match self.lb_by_id(id).await? {
            Some(lb)
                if lb.response_time == policy.response_time
                    && lb.interval_time == policy.interval_time
                    && lb.unhealthy_threshold == policy.unhealthy_threshold
                    && lb.healthy_threshold == policy.healthy_threshold =>
            {
                PollStatus::Reached(())
            }
            Some(_) => PollStatus::Pending("policy not applied yet".into()),
            None => PollStatus::Pending("not listed".into()),
        })
    }

    /// Record the VM-group port in the description and wait until it shows
    async fn tag_port(&self, lb: &RawLoadBalancer, port: &str) -> Result<()> {
        let operation = format!("tag NLB '{}'", lb.name);
        let description = port_tag(port);
        self.ctx
            .api
            .update_load_balancer(
                &lb.id,
                &LbUpdateRequest {
                    name: None,
                    description: description.clone(),
                },
            )
            .await
            .map_err(|e| e.context(&operation))?;
        self.ctx
            .infra()
            .wait_for(&operation, || self.poll_description(&lb.id, &description))
            .await
    }

    async fn add_members(
        &self,
        lb: &RawLoadBalancer,
        current: usize,
        servers: &[RawServer],
        port: &str,
    ) -> Result<()> {
        let operation = format!("add members to NLB '{}'", lb.name);
        for server in servers {
            tracing::info!("Adding VM {} to NLB {}", server.name, lb.name);
            self.ctx
                .api
                .add_lb_member(
                    &lb.id,
                    &LbAddMemberRequest {
                        network: server.subnet_addr.clone(),
                        member_ip: server.private_ip.clone(),
                        member_port: port.to_string(),
                        host_name: server.host_name.clone(),
                    },
                )
                .await
                .map_err(|e| e.context(&operation))?;
        }
        let expected = current + servers.len();
        self.ctx
            .infra()
            .wait_for(&operation, || self.poll_member_count(&lb.id, expected))
            .await
    }

    async fn delete_members(&self, lb: &RawLoadBalancer, member_ids: &[String]) -> Result<()> {
        let operation = format!("remove members from NLB '{}'", lb.name);
        let expected = lb.members.len().checked_sub(member_ids.len()).ok_or_else(|| {
            CloudError::InvalidState(format!(
                "NLB '{}' has only {} members",
                lb.name,
                lb.members.len()
            ))
        })?;
        for id in member_ids {
            self.ctx
                .api
                .delete_lb_member(&lb.id, id)
                .await
                .map_err(|e| e.context(&operation))?;
        }
        self.ctx
            .infra()
            .wait_for(&operation, || self.poll_member_count(&lb.id, expected))
            .await
    }
}

#[async_trait]
impl NlbHandler for ClouditNlbHandler {
    async fn create_nlb(&self, req: NlbReqInfo) -> Result<NlbInfo> {
        let checked = validate_request(&req)?;
        let name = req.iid.name_id.clone();
        let operation = format!("create NLB '{}'", name);

        if self
            .ctx
            .api
            .list_load_balancers()
            .await?
            .iter()
            .any(|lb| lb.name.eq_ignore_ascii_case(&name))
        {
            return Err(CloudError::AlreadyExists(format!("NLB '{}'", name)));
        }

        let (servers, network) = self.resolve_members(&req.vm_group.vms).await?;
        let public_ip = self
            .ctx
            .first_available_ip()
            .await
            .map_err(|e| e.context(&operation))?;

        let vm_group_port = checked.vm_group_port.to_string();
        let http_url = if checked.monitor_type == "http" {
            "/".to_string()
        } else {
            String::new()
        };
        let lb_type = if req.nlb_type.eq_ignore_ascii_case(INTERNAL_TYPE) {
            INTERNAL_TYPE
        } else {
            EXTERNAL_TYPE
        };
        let request = LoadBalancerCreateRequest {
            name: name.clone(),
            ip: public_ip.ip,
            scheduler: LB_SCHEDULER.to_string(),
            port: checked.listener_port,
            protocol: req.vm_group.protocol.to_ascii_lowercase(),
            network,
            members: servers
                .iter()
                .map(|s| LbReqMember {
                    member_ip: s.private_ip.clone(),
                    member_port: vm_group_port.clone(),
                })
                .collect(),
            monitor_type: checked.monitor_type,
            max_conn: LB_MAX_CONN,
            stats_port: LB_STATS_PORT,
            lb_type: lb_type.to_string(),
            response_time: req.health_checker.timeout,
            interval_time: req.health_checker.interval,
            unhealthy_threshold: req.health_checker.threshold,
            healthy_threshold: req.health_checker.threshold,
            http_url,
            description: String::new(),
        };

        tracing::info!("Creating NLB {} on {}:{}", name, request.ip, request.port);
        let created = self
            .ctx
            .api
            .create_load_balancer(&request)
            .await
            .map_err(|e| e.context(&operation))?;

        let mut rollback = Compensation::new(operation.clone());
        let api = self.ctx.api.clone();
        let lb_id = created.id.clone();
        rollback.push(format!("load balancer {}", name), move || {
            async move { api.delete_load_balancer(&lb_id).await }.boxed()
        });

        let ready = async {
            let lb = self
                .ctx
                .infra()
                .wait_for(&operation, || self.poll_completed(&created.id))
                .await?;
            self.tag_port(&lb, &vm_group_port).await?;
            let lb = self.find_lb(&Iid::new(&lb.name, &lb.id)).await?;
            let servers = self.ctx.api.list_servers().await?;
            nlb_info(&lb, &servers)
        }
        .await;

        match ready {
            Ok(info) => {
                rollback.commit();
                Ok(info)
            }
            Err(e) => Err(rollback.fail_with(e).await),
        }
    }

    async fn list_nlb(&self) -> Result<Vec<NlbInfo>> {
        let servers = self.ctx.api.list_servers().await?;
        let mut infos = Vec::new();
        for lb in self.ctx.api.list_load_balancers().await? {
            let lb = self.with_members(lb).await?;
            infos.push(nlb_info(&lb, &servers)?);
        }
        Ok(infos)
    }

    async fn get_nlb(&self, nlb_iid: &Iid) -> Result<NlbInfo> {
        let lb = self.find_lb(nlb_iid).await?;
        let servers = self.ctx.api.list_servers().await?;
        nlb_info(&lb, &servers)
    }

    async fn delete_nlb(&self, nlb_iid: &Iid) -> Result<bool> {
        let lb = self.find_lb(nlb_iid).await?;
        tracing::info!("Deleting NLB {}", lb.name);
        self.ctx
            .api
            .delete_load_balancer(&lb.id)
            .await
            .map_err(|e| e.context(format!("delete NLB '{}'", lb.name)))?;
        Ok(true)
    }

    async fn change_listener(&self, nlb_iid: &Iid, _listener: ListenerInfo) -> Result<ListenerInfo> {
        Err(CloudError::NotSupported(format!(
            "Cloudit cannot change the listener of NLB '{}'",
            nlb_iid
        )))
    }

    async fn change_vm_group_info(
        &self,
        nlb_iid: &Iid,
        vm_group: VmGroupInfo,
    ) -> Result<VmGroupInfo> {
        let lb = self.find_lb(nlb_iid).await?;
        let servers = self.ctx.api.list_servers().await?;
        let current = vm_group_info(&lb, &servers)?;

        if !vm_group.protocol.is_empty() && !vm_group.protocol.eq_ignore_ascii_case(&current.protocol)
        {
            return Err(CloudError::InvalidArgument(format!(
                "Cloudit cannot change the VM group protocol of NLB '{}'",
                lb.name
            )));
        }
        let port = parse_port(&vm_group.port, 65535, "VM group")?.to_string();
        if port == current.port {
            return Ok(current);
        }

        let mut members = Vec::with_capacity(lb.members.len());
        for member in &lb.members {
            let server = servers
                .iter()
                .find(|s| is_member(member, s))
                .ok_or_else(|| {
                    CloudError::NotFound(format!("VM behind NLB member {}", member.member_ip))
                })?;
            members.push(server.clone());
        }

        tracing::info!(
            "Moving NLB {} members from port {} to {}",
            lb.name,
            current.port,
            port
        );
        let member_ids: Vec<String> = lb.members.iter().map(|m| m.id.clone()).collect();
        self.delete_members(&lb, &member_ids).await?;
        self.add_members(&lb, 0, &members, &port).await?;
        self.tag_port(&lb, &port).await?;

        let lb = self.find_lb(nlb_iid).await?;
        vm_group_info(&lb, &servers)
    }

    async fn add_vms(&self, nlb_iid: &Iid, vm_iids: &[Iid]) -> Result<VmGroupInfo> {
        if vm_iids.is_empty() {
            return Err(CloudError::InvalidArgument("no VMs to add".into()));
        }
        let lb = self.find_lb(nlb_iid).await?;
        let port = vm_group_port(&lb)?;
        let (adding, network) = self.resolve_members(vm_iids).await?;
        let servers = self.ctx.api.list_servers().await?;

        if let Some(existing) = adding
            .iter()
            .find(|s| lb.members.iter().any(|m| is_member(m, s)))
        {
            return Err(CloudError::AlreadyExists(format!(
                "VM '{}' is already a member of NLB '{}'",
                existing.name, lb.name
            )));
        }
        if let Some(lb_net) = lb_network(&lb, &servers) {
            if lb_net != network {
                return Err(CloudError::InvalidArgument(format!(
                    "NLB '{}' serves subnet {}; VMs in {} cannot join",
                    lb.name, lb_net, network
                )));
            }
        }

        self.add_members(&lb, lb.members.len(), &adding, &port)
            .await?;
        let lb = self.find_lb(nlb_iid).await?;
        vm_group_info(&lb, &servers)
    }

    async fn remove_vms(&self, nlb_iid: &Iid, vm_iids: &[Iid]) -> Result<bool> {
        let lb = self.find_lb(nlb_iid).await?;
        let servers = self.ctx.api.list_servers().await?;

        let mut member_ids = Vec::with_capacity(vm_iids.len());
        for iid in vm_iids {
            let member = servers
                .iter()
                .find(|s| iid.matches(&s.name, &s.id))
                .and_then(|s| lb.members.iter().find(|m| is_member(m, s)))
                .or_else(|| {
                    lb.members
                        .iter()
                        .find(|m| m.server_name.eq_ignore_ascii_case(&iid.name_id))
                })
                .ok_or_else(|| {
                    CloudError::NotFound(format!(
                        "VM '{}' is not a member of NLB '{}'",
                        iid, lb.name
                    ))
                })?;
            if !member_ids.contains(&member.id) {
                member_ids.push(member.id.clone());
            }
        }
        if member_ids.len() >= lb.members.len() {
            return Err(CloudError::InvalidState(format!(
                "NLB '{}' must keep at least one member",
                lb.name
            )));
        }

        self.delete_members(&lb, &member_ids).await?;
        Ok(true)
    }

    async fn get_vm_group_health_info(&self, nlb_iid: &Iid) -> Result<HealthInfo> {
        let lb = self.find_lb(nlb_iid).await?;
        let servers = self.ctx.api.list_servers().await?;

        let mut health = HealthInfo::default();
        for member in &lb.members {
            let iid = member_iid(member, &servers);
            health.all_vms.push(iid.clone());
            if member.health_state.eq_ignore_ascii_case(HEALTHY_STATE) {
                health.healthy_vms.push(iid);
            } else {
                health.unhealthy_vms.push(iid);
            }
        }
        Ok(health)
    }

    async fn change_health_checker_info(
        &self,
        nlb_iid: &Iid,
        health_checker: HealthCheckerInfo,
    ) -> Result<HealthCheckerInfo> {
        let lb = self.find_lb(nlb_iid).await?;
        let current = health_checker_info(&lb)?;

        if !health_checker.protocol.is_empty()
            && !health_checker.protocol.eq_ignore_ascii_case(&current.protocol)
        {
            return Err(CloudError::InvalidArgument(format!(
                "Cloudit cannot change the health checker protocol of NLB '{}'",
                lb.name
            )));
        }
        if !health_checker.port.is_empty() && health_checker.port != current.port {
            return Err(CloudError::InvalidArgument(format!(
                "Cloudit cannot change the health checker port of NLB '{}'",
                lb.name
            )));
        }
        validate_health_checker(&health_checker)?;

        if health_checker.interval == current.interval
            && health_checker.timeout == current.timeout
            && health_checker.threshold == current.threshold
        {
            return Ok(current);
        }

        let operation = format!("update health checker of NLB '{}'", lb.name);
        let scheduler = if lb.scheduler.is_empty() {
            LB_SCHEDULER.to_string()
        } else {
            lb.scheduler.clone()
        };
        let policy = LbPolicyUpdateRequest {
            scheduler,
            response_time: health_checker.timeout,
            interval_time: health_checker.interval,
            unhealthy_threshold: health_checker.threshold,
            healthy_threshold: health_checker.threshold,
        };
        self.ctx
            .api
            .update_lb_policy(&lb.id, &policy)
            .await
            .map_err(|e| e.context(&operation))?;
        self.ctx
            .infra()
            .wait_for(&operation, || self.poll_policy(&lb.id, &policy))
            .await?;

        let lb = self.find_lb(nlb_iid).await?;
        health_checker_info(&lb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health(interval: i32, timeout: i32, threshold: i32) -> HealthCheckerInfo {
        HealthCheckerInfo {
            protocol: "TCP".into(),
            interval,
            timeout,
            threshold,
            ..Default::default()
        }
    }

    fn request() -> NlbReqInfo {
        NlbReqInfo {
            iid: Iid::named("web-lb"),
            listener: ListenerInfo {
                protocol: "TCP".into(),
                port: "80".into(),
                ..Default::default()
            },
            vm_group: VmGroupInfo {
                protocol: "TCP".into(),
                port: "8080".into(),
                ..Default::default()
            },
            health_checker: health(10, 5, 3),
            ..Default::default()
        }
    }

    #[test]
    fn test_health_checker_ranges() {
        assert!(validate_health_checker(&health(10, 5, 3)).is_ok());
        assert!(validate_health_checker(&health(10, 5, 1)).is_err());
        assert!(validate_health_checker(&health(10, 5, 11)).is_err());
        assert!(validate_health_checker(&health(10, 1, 3)).is_err());
        assert!(validate_health_checker(&health(4, 2, 3)).is_err());
        assert!(validate_health_checker(&health(301, 5, 3)).is_err());
        // interval shorter than timeout
        assert!(validate_health_checker(&health(10, 20, 3)).is_err());
    }

    #[test]
    fn test_validate_request() {
        let checked = validate_request(&request()).unwrap();
        assert_eq!(
            checked,
            ValidatedRequest {
                listener_port: 80,
                vm_group_port: 8080,
                monitor_type: "tcp".into(),
            }
        );
    }

    #[test]
    fn test_validate_request_rejects_mismatch() {
        let mut req = request();
        req.listener.protocol = "UDP".into();
        let err = validate_request(&req).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("must match"));

        let mut req = request();
        req.listener.port = "65535".into();
        assert!(validate_request(&req).unwrap_err().is_validation());

        let mut req = request();
        req.vm_group.port = "0".into();
        assert!(validate_request(&req).unwrap_err().is_validation());

        let mut req = request();
        req.health_checker.protocol = "UDP".into();
        assert!(validate_request(&req).unwrap_err().is_validation());
    }

    #[test]
    fn test_port_from_description() {
        assert_eq!(port_from_description("vmgroupport:8080"), Some("8080".into()));
        assert_eq!(
            port_from_description("web tier vmgroupport:443 prod"),
            Some("443".into())
        );
        assert_eq!(port_from_description("vmgroupport:"), None);
        assert_eq!(port_from_description(""), None);
    }

    #[test]
    fn test_vm_group_port_prefers_members() {
        let lb = RawLoadBalancer {
            name: "lb".into(),
            description: port_tag("9000"),
            members: vec![RawLbMember {
                member_port: "8080".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(vm_group_port(&lb).unwrap(), "8080");

        let empty = RawLoadBalancer {
            members: Vec::new(),
            ..lb
        };
        assert_eq!(vm_group_port(&empty).unwrap(), "9000");
    }
}
