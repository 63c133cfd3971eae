//! Security group handler
//!
//! Cloudit does not report which servers use a group, so the association is
//! kept in the metadata store under `SECURITYGROUP/<group name>` as a
//! comma-joined list of VM names.

use super::ClouditContext;
use super::vpc::DEFAULT_VPC_NAME;
use crate::model::{
    RawSecurityGroup, SECURITY_GROUP_KEY_VALUES, SecurityGroupCreateRequest, SecurityRuleRequest,
    key_values,
};
use async_trait::async_trait;
use cloudweave_cloud::{
    CloudError, CredentialStore, Iid, Namespace, Result, SecurityHandler, SecurityInfo,
    SecurityReqInfo, SecurityRuleInfo,
};

pub const DEFAULT_RULE_CIDR: &str = "0.0.0.0/0";

pub struct ClouditSecurityHandler {
    ctx: ClouditContext,
}

impl ClouditSecurityHandler {
    pub fn new(ctx: ClouditContext) -> Self {
        Self { ctx }
    }

    pub(crate) async fn find_group(&self, iid: &Iid) -> Result<RawSecurityGroup> {
        find_group(&self.ctx, iid).await
    }

    async fn security_info(&self, mut group: RawSecurityGroup) -> Result<SecurityInfo> {
        group.rules = self
            .ctx
            .api
            .list_security_rules(&group.id)
            .await
            .map_err(|e| e.context(format!("list rules of security group '{}'", group.name)))?;
        let vms = associated_vms(&self.ctx.store, &group.name).await?;
        Ok(to_security_info(&group, &vms))
    }
}

pub(crate) async fn find_group(ctx: &ClouditContext, iid: &Iid) -> Result<RawSecurityGroup> {
    iid.require_valid("SecurityGroup")?;
    ctx.api
        .list_security_groups()
        .await?
        .into_iter()
        .find(|g| iid.matches(&g.name, &g.id))
        .ok_or_else(|| CloudError::NotFound(format!("security group '{}'", iid)))
}

fn split_port(port: &str) -> (String, String) {
    match port.split_once('-') {
        Some((from, to)) => (from.to_string(), to.to_string()),
        None => (port.to_string(), port.to_string()),
    }
}

fn to_security_info(group: &RawSecurityGroup, vms: &[String]) -> SecurityInfo {
    let security_rules = group
        .rules
        .iter()
        .map(|r| {
            let (from_port, to_port) = split_port(&r.port);
            SecurityRuleInfo {
                direction: r.rule_type.clone(),
                ip_protocol: r.protocol.clone(),
                from_port,
                to_port,
                cidr: r.target.clone(),
            }
        })
        .collect();

    SecurityInfo {
        iid: Iid::new(&group.name, &group.id),
        vpc_iid: Iid::new(DEFAULT_VPC_NAME, DEFAULT_VPC_NAME),
        security_rules,
        vm_iids: vms.iter().map(Iid::named).collect(),
        key_value_list: key_values(group, SECURITY_GROUP_KEY_VALUES),
    }
}

fn split_vms(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_vms(vms: Vec<String>) -> Option<String> {
    if vms.is_empty() {
        None
    } else {
        Some(vms.join(","))
    }
}

/// VM names recorded against a security group
pub(crate) async fn associated_vms(store: &CredentialStore, group: &str) -> Result<Vec<String>> {
    match store.get(Namespace::SecurityGroup, group).await {
        Ok(value) => Ok(split_vms(&value)),
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

pub(crate) async fn associate_vm(store: &CredentialStore, group: &str, vm: &str) -> Result<()> {
    let vm = vm.to_string();
    store
        .update(Namespace::SecurityGroup, group, move |current| {
            let mut vms = current.as_deref().map(split_vms).unwrap_or_default();
            if !vms.contains(&vm) {
                vms.push(vm);
            }
            join_vms(vms)
        })
        .await?;
    Ok(())
}

/// The record is removed once its last VM is gone
pub(crate) async fn disassociate_vm(store: &CredentialStore, group: &str, vm: &str) -> Result<()> {
    let vm = vm.to_string();
    store
        .update(Namespace::SecurityGroup, group, move |current| {
            let vms = current.as_deref().map(split_vms).unwrap_or_default();
            join_vms(vms.into_iter().filter(|v| *v != vm).collect())
        })
        .await?;
    Ok(())
}

/// Drop a VM from every group it is recorded against
pub(crate) async fn forget_vm(store: &CredentialStore, vm: &str) -> Result<()> {
    for record in store.list(Namespace::SecurityGroup).await? {
        if split_vms(&record.value).iter().any(|v| v == vm) {
            disassociate_vm(store, &record.name_id, vm).await?;
        }
    }
    Ok(())
}

#[async_trait]
impl SecurityHandler for ClouditSecurityHandler {
    async fn create_security(&self, req: SecurityReqInfo) -> Result<SecurityInfo> {
        let name = req.iid.name_id.clone();
        if name.is_empty() {
            return Err(CloudError::InvalidArgument(
                "security group NameId is required".into(),
            ));
        }
        let groups = self.ctx.api.list_security_groups().await?;
        if groups.iter().any(|g| g.name.eq_ignore_ascii_case(&name)) {
            return Err(CloudError::AlreadyExists(format!("security group '{}'", name)));
        }

        let rules = req
            .security_rules
            .iter()
            .enumerate()
            .map(|(i, rule)| SecurityRuleRequest {
                name: format!("{}-rules-{}", name, i + 1),
                rule_type: rule.direction.clone(),
                port: format!("{}-{}", rule.from_port, rule.to_port),
                target: DEFAULT_RULE_CIDR.to_string(),
                protocol: rule.ip_protocol.to_lowercase(),
            })
            .collect();

        tracing::info!("Creating security group {}", name);
        let created = self
            .ctx
            .api
            .create_security_group(&SecurityGroupCreateRequest {
                name: name.clone(),
                rules,
                protection: 0,
            })
            .await
            .map_err(|e| e.context(format!("create security group '{}'", name)))?;

        self.security_info(created).await
    }

    async fn list_security(&self) -> Result<Vec<SecurityInfo>> {
        let groups = self.ctx.api.list_security_groups().await?;
        let mut infos = Vec::with_capacity(groups.len());
        for group in groups {
            infos.push(self.security_info(group).await?);
        }
        Ok(infos)
    }

    async fn get_security(&self, iid: &Iid) -> Result<SecurityInfo> {
        let group = self.find_group(iid).await?;
        self.security_info(group).await
    }

    async fn delete_security(&self, iid: &Iid) -> Result<bool> {
        let group = self.find_group(iid).await?;
        let vms = associated_vms(&self.ctx.store, &group.name).await?;
        if !vms.is_empty() {
            return Err(CloudError::InvalidState(format!(
                "security group '{}' is still used by VMs: {}",
                group.name,
                vms.join(", ")
            )));
        }

        tracing::info!("Deleting security group {}", group.name);
        self.ctx
            .api
            .delete_security_group(&group.id)
            .await
            .map_err(|e| e.context(format!("delete security group '{}'", group.name)))?;

        match self
            .ctx
            .store
            .delete(Namespace::SecurityGroup, &group.name)
            .await
        {
            Err(e) if !e.is_not_found() => return Err(e),
            _ => {}
        }
        Ok(true)
    }
}
