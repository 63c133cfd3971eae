//! VPC and subnet handler
//!
//! Cloudit has a single implicit network per tenant, exposed as
//! `Default-VPC` (`10.0.0.0/16`). Subnets are `/22` blocks inside it, picked
//! by the CIDR allocator from the live subnet list.

use super::ClouditContext;
use crate::model::{RawSubnet, SUBNET_KEY_VALUES, SubnetCreateRequest, key_values};
use async_trait::async_trait;
use futures_util::FutureExt;
use cloudweave_cloud::{
    CloudError, Compensation, Iid, Ipv4Block, Namespace, PollStatus, Result, SubnetInfo,
    VpcHandler, VpcInfo, VpcReqInfo, allocatable_blocks, validate_block,
};

pub const DEFAULT_VPC_NAME: &str = "Default-VPC";
pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";
pub const DEFAULT_SUBNET_NAME: &str = "Default Network";
pub const SUBNET_PREFIX_LEN: u8 = 22;

pub struct ClouditVpcHandler {
    ctx: ClouditContext,
}

impl ClouditVpcHandler {
    pub fn new(ctx: ClouditContext) -> Self {
        Self { ctx }
    }

    fn parent_block() -> Result<Ipv4Block> {
        DEFAULT_VPC_CIDR.parse()
    }

    fn check_vpc(vpc_iid: &Iid) -> Result<()> {
        vpc_iid.require_valid("VPC")?;
        if vpc_iid.matches(DEFAULT_VPC_NAME, DEFAULT_VPC_NAME) {
            Ok(())
        } else {
            Err(CloudError::NotFound(format!(
                "VPC '{}' (Cloudit only provides {})",
                vpc_iid, DEFAULT_VPC_NAME
            )))
        }
    }

    fn existing_blocks(subnets: &[RawSubnet]) -> Vec<Ipv4Block> {
        subnets
            .iter()
            .filter_map(|s| match s.cidr().parse::<Ipv4Block>() {
                Ok(block) => Some(block),
                Err(e) => {
                    tracing::debug!("Skipping subnet {} with unparsable CIDR: {}", s.name, e);
                    None
                }
            })
            .collect()
    }

    fn subnet_info(raw: &RawSubnet) -> SubnetInfo {
        SubnetInfo {
            iid: Iid::new(&raw.name, &raw.id),
            ipv4_cidr: raw.cidr(),
            zone: String::new(),
            key_value_list: key_values(raw, SUBNET_KEY_VALUES),
        }
    }

    fn vpc_info(subnets: &[RawSubnet]) -> VpcInfo {
        VpcInfo {
            iid: Iid::new(DEFAULT_VPC_NAME, DEFAULT_VPC_NAME),
            ipv4_cidr: DEFAULT_VPC_CIDR.to_string(),
            subnet_info_list: subnets.iter().map(Self::subnet_info).collect(),
            key_value_list: vec![],
        }
    }

    pub(crate) async fn find_subnet(&self, subnet_iid: &Iid) -> Result<RawSubnet> {
        subnet_iid.require_valid("Subnet")?;
        self.ctx
            .api
            .list_subnets()
            .await?
            .into_iter()
            .find(|s| subnet_iid.matches(&s.name, &s.id))
            .ok_or_else(|| CloudError::NotFound(format!("subnet '{}'", subnet_iid)))
    }

    async fn creatable_blocks(&self, subnets: &[RawSubnet]) -> Result<Vec<Ipv4Block>> {
        allocatable_blocks(
            &Self::parent_block()?,
            SUBNET_PREFIX_LEN,
            &Self::existing_blocks(subnets),
        )
    }

    /// Persist `Default-VPC/<subnet names>` for this tenant
    async fn register_subnets(&self) -> Result<()> {
        let names: Vec<String> = self
            .ctx
            .api
            .list_subnets()
            .await?
            .into_iter()
            .filter(|s| !s.name.eq_ignore_ascii_case(DEFAULT_SUBNET_NAME))
            .map(|s| s.name)
            .collect();
        let record = format!("{}/{}", DEFAULT_VPC_NAME, names.join(","));
        self.ctx
            .store
            .put(Namespace::Vpc, DEFAULT_VPC_NAME, &record)
            .await
    }

    async fn create_subnet(&self, req: &SubnetInfo) -> Result<RawSubnet> {
        let name = req.iid.name_id.clone();
        if name.is_empty() {
            return Err(CloudError::InvalidArgument("subnet NameId is required".into()));
        }

        let subnets = self.ctx.api.list_subnets().await?;
        if subnets.iter().any(|s| s.name.eq_ignore_ascii_case(&name)) {
            return Err(CloudError::AlreadyExists(format!("subnet '{}'", name)));
        }

        let block = if req.ipv4_cidr.is_empty() {
            self.creatable_blocks(&subnets)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    CloudError::InvalidState(format!(
                        "address space {} has no free /{} block",
                        DEFAULT_VPC_CIDR, SUBNET_PREFIX_LEN
                    ))
                })?
        } else {
            let candidate: Ipv4Block = req.ipv4_cidr.parse()?;
            validate_block(
                &candidate,
                &Self::parent_block()?,
                SUBNET_PREFIX_LEN,
                &Self::existing_blocks(&subnets),
            )?;
            candidate
        };

        let operation = format!("create subnet '{}'", name);
        tracing::info!("Creating subnet {} with {}", name, block);
        let created = self
            .ctx
            .api
            .create_subnet(&SubnetCreateRequest {
                name: name.clone(),
                addr: block.base.to_string(),
                prefix: block.prefix_len.to_string(),
            })
            .await
            .map_err(|e| e.context(&operation))?;

        let mut rollback = Compensation::new(operation.clone());
        let api = self.ctx.api.clone();
        let addr = block.base.to_string();
        rollback.push(format!("subnet {}", block), move || {
            async move { api.delete_subnet(&addr).await }.boxed()
        });

        let waited = self
            .ctx
            .infra()
            .wait_for(&operation, || self.poll_subnet_available(&name))
            .await;

        match waited {
            Ok(subnet) => {
                rollback.commit();
                tracing::debug!("Subnet {} available (id={})", subnet.name, created.id);
                Ok(subnet)
            }
            Err(e) => Err(rollback.fail_with(e).await),
        }
    }

    async fn delete_subnet(&self, subnet: &RawSubnet) -> Result<()> {
        let operation = format!("delete subnet '{}'", subnet.name);
        tracing::info!("Deleting subnet {} ({})", subnet.name, subnet.cidr());
        self.ctx
            .api
            .delete_subnet(&subnet.addr)
            .await
            .map_err(|e| e.context(&operation))?;

        self.ctx
            .infra()
            .wait_for(&operation, || self.poll_subnet_gone(&subnet.id))
            .await
    }

    async fn poll_subnet_available(&self, name: &str) -> Result<PollStatus<RawSubnet>> {
        let found = self
            .ctx
            .api
            .list_subnets()
            .await?
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(name));
        Ok(match found {
            Some(s) if s.is_available() => PollStatus::Reached(s),
            Some(s) => PollStatus::Pending(s.state),
            None => PollStatus::Pending("not listed".into()),
        })
    }

    async fn poll_subnet_gone(&self, id: &str) -> Result<PollStatus<()>> {
        let listed = self.ctx.api.list_subnets().await?.iter().any(|s| s.id == id);
        Ok(if listed {
            PollStatus::Pending("still listed".into())
        } else {
            PollStatus::Reached(())
        })
    }
}

#[async_trait]
impl VpcHandler for ClouditVpcHandler {
    async fn create_vpc(&self, req: VpcReqInfo) -> Result<VpcInfo> {
        if !req.iid.name_id.is_empty() && !req.iid.name_id.eq_ignore_ascii_case(DEFAULT_VPC_NAME)
        {
            tracing::warn!(
                "Cloudit has a single VPC; '{}' maps onto {}",
                req.iid.name_id,
                DEFAULT_VPC_NAME
            );
        }

        let mut rollback = Compensation::new("create VPC");
        for subnet in &req.subnet_info_list {
            match self.create_subnet(subnet).await {
                Ok(created) => {
                    let api = self.ctx.api.clone();
                    let addr = created.addr.clone();
                    rollback.push(format!("subnet {}", created.name), move || {
                        async move { api.delete_subnet(&addr).await }.boxed()
                    });
                }
                Err(e) => return Err(rollback.fail_with(e).await),
            }
        }
        if let Err(e) = self.register_subnets().await {
            return Err(rollback.fail_with(e).await);
        }
        rollback.commit();

        let subnets = self.ctx.api.list_subnets().await?;
        Ok(Self::vpc_info(&subnets))
    }

    async fn list_vpc(&self) -> Result<Vec<VpcInfo>> {
        let subnets = self.ctx.api.list_subnets().await?;
        Ok(vec![Self::vpc_info(&subnets)])
    }

    async fn get_vpc(&self, vpc_iid: &Iid) -> Result<VpcInfo> {
        Self::check_vpc(vpc_iid)?;
        let subnets = self.ctx.api.list_subnets().await?;
        Ok(Self::vpc_info(&subnets))
    }

    async fn delete_vpc(&self, vpc_iid: &Iid) -> Result<bool> {
        Self::check_vpc(vpc_iid)?;
        for subnet in self.ctx.api.list_subnets().await? {
            if subnet.name.eq_ignore_ascii_case(DEFAULT_SUBNET_NAME) {
                continue;
            }
            self.delete_subnet(&subnet).await?;
        }

        match self.ctx.store.delete(Namespace::Vpc, DEFAULT_VPC_NAME).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        Ok(true)
    }

    async fn add_subnet(&self, vpc_iid: &Iid, subnet: SubnetInfo) -> Result<VpcInfo> {
        Self::check_vpc(vpc_iid)?;
        self.create_subnet(&subnet).await?;
        self.register_subnets().await?;
        self.get_vpc(vpc_iid).await
    }

    async fn remove_subnet(&self, vpc_iid: &Iid, subnet_iid: &Iid) -> Result<bool> {
        Self::check_vpc(vpc_iid)?;
        let subnet = self.find_subnet(subnet_iid).await?;
        if subnet.name.eq_ignore_ascii_case(DEFAULT_SUBNET_NAME) {
            return Err(CloudError::InvalidState(format!(
                "'{}' is the tenant's default subnet and cannot be removed",
                DEFAULT_SUBNET_NAME
            )));
        }
        self.delete_subnet(&subnet).await?;
        self.register_subnets().await?;
        Ok(true)
    }

    async fn list_creatable_subnets(&self, vpc_iid: &Iid) -> Result<Vec<String>> {
        Self::check_vpc(vpc_iid)?;
        let subnets = self.ctx.api.list_subnets().await?;
        Ok(self
            .creatable_blocks(&subnets)
            .await?
            .iter()
            .map(|b| b.to_string())
            .collect())
    }
}
