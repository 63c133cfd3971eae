//! VM handler
//!
//! Starting a server is a multi-step sequence: create, wait for boot, attach
//! a public IP, record security group membership, restore a my-image's data
//! volumes and attach data disks. A failure after the create call removes the
//! restored volumes, then runs the cleaner (release the public IP, terminate,
//! wait until the server is gone) and returns the original error.

use super::disk::ClouditDiskHandler;
use super::image::find_template;
use super::keypair::SSH_DEFAULT_USER;
use super::myimage::{
    DEVICE_SEPARATOR, data_snapshots, find_root_snapshot, image_name, snapshot_device,
};
use super::security::{associate_vm, find_group, forget_vm};
use super::vpc::{ClouditVpcHandler, DEFAULT_VPC_NAME};
use super::{ClouditContext, normalize_time, vm_status};
use crate::model::{
    AdaptiveIpCreateRequest, RawServer, RawSubnet, RawVolume, SERVER_KEY_VALUES, SecGroupId,
    ServerAction, ServerCreateRequest, VolumeFromSnapshotRequest, key_values,
};
use async_trait::async_trait;
use cloudweave_cloud::{
    CloudError, Compensation, DiskHandler, Iid, ImageType, Namespace, PollStatus, Result,
    VmHandler, VmInfo, VmReqInfo, VmStatus, VmStatusInfo, VpcHandler,
};
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SECURITY_GROUP_NAME: &str = "SSH";
pub const DEFAULT_ROOT_PASSWORD: &str = "qwe1212!Q";
pub const WINDOWS_ADMIN_USER: &str = "Administrator";
pub const SSH_PORT: u16 = 22;
const WINDOWS_HOST_NAME_MAX: usize = 15;
const ROOT_DEVICE: &str = "vda";

/// Provisioning facts Cloudit cannot report, kept in the server description
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VmTag {
    keypair: String,
    my_image_iid: Option<Iid>,
}

impl VmTag {
    fn parse(description: &str) -> Self {
        serde_json::from_str(description).unwrap_or_default()
    }
}

pub struct ClouditVmHandler {
    ctx: ClouditContext,
}

/// Everything resolved before the create call
struct LaunchPlan {
    request: ServerCreateRequest,
    security_groups: Vec<String>,
    is_windows: bool,
    /// Name of the my-image whose data volumes are restored after boot
    my_image: Option<String>,
}

impl ClouditVmHandler {
    pub fn new(ctx: ClouditContext) -> Self {
        Self { ctx }
    }

    async fn plan(&self, req: &VmReqInfo) -> Result<LaunchPlan> {
        let name = req.iid.name_id.clone();
        if name.is_empty() {
            return Err(CloudError::InvalidArgument("VM NameId is required".into()));
        }
        if !req.root_disk_size.is_empty() && !req.root_disk_size.eq_ignore_ascii_case("default") {
            return Err(CloudError::NotSupported(
                "Cloudit does not support a custom root disk size".into(),
            ));
        }
        if self
            .ctx
            .api
            .list_servers()
            .await?
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(&name))
        {
            return Err(CloudError::AlreadyExists(format!("VM '{}'", name)));
        }

        let (template_id, snapshot_id, tag_image, os, my_image) = match req.image_type {
            ImageType::PublicImage => {
                let template = find_template(&self.ctx, &req.image_iid).await?;
                (template.id, String::new(), None, template.os, None)
            }
            ImageType::MyImage => {
                let snapshot = find_root_snapshot(&self.ctx, &req.image_iid).await?;
                if !snapshot.state.eq_ignore_ascii_case("available") {
                    return Err(CloudError::InvalidState(format!(
                        "my-image '{}' is not available ({})",
                        req.image_iid, snapshot.state
                    )));
                }
                let os = self
                    .ctx
                    .api
                    .list_templates()
                    .await?
                    .into_iter()
                    .find(|t| t.id == snapshot.template_id)
                    .map(|t| t.os)
                    .unwrap_or_default();
                let image = Iid::new(&req.image_iid.name_id, &snapshot.id);
                let restore = image_name(&snapshot.name).to_string();
                (snapshot.template_id, snapshot.id, Some(image), os, Some(restore))
            }
        };
        let is_windows = os.to_ascii_lowercase().contains("window");

        // the public key is installed for the login user of Linux VMs
        if !is_windows {
            let key_pair = &req.key_pair_iid.name_id;
            if key_pair.is_empty() {
                return Err(CloudError::InvalidArgument(
                    "a Linux VM requires KeyPairIID".into(),
                ));
            }
            if !self.ctx.store.exists(Namespace::KeyPair, key_pair).await? {
                return Err(CloudError::NotFound(format!("key pair '{}'", key_pair)));
            }
        }

        let vpcs = ClouditVpcHandler::new(self.ctx.clone());
        let vpc = vpcs.get_vpc(&req.vpc_iid).await?;
        let subnet = vpcs.find_subnet(&req.subnet_iid).await?;
        if vpc.subnet(&Iid::new(&subnet.name, &subnet.id)).is_none() {
            return Err(CloudError::NotFound(format!(
                "subnet '{}' in VPC '{}'",
                req.subnet_iid, req.vpc_iid
            )));
        }

        let requested_groups = if req.security_group_iids.is_empty() {
            vec![Iid::named(DEFAULT_SECURITY_GROUP_NAME)]
        } else {
            req.security_group_iids.clone()
        };
        let mut groups = Vec::with_capacity(requested_groups.len());
        for iid in &requested_groups {
            groups.push(find_group(&self.ctx, iid).await?);
        }

        let spec = self
            .ctx
            .api
            .list_specs()
            .await?
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(&req.vm_spec_name))
            .ok_or_else(|| CloudError::NotFound(format!("VM spec '{}'", req.vm_spec_name)))?;

        let cluster_id = self.ctx.cluster_id().await?;

        let (host_name, root_password) = if is_windows {
            if req.vm_user_passwd.is_empty() {
                return Err(CloudError::InvalidArgument(
                    "a Windows VM requires VMUserPasswd".into(),
                ));
            }
            let host: String = name.chars().take(WINDOWS_HOST_NAME_MAX).collect();
            (host, req.vm_user_passwd.clone())
        } else {
            let password = if req.vm_user_passwd.is_empty() {
                DEFAULT_ROOT_PASSWORD.to_string()
            } else {
                req.vm_user_passwd.clone()
            };
            (name.clone(), password)
        };

        let tag = VmTag {
            keypair: req.key_pair_iid.name_id.clone(),
            my_image_iid: tag_image,
        };

        // the public IP is attached after boot, but it must exist up front
        self.ctx.first_available_ip().await?;

        Ok(LaunchPlan {
            request: ServerCreateRequest {
                template_id,
                snapshot_id,
                spec_id: spec.id,
                name: name.clone(),
                host_name,
                root_password,
                subnet_addr: subnet.addr,
                secgroups: groups.iter().map(|g| SecGroupId { id: g.id.clone() }).collect(),
                description: serde_json::to_string(&tag)?,
                protection: 0,
                cluster_id,
            },
            security_groups: groups.into_iter().map(|g| g.name).collect(),
            is_windows,
            my_image,
        })
    }

    /// Steps after the create call; any error here triggers the cleaner
    async fn finish_start(
        &self,
        created: &RawServer,
        req: &VmReqInfo,
        plan: &LaunchPlan,
    ) -> Result<VmInfo> {
        let mut restored = Compensation::new(format!("start VM '{}'", created.name));
        match self.complete_start(created, req, plan, &mut restored).await {
            Ok(info) => {
                restored.commit();
                Ok(info)
            }
            Err(e) => Err(restored.fail_with(e).await),
        }
    }

    async fn complete_start(
        &self,
        created: &RawServer,
        req: &VmReqInfo,
        plan: &LaunchPlan,
        restored: &mut Compensation<'_>,
    ) -> Result<VmInfo> {
        let operation = format!("boot VM '{}'", created.name);
        let booted = self
            .ctx
            .compute()
            .wait_for(&operation, || self.poll_boot(&created.id))
            .await?;

        self.associate_public_ip(&booted).await?;

        for group in &plan.security_groups {
            associate_vm(&self.ctx.store, group, &booted.name).await?;
        }

        if let Some(image) = &plan.my_image {
            self.restore_data_volumes(image, &booted, restored).await?;
        }

        if !req.data_disk_iids.is_empty() {
            let disks = ClouditDiskHandler::new(self.ctx.clone());
            let vm_iid = Iid::new(&booted.name, &booted.id);
            for disk in &req.data_disk_iids {
                disks.attach_disk(disk, &vm_iid).await?;
            }
        }

        let server = self.ctx.api.get_server(&booted.id).await?;
        let subnets = self.ctx.api.list_subnets().await?;
        let mut info = self.vm_info(&server, &subnets).await?;
        if plan.is_windows {
            info.vm_user_id = WINDOWS_ADMIN_USER.to_string();
        }
        Ok(info)
    }

    /// Recreate the my-image's data volumes as `{vm}-dev-{device}` and
    /// attach them in device order
    async fn restore_data_volumes(
        &self,
        image: &str,
        server: &RawServer,
        restored: &mut Compensation<'_>,
    ) -> Result<()> {
        let snapshots = data_snapshots(&self.ctx, image).await?;
        if snapshots.is_empty() {
            return Ok(());
        }

        let operation = format!("restore data volumes of VM '{}'", server.name);
        let mut names = Vec::with_capacity(snapshots.len());
        for snapshot in &snapshots {
            let device = snapshot_device(&snapshot.name).unwrap_or(snapshot.dev.as_str());
            let volume_name = format!("{}{}{}", server.name, DEVICE_SEPARATOR, device);
            tracing::info!("Restoring volume {} from snapshot {}", volume_name, snapshot.name);
            self.ctx
                .api
                .create_volume_from_snapshot(
                    &snapshot.id,
                    &VolumeFromSnapshotRequest {
                        volume_name: volume_name.clone(),
                    },
                )
                .await
                .map_err(|e| e.context(&operation))?;

            let api = self.ctx.api.clone();
            let server_id = server.id.clone();
            let name = volume_name.clone();
            restored.push(format!("volume {}", volume_name), move || {
                async move {
                    for volume in api.list_volumes().await? {
                        if volume.name != name {
                            continue;
                        }
                        match api.detach_volume(&server_id, &volume.id).await {
                            Err(e) if !e.is_not_found() => return Err(e),
                            _ => {}
                        }
                        api.delete_volume(&volume.id).await?;
                    }
                    Ok(())
                }
                .boxed()
            });
            names.push(volume_name);
        }

        let volumes = self
            .ctx
            .compute()
            .wait_for(&operation, || self.poll_volumes(&names))
            .await?;
        for volume in &volumes {
            self.ctx
                .api
                .attach_volume(&server.id, &volume.id)
                .await
                .map_err(|e| e.context(&operation))?;
        }
        Ok(())
    }

    async fn poll_volumes(&self, names: &[String]) -> Result<PollStatus<Vec<RawVolume>>> {
        let mut volumes: Vec<RawVolume> = self
            .ctx
            .api
            .list_volumes()
            .await?
            .into_iter()
            .filter(|v| names.contains(&v.name))
            .collect();

        let failed = |v: &&RawVolume| {
            v.state.eq_ignore_ascii_case("error") || v.state.eq_ignore_ascii_case("failed")
        };
        if let Some(failed) = volumes.iter().find(failed) {
            return Ok(PollStatus::Failed(format!("{} is {}", failed.name, failed.state)));
        }
        let ready = volumes
            .iter()
            .filter(|v| v.state.eq_ignore_ascii_case("available"))
            .count();
        Ok(if ready >= names.len() {
            volumes.sort_by(|a, b| a.name.cmp(&b.name));
            PollStatus::Reached(volumes)
        } else {
            PollStatus::Pending(format!("{}/{} volumes available", ready, names.len()))
        })
    }

    async fn poll_boot(&self, id: &str) -> Result<PollStatus<RawServer>> {
        let server = self.ctx.api.get_server(id).await?;
        Ok(match vm_status(&server.state) {
            VmStatus::Running if !server.private_ip.is_empty() => PollStatus::Reached(server),
            VmStatus::Failed => PollStatus::Failed(server.state),
            _ => PollStatus::Pending(server.state),
        })
    }

    async fn poll_status(&self, id: &str, target: VmStatus) -> Result<PollStatus<VmStatus>> {
        let server = self.ctx.api.get_server(id).await?;
        Ok(match vm_status(&server.state) {
            status if status == target => PollStatus::Reached(status),
            VmStatus::Failed => PollStatus::Failed(server.state),
            _ => PollStatus::Pending(server.state),
        })
    }

    async fn poll_gone(&self, id: &str) -> Result<PollStatus<()>> {
        let listed = self.ctx.api.list_servers().await?.iter().any(|s| s.id == id);
        Ok(if listed {
            PollStatus::Pending("still listed".into())
        } else {
            PollStatus::Reached(())
        })
    }

    async fn associate_public_ip(&self, server: &RawServer) -> Result<()> {
        let ip = self.ctx.first_available_ip().await?;
        tracing::info!("Associating public IP {} with VM {}", ip.ip, server.name);
        self.ctx
            .api
            .create_adaptive_ip(&AdaptiveIpCreateRequest {
                name: server.name.clone(),
                ip: ip.ip,
                private_ip: server.private_ip.clone(),
                protection: 0,
            })
            .await
            .map_err(|e| e.context(format!("associate public IP with VM '{}'", server.name)))
    }

    /// Release the public IP, terminate and wait until the server is gone
    async fn clean_up(&self, id: &str) -> Result<()> {
        let server = self.ctx.api.get_server(id).await?;
        if !server.adaptive_ip.is_empty() {
            tracing::info!("Releasing public IP {} of VM {}", server.adaptive_ip, server.name);
            self.ctx.api.delete_adaptive_ip(&server.adaptive_ip).await?;
        }

        tracing::info!("Terminating VM {}", server.name);
        self.ctx.api.delete_server(&server.id).await?;
        self.ctx
            .infra()
            .wait_for(&format!("terminate VM '{}'", server.name), || {
                self.poll_gone(&server.id)
            })
            .await?;

        forget_vm(&self.ctx.store, &server.name).await
    }

    async fn vm_info(&self, server: &RawServer, subnets: &[RawSubnet]) -> Result<VmInfo> {
        let tag = VmTag::parse(&server.description);
        let image_iid = match tag.my_image_iid {
            Some(iid) => iid,
            None => Iid::new(&server.template, &server.template_id),
        };
        let subnet_iid = subnets
            .iter()
            .find(|s| s.addr == server.subnet_addr)
            .map(|s| Iid::new(&s.name, &s.id))
            .unwrap_or_else(|| Iid::named(&server.subnet_addr));

        let data_disk_iids = self
            .ctx
            .api
            .list_server_volumes(&server.id)
            .await?
            .into_iter()
            .filter(|v| v.dev != ROOT_DEVICE)
            .map(|v| Iid::new(v.volume_name, v.volume_id))
            .collect();

        let vm_user_id = if server.is_windows() {
            WINDOWS_ADMIN_USER
        } else {
            SSH_DEFAULT_USER
        };

        Ok(VmInfo {
            iid: Iid::new(&server.name, &server.id),
            start_time: normalize_time(&server.created_at),
            image_iid,
            vm_spec_name: server.spec.clone(),
            vpc_iid: Iid::new(DEFAULT_VPC_NAME, DEFAULT_VPC_NAME),
            subnet_iid,
            security_group_iids: server
                .secgroups
                .iter()
                .map(|g| Iid::new(&g.name, &g.id))
                .collect(),
            key_pair_iid: Iid::new(&tag.keypair, &tag.keypair),
            public_ip: server.adaptive_ip.clone(),
            private_ip: server.private_ip.clone(),
            root_disk_size: server.volume_size.to_string(),
            data_disk_iids,
            ssh_access_point: if server.adaptive_ip.is_empty() {
                String::new()
            } else {
                format!("{}:{}", server.adaptive_ip, SSH_PORT)
            },
            vm_user_id: vm_user_id.to_string(),
            key_value_list: key_values(server, SERVER_KEY_VALUES),
        })
    }

    async fn power_action(
        &self,
        iid: &Iid,
        required: VmStatus,
        action: ServerAction,
        target: VmStatus,
    ) -> Result<VmStatus> {
        let server = self.ctx.find_server(iid).await?;
        let current = vm_status(&server.state);
        if current != required {
            return Err(CloudError::InvalidState(format!(
                "cannot {} VM '{}' while {}",
                action.as_str(),
                server.name,
                current
            )));
        }

        let operation = format!("{} VM '{}'", action.as_str(), server.name);
        tracing::info!("{}", operation);
        self.ctx
            .api
            .server_action(&server.id, action)
            .await
            .map_err(|e| e.context(&operation))?;

        self.ctx
            .infra()
            .wait_for(&operation, || self.poll_status(&server.id, target))
            .await
    }
}

#[async_trait]
impl VmHandler for ClouditVmHandler {
    async fn start_vm(&self, req: VmReqInfo) -> Result<VmInfo> {
        let plan = self.plan(&req).await?;

        tracing::info!("Starting VM {}", plan.request.name);
        let created = self
            .ctx
            .api
            .create_server(&plan.request)
            .await
            .map_err(|e| e.context(format!("start VM '{}'", plan.request.name)))?;

        match self.finish_start(&created, &req, &plan).await {
            Ok(info) => Ok(info),
            Err(e) => {
                tracing::warn!("Start of VM {} failed, cleaning up: {}", created.name, e);
                if let Err(clean_err) = self.clean_up(&created.id).await {
                    tracing::warn!("Cleanup of VM {} failed: {}", created.name, clean_err);
                }
                Err(e)
            }
        }
    }

    async fn suspend_vm(&self, iid: &Iid) -> Result<VmStatus> {
        self.power_action(iid, VmStatus::Running, ServerAction::Shutdown, VmStatus::Suspended)
            .await
    }

    async fn resume_vm(&self, iid: &Iid) -> Result<VmStatus> {
        self.power_action(iid, VmStatus::Suspended, ServerAction::Start, VmStatus::Running)
            .await
    }

    async fn reboot_vm(&self, iid: &Iid) -> Result<VmStatus> {
        self.power_action(iid, VmStatus::Running, ServerAction::Reboot, VmStatus::Running)
            .await
    }

    async fn terminate_vm(&self, iid: &Iid) -> Result<VmStatus> {
        let server = self.ctx.find_server(iid).await?;
        self.clean_up(&server.id)
            .await
            .map_err(|e| e.context(format!("terminate VM '{}'", server.name)))?;
        Ok(VmStatus::Terminated)
    }

    async fn list_vm_status(&self) -> Result<Vec<VmStatusInfo>> {
        Ok(self
            .ctx
            .api
            .list_servers()
            .await?
            .into_iter()
            .map(|s| VmStatusInfo {
                vm_status: vm_status(&s.state),
                iid: Iid::new(s.name, s.id),
            })
            .collect())
    }

    async fn get_vm_status(&self, iid: &Iid) -> Result<VmStatus> {
        let server = self.ctx.find_server(iid).await?;
        Ok(vm_status(&server.state))
    }

    async fn list_vm(&self) -> Result<Vec<VmInfo>> {
        let servers = self.ctx.api.list_servers().await?;
        let subnets = self.ctx.api.list_subnets().await?;
        let mut infos = Vec::with_capacity(servers.len());
        for server in &servers {
            infos.push(self.vm_info(server, &subnets).await?);
        }
        Ok(infos)
    }

    async fn get_vm(&self, iid: &Iid) -> Result<VmInfo> {
        let server = self.ctx.find_server(iid).await?;
        let subnets = self.ctx.api.list_subnets().await?;
        self.vm_info(&server, &subnets).await
    }
}
