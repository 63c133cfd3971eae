//! Block volume handler

use super::{ClouditContext, normalize_time};
use crate::model::{RawVolume, VOLUME_KEY_VALUES, VolumeCreateRequest, VolumeUpdateRequest, key_values};
use async_trait::async_trait;
use cloudweave_cloud::{
    CloudError, DiskHandler, DiskInfo, DiskReqInfo, DiskStatus, Iid, PollStatus, Result,
};

pub const DEFAULT_DISK_SIZE_GB: i32 = 50;

pub struct ClouditDiskHandler {
    ctx: ClouditContext,
}

pub fn disk_status(state: &str) -> DiskStatus {
    match state.to_ascii_lowercase().as_str() {
        "creating" => DiskStatus::Creating,
        "deleting" => DiskStatus::Deleting,
        "available" => DiskStatus::Available,
        "attaching" | "detaching" | "in_use" | "converting" | "extending" => DiskStatus::Attached,
        _ => DiskStatus::Failed,
    }
}

fn parse_size(size: &str) -> Result<Option<i32>> {
    if size.is_empty() || size.eq_ignore_ascii_case("default") {
        return Ok(None);
    }
    match size.parse::<i32>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(CloudError::InvalidArgument(format!(
            "disk size '{}' is not a positive number of GB",
            size
        ))),
    }
}

impl ClouditDiskHandler {
    pub fn new(ctx: ClouditContext) -> Self {
        Self { ctx }
    }

    async fn find_volume(&self, iid: &Iid) -> Result<RawVolume> {
        iid.require_valid("Disk")?;
        self.ctx
            .api
            .list_volumes()
            .await?
            .into_iter()
            .find(|v| iid.matches(&v.name, &v.id))
            .ok_or_else(|| CloudError::NotFound(format!("disk '{}'", iid)))
    }

    async fn disk_info(&self, volume: &RawVolume) -> Result<DiskInfo> {
        let status = disk_status(&volume.state);
        let owner_vm = if status == DiskStatus::Attached {
            match self.ctx.api.volume_owner(&volume.id).await? {
                Some(owner) => Iid::new(owner.vm_name, owner.vm_id),
                None => Iid::default(),
            }
        } else {
            Iid::default()
        };

        Ok(DiskInfo {
            iid: Iid::new(&volume.name, &volume.id),
            disk_type: String::new(),
            disk_size: volume.size.to_string(),
            status,
            owner_vm,
            created_time: normalize_time(&volume.created_at),
            key_value_list: key_values(volume, VOLUME_KEY_VALUES),
        })
    }

    fn require_status(volume: &RawVolume, allowed: &[DiskStatus], action: &str) -> Result<()> {
        let status = disk_status(&volume.state);
        if allowed.contains(&status) {
            Ok(())
        } else {
            Err(CloudError::InvalidState(format!(
                "cannot {} disk '{}' in {} state",
                action, volume.name, status
            )))
        }
    }

    async fn poll_volume(&self, id: &str) -> Result<PollStatus<RawVolume>> {
        let volume = self
            .ctx
            .api
            .list_volumes()
            .await?
            .into_iter()
            .find(|v| v.id == id);
        Ok(match volume {
            Some(v) => match disk_status(&v.state) {
                DiskStatus::Available => PollStatus::Reached(v),
                DiskStatus::Creating => PollStatus::Pending(v.state),
                _ => PollStatus::Failed(v.state),
            },
            None => PollStatus::Pending("not listed".into()),
        })
    }
}

#[async_trait]
impl DiskHandler for ClouditDiskHandler {
    async fn create_disk(&self, req: DiskReqInfo) -> Result<DiskInfo> {
        let name = req.iid.name_id.clone();
        if name.is_empty() {
            return Err(CloudError::InvalidArgument("disk NameId is required".into()));
        }
        let size = parse_size(&req.disk_size)?.unwrap_or(DEFAULT_DISK_SIZE_GB);
        let cluster_id = self.ctx.cluster_id().await?;

        let volumes = self.ctx.api.list_volumes().await?;
        if volumes.iter().any(|v| v.name.eq_ignore_ascii_case(&name)) {
            return Err(CloudError::AlreadyExists(format!("disk '{}'", name)));
        }

        let operation = format!("create disk '{}'", name);
        let request = VolumeCreateRequest {
            name: name.clone(),
            cluster_id,
            size,
            mode: String::new(),
        };
        tracing::info!("Creating disk {} ({} GB)", name, size);
        let (_, volume) = self
            .ctx
            .infra()
            .provision(
                &operation,
                || self.ctx.api.create_volume(&request),
                |created: &RawVolume| {
                    let id = created.id.clone();
                    async move { self.poll_volume(&id).await }
                },
            )
            .await?;

        self.disk_info(&volume).await
    }

    async fn list_disk(&self) -> Result<Vec<DiskInfo>> {
        let volumes = self.ctx.api.list_volumes().await?;
        let mut disks = Vec::with_capacity(volumes.len());
        for volume in &volumes {
            disks.push(self.disk_info(volume).await?);
        }
        Ok(disks)
    }

    async fn get_disk(&self, iid: &Iid) -> Result<DiskInfo> {
        let volume = self.find_volume(iid).await?;
        self.disk_info(&volume).await
    }

    async fn change_disk_size(&self, iid: &Iid, size: &str) -> Result<bool> {
        let volume = self.find_volume(iid).await?;
        Self::require_status(&volume, &[DiskStatus::Available], "resize")?;

        let new_size = parse_size(size)?.ok_or_else(|| {
            CloudError::InvalidArgument("a new disk size is required".into())
        })?;
        if new_size <= volume.size {
            return Err(CloudError::InvalidArgument(format!(
                "disk '{}' can only grow: {} GB requested, currently {} GB",
                volume.name, new_size, volume.size
            )));
        }

        tracing::info!("Resizing disk {} to {} GB", volume.name, new_size);
        self.ctx
            .api
            .update_volume(
                &volume.id,
                &VolumeUpdateRequest {
                    name: volume.name.clone(),
                    size: new_size,
                    description: volume.description.clone(),
                },
            )
            .await
            .map_err(|e| e.context(format!("resize disk '{}'", volume.name)))?;
        Ok(true)
    }

    async fn delete_disk(&self, iid: &Iid) -> Result<bool> {
        let volume = self.find_volume(iid).await?;
        Self::require_status(&volume, &[DiskStatus::Available, DiskStatus::Failed], "delete")?;

        tracing::info!("Deleting disk {}", volume.name);
        self.ctx
            .api
            .delete_volume(&volume.id)
            .await
            .map_err(|e| e.context(format!("delete disk '{}'", volume.name)))?;
        Ok(true)
    }

    async fn attach_disk(&self, disk_iid: &Iid, vm_iid: &Iid) -> Result<DiskInfo> {
        let volume = self.find_volume(disk_iid).await?;
        Self::require_status(&volume, &[DiskStatus::Available], "attach")?;
        let server = self.ctx.find_server(vm_iid).await?;

        tracing::info!("Attaching disk {} to VM {}", volume.name, server.name);
        self.ctx
            .api
            .attach_volume(&server.id, &volume.id)
            .await
            .map_err(|e| e.context(format!("attach disk '{}'", volume.name)))?;

        self.get_disk(&Iid::new(&volume.name, &volume.id)).await
    }

    async fn detach_disk(&self, disk_iid: &Iid, vm_iid: &Iid) -> Result<bool> {
        let volume = self.find_volume(disk_iid).await?;
        Self::require_status(&volume, &[DiskStatus::Attached], "detach")?;
        let server = self.ctx.find_server(vm_iid).await?;

        tracing::info!("Detaching disk {} from VM {}", volume.name, server.name);
        self.ctx
            .api
            .detach_volume(&server.id, &volume.id)
            .await
            .map_err(|e| e.context(format!("detach disk '{}'", volume.name)))?;
        Ok(true)
    }
}
