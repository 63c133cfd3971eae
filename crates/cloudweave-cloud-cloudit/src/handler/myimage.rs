//! My-image handler
//!
//! A my-image is the set of volume snapshots taken from one VM, named
//! `{image}-dev-{device}`. The bootable snapshot carries the image's
//! SystemId; the others are restored as data volumes.

use super::{ClouditContext, normalize_time};
use crate::api::ClouditApi;
use crate::model::{RawSnapshot, SNAPSHOT_KEY_VALUES, SnapshotCreateRequest, key_values};
use async_trait::async_trait;
use cloudweave_cloud::{
    CloudError, Compensation, Iid, MyImageHandler, MyImageInfo, MyImageReqInfo, MyImageStatus,
    PollStatus, Result, VmStatus,
};
use futures_util::FutureExt;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Separates the image name from the device in snapshot names
pub const DEVICE_SEPARATOR: &str = "-dev-";
pub const MAX_IMAGE_NAME_LEN: usize = 35;

pub struct ClouditMyImageHandler {
    ctx: ClouditContext,
}

/// Image name a snapshot belongs to
pub fn image_name(snapshot_name: &str) -> &str {
    snapshot_name
        .split(DEVICE_SEPARATOR)
        .next()
        .unwrap_or(snapshot_name)
}

/// Device a snapshot was taken from
pub fn snapshot_device(snapshot_name: &str) -> Option<&str> {
    snapshot_name
        .split_once(DEVICE_SEPARATOR)
        .map(|(_, device)| device)
}

fn is_bootable(snapshot: &RawSnapshot) -> bool {
    snapshot.bootable.eq_ignore_ascii_case("yes") || snapshot.bootable.eq_ignore_ascii_case("true")
}

fn group_by_image(snapshots: Vec<RawSnapshot>) -> BTreeMap<String, Vec<RawSnapshot>> {
    let mut groups: BTreeMap<String, Vec<RawSnapshot>> = BTreeMap::new();
    for snapshot in snapshots {
        groups
            .entry(image_name(&snapshot.name).to_string())
            .or_default()
            .push(snapshot);
    }
    groups
}

fn image_status(snapshots: &[RawSnapshot]) -> MyImageStatus {
    if snapshots
        .iter()
        .any(|s| s.state.eq_ignore_ascii_case("deleting"))
    {
        MyImageStatus::Deleting
    } else if snapshots
        .iter()
        .all(|s| s.state.eq_ignore_ascii_case("available"))
    {
        MyImageStatus::Available
    } else {
        MyImageStatus::Unavailable
    }
}

/// Bootable snapshot of the my-image `iid`
pub(crate) async fn find_root_snapshot(ctx: &ClouditContext, iid: &Iid) -> Result<RawSnapshot> {
    iid.require_valid("MyImage")?;
    let snapshots = ctx.api.list_snapshots().await?;
    snapshots
        .into_iter()
        .filter(is_bootable)
        .find(|s| {
            if iid.system_id.is_empty() {
                image_name(&s.name).eq_ignore_ascii_case(&iid.name_id)
            } else {
                s.id == iid.system_id
            }
        })
        .ok_or_else(|| CloudError::NotFound(format!("my-image '{}'", iid)))
}

/// Data-volume snapshots of the my-image named `image`, ordered by device
pub(crate) async fn data_snapshots(ctx: &ClouditContext, image: &str) -> Result<Vec<RawSnapshot>> {
    let mut snapshots: Vec<RawSnapshot> = ctx
        .api
        .list_snapshots()
        .await?
        .into_iter()
        .filter(|s| image_name(&s.name) == image && !is_bootable(s))
        .collect();
    snapshots.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(snapshots)
}

async fn delete_snapshots_of(api: &Arc<dyn ClouditApi>, image: &str) -> Result<()> {
    for snapshot in api.list_snapshots().await? {
        if image_name(&snapshot.name) == image {
            tracing::info!("Deleting snapshot {}", snapshot.name);
            api.delete_snapshot(&snapshot.id).await?;
        }
    }
    Ok(())
}

impl ClouditMyImageHandler {
    pub fn new(ctx: ClouditContext) -> Self {
        Self { ctx }
    }

    async fn image_info(&self, name: &str, snapshots: &[RawSnapshot]) -> Result<MyImageInfo> {
        let root = snapshots
            .iter()
            .find(|s| is_bootable(s))
            .or_else(|| snapshots.first())
            .ok_or_else(|| CloudError::NotFound(format!("my-image '{}'", name)))?;

        let source_vm = match self.ctx.api.volume_owner(&root.volume_id).await {
            Ok(Some(owner)) => Iid::new(owner.vm_name, owner.vm_id),
            Ok(None) => Iid::default(),
            Err(e) if e.is_not_found() => Iid::default(),
            Err(e) => return Err(e),
        };

        Ok(MyImageInfo {
            iid: Iid::new(name, &root.id),
            source_vm,
            status: image_status(snapshots),
            created_time: normalize_time(&root.created_at),
            key_value_list: key_values(root, SNAPSHOT_KEY_VALUES),
        })
    }

    async fn poll_snapshots(&self, image: &str, expected: usize) -> Result<PollStatus<Vec<RawSnapshot>>> {
        let snapshots: Vec<RawSnapshot> = self
            .ctx
            .api
            .list_snapshots()
            .await?
            .into_iter()
            .filter(|s| image_name(&s.name) == image)
            .collect();

        if let Some(failed) = snapshots
            .iter()
            .find(|s| s.state.eq_ignore_ascii_case("error") || s.state.eq_ignore_ascii_case("failed"))
        {
            return Ok(PollStatus::Failed(format!("{} is {}", failed.name, failed.state)));
        }
        let ready = snapshots
            .iter()
            .filter(|s| s.state.eq_ignore_ascii_case("available"))
            .count();
        Ok(if ready >= expected {
            PollStatus::Reached(snapshots)
        } else {
            PollStatus::Pending(format!("{}/{} snapshots available", ready, expected))
        })
    }
}

#[async_trait]
impl MyImageHandler for ClouditMyImageHandler {
    async fn snapshot_vm(&self, req: MyImageReqInfo) -> Result<MyImageInfo> {
        let name = req.iid.name_id.clone();
        if name.is_empty() {
            return Err(CloudError::InvalidArgument("my-image NameId is required".into()));
        }
        if name.chars().count() > MAX_IMAGE_NAME_LEN {
            return Err(CloudError::InvalidArgument(format!(
                "my-image name cannot be longer than {} characters",
                MAX_IMAGE_NAME_LEN
            )));
        }
        if name.contains(DEVICE_SEPARATOR) {
            return Err(CloudError::InvalidArgument(format!(
                "my-image name cannot include the reserved string '{}'",
                DEVICE_SEPARATOR
            )));
        }
        if req.source_vm.name_id.contains(DEVICE_SEPARATOR) {
            return Err(CloudError::InvalidArgument(format!(
                "source VM name cannot include the reserved string '{}'",
                DEVICE_SEPARATOR
            )));
        }
        if self
            .ctx
            .api
            .list_snapshots()
            .await?
            .iter()
            .any(|s| image_name(&s.name).eq_ignore_ascii_case(&name))
        {
            return Err(CloudError::AlreadyExists(format!("my-image '{}'", name)));
        }

        let server = self.ctx.find_server(&req.source_vm).await?;
        if server.is_windows() && super::vm_status(&server.state) != VmStatus::Suspended {
            return Err(CloudError::InvalidState(format!(
                "Windows VM '{}' must be stopped before taking a snapshot",
                server.name
            )));
        }

        let volumes = self.ctx.api.list_server_volumes(&server.id).await?;
        if volumes.is_empty() {
            return Err(CloudError::InvalidState(format!(
                "VM '{}' has no volumes to snapshot",
                server.name
            )));
        }

        let operation = format!("snapshot VM '{}' as '{}'", server.name, name);
        let mut rollback = Compensation::new(operation.clone());
        for volume in &volumes {
            let snapshot_name = format!("{}{}{}", name, DEVICE_SEPARATOR, volume.dev);
            tracing::info!("Creating snapshot {} of volume {}", snapshot_name, volume.volume_id);
            let created = self
                .ctx
                .api
                .create_snapshot(&SnapshotCreateRequest {
                    name: snapshot_name.clone(),
                    volume_id: volume.volume_id.clone(),
                })
                .await;
            if let Err(e) = created {
                return Err(rollback.fail_with(e.context(&operation)).await);
            }

            let api = self.ctx.api.clone();
            rollback.push(format!("snapshot {}", snapshot_name), move || {
                async move {
                    for s in api.list_snapshots().await? {
                        if s.name == snapshot_name {
                            api.delete_snapshot(&s.id).await?;
                        }
                    }
                    Ok::<(), CloudError>(())
                }
                .boxed()
            });
        }

        let waited = self
            .ctx
            .compute()
            .wait_for(&operation, || self.poll_snapshots(&name, volumes.len()))
            .await;

        match waited {
            Ok(snapshots) => {
                rollback.commit();
                self.image_info(&name, &snapshots).await
            }
            Err(e) => Err(rollback.fail_with(e).await),
        }
    }

    async fn list_my_image(&self) -> Result<Vec<MyImageInfo>> {
        let groups = group_by_image(self.ctx.api.list_snapshots().await?);
        let mut images = Vec::with_capacity(groups.len());
        for (name, snapshots) in &groups {
            images.push(self.image_info(name, snapshots).await?);
        }
        Ok(images)
    }

    async fn get_my_image(&self, iid: &Iid) -> Result<MyImageInfo> {
        let root = find_root_snapshot(&self.ctx, iid).await?;
        let name = image_name(&root.name).to_string();
        let snapshots: Vec<RawSnapshot> = self
            .ctx
            .api
            .list_snapshots()
            .await?
            .into_iter()
            .filter(|s| image_name(&s.name) == name)
            .collect();
        self.image_info(&name, &snapshots).await
    }

    async fn delete_my_image(&self, iid: &Iid) -> Result<bool> {
        let root = find_root_snapshot(&self.ctx, iid).await?;
        let name = image_name(&root.name).to_string();
        delete_snapshots_of(&self.ctx.api, &name)
            .await
            .map_err(|e| e.context(format!("delete my-image '{}'", name)))?;
        Ok(true)
    }
}
