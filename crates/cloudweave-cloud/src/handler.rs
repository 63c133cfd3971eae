//! Handler traits, one per resource kind
//!
//! A provider connection hands out boxed handlers; every method speaks the
//! canonical resource structures and the [`CloudError`] taxonomy.

use crate::error::{CloudError, Result};
use crate::iid::Iid;
use crate::resources::{
    DiskInfo, DiskReqInfo, HealthCheckerInfo, HealthInfo, ImageInfo, KeyPairInfo,
    KeyPairReqInfo, ListenerInfo, MyImageInfo, MyImageReqInfo, NlbInfo, NlbReqInfo, SecurityInfo,
    SecurityReqInfo, SubnetInfo, VmGroupInfo, VmInfo, VmReqInfo, VmStatus, VmStatusInfo, VpcInfo,
    VpcReqInfo,
};
use async_trait::async_trait;

#[async_trait]
pub trait VpcHandler: Send + Sync {
    async fn create_vpc(&self, req: VpcReqInfo) -> Result<VpcInfo>;

    async fn list_vpc(&self) -> Result<Vec<VpcInfo>>;

    async fn get_vpc(&self, vpc_iid: &Iid) -> Result<VpcInfo>;

    async fn delete_vpc(&self, vpc_iid: &Iid) -> Result<bool>;

    async fn add_subnet(&self, vpc_iid: &Iid, subnet: SubnetInfo) -> Result<VpcInfo>;

    async fn remove_subnet(&self, vpc_iid: &Iid, subnet_iid: &Iid) -> Result<bool>;

    /// CIDR blocks a new subnet may still take
    async fn list_creatable_subnets(&self, vpc_iid: &Iid) -> Result<Vec<String>>;
}

#[async_trait]
pub trait VmHandler: Send + Sync {
    /// Create and boot a VM, returning once it is reachable
    async fn start_vm(&self, req: VmReqInfo) -> Result<VmInfo>;

    async fn suspend_vm(&self, vm_iid: &Iid) -> Result<VmStatus>;

    async fn resume_vm(&self, vm_iid: &Iid) -> Result<VmStatus>;

    async fn reboot_vm(&self, vm_iid: &Iid) -> Result<VmStatus>;

    async fn terminate_vm(&self, vm_iid: &Iid) -> Result<VmStatus>;

    async fn list_vm_status(&self) -> Result<Vec<VmStatusInfo>>;

    async fn get_vm_status(&self, vm_iid: &Iid) -> Result<VmStatus>;

    async fn list_vm(&self) -> Result<Vec<VmInfo>>;

    async fn get_vm(&self, vm_iid: &Iid) -> Result<VmInfo>;
}

#[async_trait]
pub trait DiskHandler: Send + Sync {
    async fn create_disk(&self, req: DiskReqInfo) -> Result<DiskInfo>;

    async fn list_disk(&self) -> Result<Vec<DiskInfo>>;

    async fn get_disk(&self, disk_iid: &Iid) -> Result<DiskInfo>;

    async fn change_disk_size(&self, disk_iid: &Iid, size: &str) -> Result<bool>;

    async fn delete_disk(&self, disk_iid: &Iid) -> Result<bool>;

    async fn attach_disk(&self, disk_iid: &Iid, vm_iid: &Iid) -> Result<DiskInfo>;

    async fn detach_disk(&self, disk_iid: &Iid, vm_iid: &Iid) -> Result<bool>;
}

#[async_trait]
pub trait KeyPairHandler: Send + Sync {
    async fn create_key(&self, req: KeyPairReqInfo) -> Result<KeyPairInfo>;

    async fn list_key(&self) -> Result<Vec<KeyPairInfo>>;

    async fn get_key(&self, key_iid: &Iid) -> Result<KeyPairInfo>;

    async fn delete_key(&self, key_iid: &Iid) -> Result<bool>;
}

#[async_trait]
pub trait SecurityHandler: Send + Sync {
    async fn create_security(&self, req: SecurityReqInfo) -> Result<SecurityInfo>;

    async fn list_security(&self) -> Result<Vec<SecurityInfo>>;

    async fn get_security(&self, security_iid: &Iid) -> Result<SecurityInfo>;

    async fn delete_security(&self, security_iid: &Iid) -> Result<bool>;
}

#[async_trait]
pub trait NlbHandler: Send + Sync {
    async fn create_nlb(&self, req: NlbReqInfo) -> Result<NlbInfo>;

    async fn list_nlb(&self) -> Result<Vec<NlbInfo>>;

    async fn get_nlb(&self, nlb_iid: &Iid) -> Result<NlbInfo>;

    async fn delete_nlb(&self, nlb_iid: &Iid) -> Result<bool>;

    async fn change_listener(&self, nlb_iid: &Iid, listener: ListenerInfo) -> Result<ListenerInfo>;

    async fn change_vm_group_info(&self, nlb_iid: &Iid, vm_group: VmGroupInfo)
    -> Result<VmGroupInfo>;

    async fn add_vms(&self, nlb_iid: &Iid, vm_iids: &[Iid]) -> Result<VmGroupInfo>;

    async fn remove_vms(&self, nlb_iid: &Iid, vm_iids: &[Iid]) -> Result<bool>;

    async fn get_vm_group_health_info(&self, nlb_iid: &Iid) -> Result<HealthInfo>;

    async fn change_health_checker_info(
        &self,
        nlb_iid: &Iid,
        health_checker: HealthCheckerInfo,
    ) -> Result<HealthCheckerInfo>;
}

/// Public template images are read-only on every provider we drive
#[async_trait]
pub trait ImageHandler: Send + Sync {
    async fn list_image(&self) -> Result<Vec<ImageInfo>>;

    async fn get_image(&self, image_iid: &Iid) -> Result<ImageInfo>;

    async fn create_image(&self, image_iid: &Iid) -> Result<ImageInfo> {
        Err(CloudError::NotSupported(format!(
            "creating public image '{}'",
            image_iid
        )))
    }

    async fn delete_image(&self, image_iid: &Iid) -> Result<bool> {
        Err(CloudError::NotSupported(format!(
            "deleting public image '{}'",
            image_iid
        )))
    }
}

#[async_trait]
pub trait MyImageHandler: Send + Sync {
    async fn snapshot_vm(&self, req: MyImageReqInfo) -> Result<MyImageInfo>;

    async fn list_my_image(&self) -> Result<Vec<MyImageInfo>>;

    async fn get_my_image(&self, my_image_iid: &Iid) -> Result<MyImageInfo>;

    async fn delete_my_image(&self, my_image_iid: &Iid) -> Result<bool>;
}
