use super::print_json;
use cloudweave_cloud::Connection;

pub async fn list_vms(connection: &Connection) -> anyhow::Result<()> {
    let vms = connection.create_vm_handler()?.list_vm().await?;
    print_json(&vms)
}

pub async fn list_nlbs(connection: &Connection) -> anyhow::Result<()> {
    let nlbs = connection.create_nlb_handler()?.list_nlb().await?;
    print_json(&nlbs)
}
