use super::print_json;
use cloudweave_cloud::{Connection, Iid};

pub async fn list_vpcs(connection: &Connection) -> anyhow::Result<()> {
    let vpcs = connection.create_vpc_handler()?.list_vpc().await?;
    print_json(&vpcs)
}

pub async fn creatable_subnets(connection: &Connection, vpc: Option<&str>) -> anyhow::Result<()> {
    let handler = connection.create_vpc_handler()?;
    let vpc_iid = match vpc {
        Some(name) => Iid::named(name),
        None if connection.capability().single_vpc => handler
            .list_vpc()
            .await?
            .into_iter()
            .next()
            .map(|v| v.iid)
            .ok_or_else(|| anyhow::anyhow!("the connection reports no VPC"))?,
        None => anyhow::bail!(
            "{} manages several VPCs; pass --vpc",
            connection.driver_name()
        ),
    };

    let blocks = handler.list_creatable_subnets(&vpc_iid).await?;
    print_json(&blocks)
}
