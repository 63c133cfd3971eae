use super::print_json;
use cloudweave_cloud::{Connection, Iid, KeyPairReqInfo};
use colored::Colorize;

pub async fn list(connection: &Connection) -> anyhow::Result<()> {
    let keys = connection.create_key_pair_handler()?.list_key().await?;
    print_json(&keys)
}

pub async fn get(connection: &Connection, name: &str) -> anyhow::Result<()> {
    let key = connection
        .create_key_pair_handler()?
        .get_key(&Iid::named(name))
        .await?;
    print_json(&key)
}

pub async fn create(connection: &Connection, name: &str) -> anyhow::Result<()> {
    let key = connection
        .create_key_pair_handler()?
        .create_key(KeyPairReqInfo {
            iid: Iid::named(name),
            ..Default::default()
        })
        .await?;
    eprintln!("{} key pair {}", "✓ Created".green(), name.cyan());
    print_json(&key)
}

pub async fn delete(connection: &Connection, name: &str) -> anyhow::Result<()> {
    connection
        .create_key_pair_handler()?
        .delete_key(&Iid::named(name))
        .await?;
    eprintln!("{} key pair {}", "✓ Deleted".green(), name.cyan());
    Ok(())
}
