use super::print_json;
use crate::session::Target;
use cloudweave_cloud::Namespace;
use serde::Serialize;

#[derive(Serialize)]
struct Record {
    name_id: String,
    value: String,
}

/// Records of the connection's credential scope; no provider call is made
pub async fn list(target: &Target, namespace: &str) -> anyhow::Result<()> {
    let namespace: Namespace = namespace.parse()?;
    let driver = target.driver()?;
    let hash = target.credential_hash()?;
    let store = target.store()?;

    tracing::debug!("Listing {} records for {}/{}", namespace, driver.name(), hash);
    let records: Vec<Record> = store
        .list(namespace, driver.name(), &hash)
        .await?
        .into_iter()
        .map(|r| Record {
            name_id: r.name_id,
            value: r.value,
        })
        .collect();
    print_json(&records)
}
