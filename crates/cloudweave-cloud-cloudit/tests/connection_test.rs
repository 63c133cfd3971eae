//! Opening Cloudit connections through the driver

mod common;

use cloudweave_cloud::credential::{CLUSTER_ID, IDENTITY_ENDPOINT, PASSWORD, TENANT_ID, USERNAME};
use cloudweave_cloud::{
    CloudDriver, CloudError, Connection, ConnectionInfo, CredentialInfo, Iid, KeyPairReqInfo,
    MemoryBackend, MetadataStore, Namespace, ReconcilerConfig, ResourceKind,
};
use cloudweave_cloud_cloudit::{CREDENTIAL_HASH_FIELDS, ClouditDriver, DRIVER_NAME};
use common::{CLUSTER_NAME, FakeCloudit, FixedKeyGenerator};
use std::sync::Arc;

fn connection_info(user: &str) -> ConnectionInfo {
    ConnectionInfo {
        credential: CredentialInfo::new()
            .with(IDENTITY_ENDPOINT, "https://cloudit.example")
            .with(USERNAME, user)
            .with(PASSWORD, "secret")
            .with(TENANT_ID, "tenant-1")
            .with(CLUSTER_ID, CLUSTER_NAME),
        ..Default::default()
    }
}

fn driver(fake: Arc<FakeCloudit>) -> ClouditDriver {
    ClouditDriver::new()
        .with_api(fake)
        .with_keygen(Arc::new(FixedKeyGenerator::new()))
}

#[tokio::test]
async fn test_open_connection() {
    let fake = FakeCloudit::seeded();
    let store = MetadataStore::shared(MemoryBackend::new());
    let driver = driver(fake.clone());

    let info = connection_info("alice");
    let expected_hash = info.credential.hash_fields(CREDENTIAL_HASH_FIELDS);
    let conn = Connection::open(&driver, info, store, ReconcilerConfig::immediate(5))
        .await
        .unwrap();

    assert_eq!(conn.driver_name(), DRIVER_NAME);
    assert_eq!(conn.credential_hash(), expected_hash);
    assert!(conn.capability().supports(ResourceKind::Nlb));
    assert!(conn.capability().single_vpc);
    assert!(conn.is_connected().await.unwrap());

    fake.fail("list_clusters");
    assert!(!conn.is_connected().await.unwrap());
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_connections_share_store_per_credential() {
    let fake = FakeCloudit::seeded();
    let store = MetadataStore::shared(MemoryBackend::new());
    let driver = driver(fake);

    let alice = Connection::open(
        &driver,
        connection_info("alice"),
        store.clone(),
        ReconcilerConfig::immediate(5),
    )
    .await
    .unwrap();
    let keys = alice.create_key_pair_handler().unwrap();
    keys.create_key(KeyPairReqInfo {
        iid: Iid::named("kp-1"),
        ..Default::default()
    })
    .await
    .unwrap();

    let again = Connection::open(
        &driver,
        connection_info("alice"),
        store.clone(),
        ReconcilerConfig::immediate(5),
    )
    .await
    .unwrap();
    let listed = again.create_key_pair_handler().unwrap().list_key().await.unwrap();
    assert_eq!(listed.len(), 1);

    let bob = Connection::open(
        &driver,
        connection_info("bob"),
        store.clone(),
        ReconcilerConfig::immediate(5),
    )
    .await
    .unwrap();
    assert_ne!(bob.credential_hash(), alice.credential_hash());
    assert!(
        bob.create_key_pair_handler()
            .unwrap()
            .list_key()
            .await
            .unwrap()
            .is_empty()
    );

    let records = store
        .list(Namespace::KeyPair, DRIVER_NAME, alice.credential_hash())
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_missing_identity_endpoint() {
    let driver = ClouditDriver::new();
    let info = ConnectionInfo {
        credential: CredentialInfo::new().with(USERNAME, "alice"),
        ..Default::default()
    };

    let result = Connection::open(
        &driver,
        info,
        MetadataStore::shared(MemoryBackend::new()),
        ReconcilerConfig::immediate(5),
    )
    .await;
    assert!(matches!(result, Err(CloudError::InvalidArgument(_))));
}

#[test]
fn test_driver_reports_its_surface() {
    let driver = ClouditDriver::new();
    assert_eq!(driver.name(), "CLOUDIT");
    let capability = driver.capability();
    for kind in [
        ResourceKind::Image,
        ResourceKind::Vpc,
        ResourceKind::Security,
        ResourceKind::KeyPair,
        ResourceKind::Vm,
        ResourceKind::Nlb,
        ResourceKind::Disk,
        ResourceKind::MyImage,
    ] {
        assert!(capability.supports(kind), "{} should be supported", kind);
    }
}
