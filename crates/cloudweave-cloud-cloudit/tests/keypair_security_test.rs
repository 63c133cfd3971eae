//! Key pairs and security groups, both backed by the metadata store

mod common;

use cloudweave_cloud::{
    CloudError, CredentialStore, Iid, KeyPairHandler, KeyPairReqInfo, MemoryBackend, MetadataStore, Namespace,
    SecurityHandler, SecurityReqInfo, SecurityRuleInfo,
};
use cloudweave_cloud_cloudit::{ClouditKeyPairHandler, ClouditSecurityHandler};
use common::{FakeCloudit, context, context_with_store};

fn key_request(name: &str) -> KeyPairReqInfo {
    KeyPairReqInfo {
        iid: Iid::named(name),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_key_pair_lifecycle() {
    let fake = FakeCloudit::seeded();
    let ctx = context(fake);
    let store = ctx.store.clone();
    let keys = ClouditKeyPairHandler::new(ctx);

    let created = keys.create_key(key_request("kp-1")).await.unwrap();
    assert_eq!(created.iid, Iid::new("kp-1", "kp-1"));
    assert!(created.public_key.starts_with("ssh-rsa "));
    assert_eq!(created.fingerprint.split(':').count(), 16);
    assert_eq!(created.vm_user_id, "cb-user");
    assert_eq!(
        store.get(Namespace::KeyPair, "kp-1").await.unwrap(),
        created.private_key
    );

    let fetched = keys.get_key(&Iid::named("kp-1")).await.unwrap();
    assert_eq!(fetched.public_key, created.public_key);
    assert_eq!(fetched.fingerprint, created.fingerprint);

    assert!(matches!(
        keys.create_key(key_request("kp-1")).await,
        Err(CloudError::AlreadyExists(_))
    ));

    assert!(keys.delete_key(&Iid::named("kp-1")).await.unwrap());
    assert!(keys.list_key().await.unwrap().is_empty());
    assert!(matches!(
        keys.get_key(&Iid::named("kp-1")).await,
        Err(CloudError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_key_pairs_are_scoped_to_the_tenant() {
    let store = MetadataStore::shared(MemoryBackend::new());
    let alice = ClouditKeyPairHandler::new(context_with_store(
        FakeCloudit::seeded(),
        store.clone(),
    ));
    alice.create_key(key_request("shared-name")).await.unwrap();

    let mut bob_ctx = context_with_store(FakeCloudit::seeded(), store.clone());
    bob_ctx.store = CredentialStore::new(store, "CLOUDIT", "another-tenant");
    let bob = ClouditKeyPairHandler::new(bob_ctx);
    assert!(bob.list_key().await.unwrap().is_empty());
    bob.create_key(key_request("shared-name")).await.unwrap();
}

#[tokio::test]
async fn test_security_group_rules_and_association() {
    let fake = FakeCloudit::seeded();
    let ctx = context(fake.clone());
    let store = ctx.store.clone();
    let groups = ClouditSecurityHandler::new(ctx);

    let created = groups
        .create_security(SecurityReqInfo {
            iid: Iid::named("web"),
            security_rules: vec![
                SecurityRuleInfo {
                    direction: "inbound".into(),
                    ip_protocol: "TCP".into(),
                    from_port: "80".into(),
                    to_port: "80".into(),
                    cidr: "10.0.0.0/8".into(),
                },
                SecurityRuleInfo {
                    direction: "inbound".into(),
                    ip_protocol: "TCP".into(),
                    from_port: "8000".into(),
                    to_port: "8100".into(),
                    cidr: String::new(),
                },
            ],
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(created.iid.name_id, "web");
    assert_eq!(created.vpc_iid.name_id, "Default-VPC");
    assert_eq!(created.security_rules.len(), 2);
    assert_eq!(created.security_rules[1].from_port, "8000");
    assert_eq!(created.security_rules[1].to_port, "8100");
    assert_eq!(created.security_rules[0].ip_protocol, "tcp");
    // Cloudit rules are always opened to every source
    assert!(created.security_rules.iter().all(|r| r.cidr == "0.0.0.0/0"));
    {
        let state = fake.state.lock().unwrap();
        let raw = state.security_groups.iter().find(|g| g.name == "web").unwrap();
        assert_eq!(raw.rules[0].name, "web-rules-1");
        assert_eq!(raw.rules[1].name, "web-rules-2");
    }

    store
        .put(Namespace::SecurityGroup, "web", "vm-a,vm-b")
        .await
        .unwrap();
    let fetched = groups.get_security(&Iid::named("web")).await.unwrap();
    assert_eq!(
        fetched.vm_iids,
        vec![Iid::named("vm-a"), Iid::named("vm-b")]
    );

    let err = groups.delete_security(&Iid::named("web")).await.unwrap_err();
    assert!(matches!(err, CloudError::InvalidState(_)));
    assert_eq!(fake.count("delete_security_group"), 0);

    store.delete(Namespace::SecurityGroup, "web").await.unwrap();
    assert!(groups.delete_security(&Iid::named("web")).await.unwrap());
    assert_eq!(fake.count("delete_security_group"), 1);
}

#[tokio::test]
async fn test_duplicate_security_group() {
    let fake = FakeCloudit::seeded();
    let groups = ClouditSecurityHandler::new(context(fake.clone()));

    let err = groups
        .create_security(SecurityReqInfo {
            iid: Iid::named("ssh"),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CloudError::AlreadyExists(_)));
    assert_eq!(fake.count("create_security_group"), 0);
}

#[tokio::test]
async fn test_rule_listing_failure_is_not_swallowed() {
    let fake = FakeCloudit::seeded();
    let groups = ClouditSecurityHandler::new(context(fake.clone()));
    groups
        .create_security(SecurityReqInfo {
            iid: Iid::named("web"),
            ..Default::default()
        })
        .await
        .unwrap();

    fake.fail("list_security_rules");

    let err = groups.get_security(&Iid::named("web")).await.unwrap_err();
    assert!(matches!(err, CloudError::UpstreamError(_)));
    assert!(err.to_string().contains("list rules of security group 'web'"));
    assert!(groups.list_security().await.is_err());
    assert!(
        groups
            .create_security(SecurityReqInfo {
                iid: Iid::named("db"),
                ..Default::default()
            })
            .await
            .is_err()
    );
}
