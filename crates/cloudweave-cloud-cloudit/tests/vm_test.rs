//! VM start sequence, cleaner ordering and power actions

mod common;

use cloudweave_cloud::{CloudError, Iid, Namespace, VmHandler, VmReqInfo, VmStatus};
use cloudweave_cloud_cloudit::ClouditVmHandler;
use cloudweave_cloud_cloudit::model::RawTemplate;
use common::{FakeCloudit, KEY_PAIR, SPEC, UBUNTU, context, vm_context};

fn request(name: &str) -> VmReqInfo {
    VmReqInfo {
        iid: Iid::named(name),
        image_iid: Iid::named(UBUNTU),
        vpc_iid: Iid::named("Default-VPC"),
        subnet_iid: Iid::named("Default Network"),
        vm_spec_name: SPEC.into(),
        key_pair_iid: Iid::named(KEY_PAIR),
        ..Default::default()
    }
}

fn position(calls: &[String], op: &str) -> usize {
    calls
        .iter()
        .position(|c| c == op)
        .unwrap_or_else(|| panic!("{} was never called: {:?}", op, calls))
}

#[tokio::test]
async fn test_start_vm() {
    let fake = FakeCloudit::seeded();
    let ctx = vm_context(fake.clone()).await;
    let store = ctx.store.clone();
    let vms = ClouditVmHandler::new(ctx);

    let info = vms.start_vm(request("web-1")).await.unwrap();

    assert_eq!(info.iid.name_id, "web-1");
    assert!(!info.iid.system_id.is_empty());
    assert_eq!(info.image_iid.name_id, UBUNTU);
    assert_eq!(info.vpc_iid.name_id, "Default-VPC");
    assert_eq!(info.subnet_iid.name_id, "Default Network");
    assert_eq!(info.private_ip, "10.0.0.10");
    assert_eq!(info.public_ip, "203.0.113.10");
    assert_eq!(info.ssh_access_point, "203.0.113.10:22");
    assert_eq!(info.key_pair_iid.name_id, KEY_PAIR);
    assert_eq!(info.vm_user_id, "cb-user");
    assert_eq!(info.security_group_iids[0].name_id, "SSH");
    assert!(info.data_disk_iids.is_empty());

    assert_eq!(
        store.get(Namespace::SecurityGroup, "SSH").await.unwrap(),
        "web-1"
    );
    assert_eq!(fake.state.lock().unwrap().available_ips.len(), 2);
}

#[tokio::test]
async fn test_start_vm_with_data_disk() {
    let fake = FakeCloudit::seeded();
    fake.add_volume("data-1", 100);
    let vms = ClouditVmHandler::new(vm_context(fake.clone()).await);

    let mut req = request("web-1");
    req.data_disk_iids = vec![Iid::named("data-1")];
    let info = vms.start_vm(req).await.unwrap();

    let disks: Vec<&str> = info.data_disk_iids.iter().map(|d| d.name_id.as_str()).collect();
    assert_eq!(disks, vec!["data-1"]);
}

#[tokio::test]
async fn test_failure_after_public_ip_runs_the_cleaner() {
    let fake = FakeCloudit::seeded();
    let ctx = vm_context(fake.clone()).await;
    let store = ctx.store.clone();
    let vms = ClouditVmHandler::new(ctx);

    let mut req = request("web-1");
    req.data_disk_iids = vec![Iid::named("missing-disk")];
    let err = vms.start_vm(req).await.unwrap_err();

    assert!(matches!(err, CloudError::NotFound(_)));
    assert!(err.to_string().contains("missing-disk"));

    let calls = fake.calls();
    assert_eq!(fake.count("delete_adaptive_ip"), 1);
    assert_eq!(fake.count("delete_server"), 1);
    assert!(position(&calls, "create_adaptive_ip") < position(&calls, "delete_adaptive_ip"));
    assert!(position(&calls, "delete_adaptive_ip") < position(&calls, "delete_server"));

    {
        let state = fake.state.lock().unwrap();
        assert!(state.servers.is_empty());
        assert!(state.adaptive_ips.is_empty());
        assert_eq!(state.available_ips.len(), 3);
    }
    assert!(store.list(Namespace::SecurityGroup).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_boot_failure_terminates_the_server() {
    let fake = FakeCloudit::seeded();
    fake.state.lock().unwrap().boot_state = "FAILED".into();
    let vms = ClouditVmHandler::new(vm_context(fake.clone()).await);

    let err = vms.start_vm(request("web-1")).await.unwrap_err();

    assert!(matches!(err, CloudError::UpstreamError(_)));
    assert!(err.to_string().contains("boot VM 'web-1'"));
    assert_eq!(fake.count("create_server"), 1);
    assert_eq!(fake.count("delete_server"), 1);
    assert_eq!(fake.count("create_adaptive_ip"), 0);
    assert_eq!(fake.count("delete_adaptive_ip"), 0);
    assert!(fake.state.lock().unwrap().servers.is_empty());
}

#[tokio::test]
async fn test_boot_timeout_terminates_the_server() {
    let fake = FakeCloudit::seeded();
    fake.state.lock().unwrap().boot_state = "CREATING".into();
    let vms = ClouditVmHandler::new(vm_context(fake.clone()).await);

    let err = vms.start_vm(request("web-1")).await.unwrap_err();

    assert!(matches!(err, CloudError::TimeoutExceeded { attempts: 5, .. }));
    assert_eq!(fake.count("delete_server"), 1);
}

#[tokio::test]
async fn test_rejected_before_create() {
    let fake = FakeCloudit::seeded();
    fake.add_server("web-1", "10.0.0.0", "10.0.0.50");
    fake.state.lock().unwrap().templates.push(RawTemplate {
        id: "tpl-win".into(),
        name: "Windows-2019".into(),
        os: "Windows".into(),
        state: "AVAILABLE".into(),
        ..Default::default()
    });
    let vms = ClouditVmHandler::new(vm_context(fake.clone()).await);

    assert!(matches!(
        vms.start_vm(request("web-1")).await,
        Err(CloudError::AlreadyExists(_))
    ));

    let mut req = request("web-2");
    req.root_disk_size = "100".into();
    assert!(matches!(
        vms.start_vm(req).await,
        Err(CloudError::NotSupported(_))
    ));

    let mut req = request("web-2");
    req.vm_spec_name = "huge".into();
    assert!(matches!(
        vms.start_vm(req).await,
        Err(CloudError::NotFound(_))
    ));

    let mut req = request("win-1");
    req.image_iid = Iid::named("Windows-2019");
    assert!(matches!(
        vms.start_vm(req).await,
        Err(CloudError::InvalidArgument(_))
    ));

    let mut req = request("web-2");
    req.security_group_iids = vec![Iid::named("no-such-group")];
    assert!(matches!(
        vms.start_vm(req).await,
        Err(CloudError::NotFound(_))
    ));

    assert_eq!(fake.count("create_server"), 0);
}

#[tokio::test]
async fn test_missing_key_pair_rejected_before_create() {
    let fake = FakeCloudit::seeded();
    let vms = ClouditVmHandler::new(context(fake.clone()));

    let err = vms.start_vm(request("web-1")).await.unwrap_err();
    assert!(matches!(err, CloudError::NotFound(_)));
    assert!(err.to_string().contains(KEY_PAIR));

    let mut req = request("web-1");
    req.key_pair_iid = Iid::default();
    assert!(matches!(
        vms.start_vm(req).await,
        Err(CloudError::InvalidArgument(_))
    ));

    assert_eq!(fake.count("create_server"), 0);
    assert_eq!(fake.count("create_adaptive_ip"), 0);
}

#[tokio::test]
async fn test_no_public_ip_left() {
    let fake = FakeCloudit::seeded();
    fake.state.lock().unwrap().available_ips.clear();
    let vms = ClouditVmHandler::new(vm_context(fake.clone()).await);

    let err = vms.start_vm(request("web-1")).await.unwrap_err();
    assert!(matches!(err, CloudError::UpstreamError(_)));
    assert!(err.to_string().contains("no public IP"));
    assert_eq!(fake.count("create_server"), 0);
}

#[tokio::test]
async fn test_power_actions() {
    let fake = FakeCloudit::seeded();
    let vms = ClouditVmHandler::new(vm_context(fake.clone()).await);
    let info = vms.start_vm(request("web-1")).await.unwrap();

    assert_eq!(vms.suspend_vm(&info.iid).await.unwrap(), VmStatus::Suspended);
    assert_eq!(vms.get_vm_status(&info.iid).await.unwrap(), VmStatus::Suspended);
    assert!(matches!(
        vms.suspend_vm(&info.iid).await,
        Err(CloudError::InvalidState(_))
    ));
    assert!(matches!(
        vms.reboot_vm(&info.iid).await,
        Err(CloudError::InvalidState(_))
    ));

    assert_eq!(vms.resume_vm(&info.iid).await.unwrap(), VmStatus::Running);
    assert!(matches!(
        vms.resume_vm(&info.iid).await,
        Err(CloudError::InvalidState(_))
    ));
    assert_eq!(vms.reboot_vm(&info.iid).await.unwrap(), VmStatus::Running);
    assert_eq!(fake.count("server_action"), 3);
}

#[tokio::test]
async fn test_terminate_releases_public_ip() {
    let fake = FakeCloudit::seeded();
    let ctx = vm_context(fake.clone()).await;
    let store = ctx.store.clone();
    let vms = ClouditVmHandler::new(ctx);
    vms.start_vm(request("web-1")).await.unwrap();
    vms.start_vm(request("web-2")).await.unwrap();

    let statuses = vms.list_vm_status().await.unwrap();
    assert_eq!(statuses.len(), 2);
    assert!(statuses.iter().all(|s| s.vm_status == VmStatus::Running));

    assert_eq!(
        vms.terminate_vm(&Iid::named("web-1")).await.unwrap(),
        VmStatus::Terminated
    );
    assert_eq!(
        store.get(Namespace::SecurityGroup, "SSH").await.unwrap(),
        "web-2"
    );
    assert_eq!(fake.state.lock().unwrap().available_ips.len(), 2);

    let remaining = vms.list_vm().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].iid.name_id, "web-2");
    assert!(matches!(
        vms.get_vm(&Iid::named("web-1")).await,
        Err(CloudError::NotFound(_))
    ));
}
