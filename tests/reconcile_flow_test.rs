//! End-to-end reconciliation against a rooted workload directory.

use std::fs;
use std::path::Path;

use falcosidekick_operator::certificates::Reconciliation;
use falcosidekick_operator::charm::{
    EventContext, FalcosidekickOperator, StatefulOperator, Trigger, UnitStatus,
};
use falcosidekick_operator::config::loader::parse_snapshot;
use falcosidekick_operator::workload::{RootedFilesystem, WorkloadStorage};

mod common;

fn context_from(snapshot: &str) -> EventContext {
    EventContext::from_snapshot(&parse_snapshot(snapshot).unwrap()).unwrap()
}

#[test]
fn test_first_pass_writes_tls_material_and_config() {
    let workload = tempfile::tempdir().unwrap();
    let provider = tempfile::tempdir().unwrap();
    let (cert, key) = common::write_pair(provider.path(), common::CERT, common::KEY);
    let context = context_from(&common::related_snapshot(2801, &cert, &key));

    let mut operator = FalcosidekickOperator::new(RootedFilesystem::new(workload.path()));
    let report = operator.reconcile(Trigger::ConfigChanged, &context).unwrap();

    assert_eq!(report.status, UnitStatus::Active);
    assert_eq!(report.certificates, Some(Reconciliation::Changed));
    assert!(report.restart_required);

    let root = workload.path();
    assert_eq!(
        fs::read_to_string(root.join("etc/falcosidekick/certs/server/server.crt")).unwrap(),
        common::CERT
    );
    assert_eq!(
        fs::read_to_string(root.join("etc/falcosidekick/certs/server/server.key")).unwrap(),
        common::KEY
    );

    let config = fs::read_to_string(root.join("etc/falcosidekick/falcosidekick.yaml")).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&config).unwrap();
    assert_eq!(doc["listenport"], serde_yaml::Value::from(2801));
    assert_eq!(doc["tlsserver"]["notlsport"], serde_yaml::Value::from(2810));
    assert_eq!(doc["loki"]["hostport"], serde_yaml::Value::from("http://loki:3100"));

    let request = report.certificate_request.unwrap();
    assert_eq!(request.sans_ip, ["10.1.0.7", "10.152.183.20"]);
    assert_eq!(request.sans_dns, ["falcosidekick-0.falcosidekick-endpoints"]);
}

#[test]
fn test_repeated_pass_is_idempotent() {
    let workload = tempfile::tempdir().unwrap();
    let provider = tempfile::tempdir().unwrap();
    let (cert, key) = common::write_pair(provider.path(), common::CERT, common::KEY);
    let context = context_from(&common::related_snapshot(2801, &cert, &key));

    let mut operator = FalcosidekickOperator::new(RootedFilesystem::new(workload.path()));
    operator.reconcile(Trigger::ConfigChanged, &context).unwrap();
    let crt_path = workload.path().join("etc/falcosidekick/certs/server/server.crt");
    let first_modified = fs::metadata(&crt_path).unwrap().modified().unwrap();

    let report = operator.reconcile(Trigger::PebbleReady, &context).unwrap();

    assert_eq!(report.certificates, Some(Reconciliation::Unchanged));
    assert!(!report.restart_required);
    assert_eq!(fs::metadata(&crt_path).unwrap().modified().unwrap(), first_modified);
}

#[test]
fn test_rotated_key_is_picked_up() {
    let workload = tempfile::tempdir().unwrap();
    let provider = tempfile::tempdir().unwrap();
    let (cert, key) = common::write_pair(provider.path(), common::CERT, common::KEY);
    let initial = context_from(&common::related_snapshot(2801, &cert, &key));
    let mut operator = FalcosidekickOperator::new(RootedFilesystem::new(workload.path()));
    operator.reconcile(Trigger::ConfigChanged, &initial).unwrap();

    let (cert, key) = common::write_pair(provider.path(), common::CERT, common::ROTATED_KEY);
    let rotated = context_from(&common::related_snapshot(2801, &cert, &key));
    let report = operator.reconcile(Trigger::RelationChanged, &rotated).unwrap();

    assert_eq!(report.certificates, Some(Reconciliation::Changed));
    assert!(report.restart_required);
    let stored_key = workload.path().join("etc/falcosidekick/certs/server/server.key");
    assert_eq!(fs::read_to_string(stored_key).unwrap(), common::ROTATED_KEY);
}

#[test]
fn test_port_change_restarts_without_touching_certificates() {
    let workload = tempfile::tempdir().unwrap();
    let provider = tempfile::tempdir().unwrap();
    let (cert, key) = common::write_pair(provider.path(), common::ROTATED_CERT, common::KEY);
    let initial = context_from(&common::related_snapshot(2801, &cert, &key));
    let mut operator = FalcosidekickOperator::new(RootedFilesystem::new(workload.path()));
    operator.reconcile(Trigger::ConfigChanged, &initial).unwrap();

    let moved = context_from(&common::related_snapshot(8080, &cert, &key));
    let report = operator.reconcile(Trigger::ConfigChanged, &moved).unwrap();

    assert_eq!(report.certificates, Some(Reconciliation::Unchanged));
    assert!(report.restart_required);
    assert_eq!(report.http_endpoint.unwrap().listen_port, 8080);
}

#[test]
fn test_invalid_port_writes_nothing() {
    let workload = tempfile::tempdir().unwrap();
    let provider = tempfile::tempdir().unwrap();
    let (cert, key) = common::write_pair(provider.path(), common::CERT, common::KEY);
    let context = context_from(&common::related_snapshot(65536, &cert, &key));

    let mut operator = FalcosidekickOperator::new(RootedFilesystem::new(workload.path()));
    let report = operator.reconcile(Trigger::ConfigChanged, &context).unwrap();

    assert_eq!(report.status, UnitStatus::Blocked("Invalid charm configuration: port".into()));
    assert!(!operator.storage().exists(Path::new("/etc/falcosidekick")).unwrap());
}

#[test]
fn test_missing_workload_root_waits() {
    let workload = tempfile::tempdir().unwrap();
    let provider = tempfile::tempdir().unwrap();
    let (cert, key) = common::write_pair(provider.path(), common::CERT, common::KEY);
    let context = context_from(&common::related_snapshot(2801, &cert, &key));

    let mut operator =
        FalcosidekickOperator::new(RootedFilesystem::new(workload.path().join("unmounted")));
    let report = operator.reconcile(Trigger::PebbleReady, &context).unwrap();

    assert_eq!(report.status, UnitStatus::Waiting("Workload not ready".into()));
}

#[test]
fn test_without_relations_is_blocked_on_loki() {
    let workload = tempfile::tempdir().unwrap();
    let context = context_from("[options]\nport = 2801\n");

    let mut operator = FalcosidekickOperator::new(RootedFilesystem::new(workload.path()));
    let report = operator.reconcile(Trigger::ConfigChanged, &context).unwrap();

    assert_eq!(
        report.status,
        UnitStatus::Blocked("Required relations: [send-loki-logs]".into())
    );
}
