//! End-to-end reconciliation flows against the in-memory store

use pretty_assertions::assert_eq;
use zk_reconcile::{AbsentSpec, AclUpdateSpec, NodeSpec, ReconcileOptions, Reconciler};
use zk_store::{AclRule, ConnectionOptions, ExpectedVersion, NodeValue, ZnodePath};
use zk_test_utils::{MemoryStore, RecordingStore};

fn path(s: &str) -> ZnodePath {
    ZnodePath::parse(s).unwrap()
}

#[test]
fn test_full_node_lifecycle() {
    let store = MemoryStore::new();
    let engine = Reconciler::new(Box::new(store.clone()), ConnectionOptions::default());
    let admin = AclRule::new("admin", "secret").with_all();

    // Create with parents and managed ACLs
    let spec = NodeSpec::new(path("/app/config/flag"), "enabled")
        .create_parents(true)
        .with_acls(vec![admin.clone()]);
    let outcome = engine.present(&spec).unwrap();
    assert!(outcome.success);

    // Converged state is a no-op
    let outcome = engine.present(&spec).unwrap();
    assert!(outcome.success);
    assert!(outcome.changes.is_empty());

    // Drift the value, reconcile back
    store.seed("/app/config/flag", "tampered");
    store.seed_acls(
        "/app/config/flag",
        vec![MemoryStore::digest_entry(&admin)],
    );
    let outcome = engine.present(&spec).unwrap();
    assert!(outcome.success);
    assert_eq!(
        outcome.changes.old.unwrap().value,
        Some(NodeValue::from("tampered"))
    );

    // Rotate the ACLs alone
    let rotated = AclRule::new("admin", "rotated").with_all();
    let outcome = engine
        .acls(&AclUpdateSpec::new(path("/app/config/flag"), rotated.clone()))
        .unwrap();
    assert!(outcome.success);
    assert_eq!(
        store.acls_of("/app/config/flag").unwrap(),
        vec![MemoryStore::digest_entry(&rotated)]
    );

    // Tear the subtree down
    let outcome = engine
        .absent(&AbsentSpec::new(path("/app")).recursive(true))
        .unwrap();
    assert!(outcome.success);
    assert!(!store.contains("/app/config/flag"));
    assert_eq!(
        outcome.changes.old.unwrap().children,
        Some(vec!["config".to_string()])
    );
}

#[test]
fn test_dry_run_plan_then_apply() {
    let store = MemoryStore::new();
    store.seed("/app/flag", "off");
    let recording = RecordingStore::new(store.clone());
    let engine = Reconciler::new(Box::new(recording.clone()), ConnectionOptions::default());
    let dry = ReconcileOptions { dry_run: true };
    let spec = NodeSpec::new(path("/app/flag"), "on");

    // Plan: pending outcome, reads only
    let planned = engine.present_with_options(&spec, dry).unwrap();
    assert!(planned.pending);
    assert!(!recording.mutated());

    // Apply: the decision matches the plan
    recording.clear();
    let applied = engine.present(&spec).unwrap();
    assert!(applied.success);
    assert_eq!(planned.changes.old, applied.changes.old);
    assert_eq!(
        applied.changes.new.as_ref().unwrap().value,
        Some(NodeValue::from("on"))
    );
    assert!(recording.calls().contains(&"set".to_string()));
}

#[test]
fn test_conditional_delete_retry_with_recursive() {
    let store = MemoryStore::new();
    store.seed("/jobs/a", "1");
    store.seed("/jobs/b", "2");
    let engine = Reconciler::new(Box::new(store.clone()), ConnectionOptions::default());

    // First attempt refuses distinctly: the node still has children
    let outcome = engine.absent(&AbsentSpec::new(path("/jobs"))).unwrap();
    assert!(!outcome.success);
    assert!(outcome.message.contains("children"));

    // Caller decides to retry recursively
    let outcome = engine
        .absent(&AbsentSpec::new(path("/jobs")).recursive(true))
        .unwrap();
    assert!(outcome.success);
    assert_eq!(store.contains("/jobs"), false);
}

#[test]
fn test_interleaved_writer_surfaces_version_conflict() {
    let store = MemoryStore::new();
    store.seed("/leader", "node-1");
    let engine = Reconciler::new(Box::new(store.clone()), ConnectionOptions::default());

    // Another writer bumps the version between our read and our write
    let other = Reconciler::new(Box::new(store.clone()), ConnectionOptions::default());
    other.present(&NodeSpec::new(path("/leader"), "node-2")).unwrap();
    assert_eq!(store.version_of("/leader"), Some(1));

    let stale = NodeSpec::new(path("/leader"), "node-3")
        .expected_version(ExpectedVersion::Exact(0));
    let outcome = engine.present(&stale).unwrap();

    assert!(!outcome.success);
    assert!(outcome.message.contains("Version conflict"));
    assert_eq!(store.value_of("/leader"), Some(NodeValue::from("node-2")));
}

#[test]
fn test_outcome_serializes_for_host_runtime() {
    let store = MemoryStore::new();
    store.seed("/a", "v1");
    let engine = Reconciler::new(Box::new(store.clone()), ConnectionOptions::default());

    let outcome = engine.present(&NodeSpec::new(path("/a"), "v2")).unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["path"], "/a");
    assert_eq!(json["success"], true);
    assert_eq!(json["pending"], false);
    assert_eq!(json["changes"]["old"]["value"], "v1");
    assert_eq!(json["changes"]["new"]["value"], "v2");
    // Untouched dimensions never appear in the diff
    assert!(json["changes"]["old"].get("acls").is_none());
}
