//! Connection profile resolution threaded through the reconciler

use pretty_assertions::assert_eq;
use zk_reconcile::{NodeSpec, Reconciler};
use zk_store::{AclRule, ProfileSet, ZnodePath};
use zk_test_utils::MemoryStore;

const PROFILES: &str = r#"
[defaults]
hosts = ["127.0.0.1:2181"]
scheme = "digest"

[profiles.prod]
hosts = ["zk1:2181", "zk2:2181", "zk3:2181"]
username = "deploy"
password = "hunter2"

[[profiles.prod.default_acl]]
username = "deploy"
password = "hunter2"
all = true
"#;

#[test]
fn test_profile_resolution_layers_defaults() {
    let profiles = ProfileSet::parse(PROFILES).unwrap();
    let prod = profiles.resolve("prod").unwrap();

    assert_eq!(prod.profile.as_deref(), Some("prod"));
    assert_eq!(prod.scheme.as_deref(), Some("digest"));
    assert_eq!(prod.hosts.len(), 3);
    assert_eq!(prod.default_acl.len(), 1);
}

#[test]
fn test_default_acl_applies_to_unmanaged_creates() {
    let profiles = ProfileSet::parse(PROFILES).unwrap();
    let prod = profiles.resolve("prod").unwrap();

    let store = MemoryStore::new();
    let engine = Reconciler::new(Box::new(store.clone()), prod);

    // Spec manages no ACLs, so the connection's default ACL lands on
    // the created node
    let spec = NodeSpec::new(ZnodePath::parse("/service").unwrap(), "up");
    let outcome = engine.present(&spec).unwrap();

    assert!(outcome.success);
    let expected = MemoryStore::digest_entry(&AclRule::new("deploy", "hunter2").with_all());
    assert_eq!(store.acls_of("/service").unwrap(), vec![expected]);
}

#[test]
fn test_unknown_profile_is_an_error() {
    let profiles = ProfileSet::parse(PROFILES).unwrap();
    assert!(profiles.resolve("staging").is_err());
}
