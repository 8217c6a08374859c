//! In-memory znode store with real coordination-service semantics
//!
//! Backs reconciler tests with a faithful single-process model of the
//! remote namespace: parent checks, sequential suffixes, version-checked
//! conditional writes, and distinct non-empty-delete refusals. Clones
//! share state, so a test can keep a handle for inspection after moving a
//! clone into the reconciler.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use zk_store::{
    AclEntry, AclRule, ConnectionOptions, CreateFlags, Error, ExpectedVersion, NodeValue, Result,
    ZnodePath, ZnodeStore,
};

#[derive(Debug, Clone)]
struct NodeRecord {
    value: NodeValue,
    acls: Vec<AclEntry>,
    version: i32,
    ephemeral: bool,
}

impl NodeRecord {
    fn empty() -> Self {
        Self {
            value: NodeValue::empty(),
            acls: vec![AclEntry::world_anyone()],
            version: 0,
            ephemeral: false,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    nodes: BTreeMap<String, NodeRecord>,
    sequence: u64,
    offline: bool,
}

/// In-memory `ZnodeStore` implementation.
///
/// The namespace root exists from the start, like a real ensemble's. The
/// `offline` switch makes every subsequent call fail with
/// `Error::Unavailable`, for transport-failure propagation tests.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut state = State::default();
        state.nodes.insert("/".to_string(), NodeRecord::empty());
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Plant a node (creating parents) without going through `create`.
    pub fn seed(&self, path: &str, value: impl Into<NodeValue>) {
        let path = ZnodePath::parse(path).expect("seed path must be valid");
        let mut state = self.lock();
        let mut missing = Vec::new();
        let mut cursor = path.parent();
        while let Some(ancestor) = cursor {
            if state.nodes.contains_key(ancestor.as_str()) {
                break;
            }
            cursor = ancestor.parent();
            missing.push(ancestor);
        }
        for ancestor in missing.into_iter().rev() {
            state
                .nodes
                .insert(ancestor.as_str().to_string(), NodeRecord::empty());
        }
        let record = NodeRecord {
            value: value.into(),
            ..NodeRecord::empty()
        };
        state.nodes.insert(path.as_str().to_string(), record);
    }

    /// Replace a node's ACL set directly, for arranging drift.
    pub fn seed_acls(&self, path: &str, acls: Vec<AclEntry>) {
        let mut state = self.lock();
        let record = state
            .nodes
            .get_mut(path)
            .expect("seed_acls target must exist");
        record.acls = acls;
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().nodes.contains_key(path)
    }

    pub fn version_of(&self, path: &str) -> Option<i32> {
        self.lock().nodes.get(path).map(|record| record.version)
    }

    pub fn value_of(&self, path: &str) -> Option<NodeValue> {
        self.lock()
            .nodes
            .get(path)
            .map(|record| record.value.clone())
    }

    pub fn acls_of(&self, path: &str) -> Option<Vec<AclEntry>> {
        self.lock()
            .nodes
            .get(path)
            .map(|record| record.acls.clone())
    }

    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn is_ephemeral(&self, path: &str) -> Option<bool> {
        self.lock().nodes.get(path).map(|record| record.ephemeral)
    }

    /// Make every subsequent call fail with `Error::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// The digest entry `make_digest_acl` resolves a rule to, exposed so
    /// tests can build expected ACL sets without a store call.
    pub fn digest_entry(rule: &AclRule) -> AclEntry {
        let digest = Sha256::digest(format!("{}:{}", rule.username, rule.password));
        let id = format!("{}:{:x}", rule.username, digest);
        AclEntry::new("digest", id, rule.permissions())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory store lock poisoned")
    }

    fn check_online(state: &State) -> Result<()> {
        if state.offline {
            return Err(Error::unavailable("store is offline"));
        }
        Ok(())
    }

    fn child_names(state: &State, path: &ZnodePath) -> Vec<String> {
        let prefix = if path.is_root() {
            "/".to_string()
        } else {
            format!("{}/", path.as_str())
        };
        state
            .nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| {
                let rest = &key[prefix.len()..];
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect()
    }

    fn resolve_default_acls(conn: &ConnectionOptions) -> Vec<AclEntry> {
        if conn.default_acl.is_empty() {
            return vec![AclEntry::world_anyone()];
        }
        conn.default_acl.iter().map(Self::digest_entry).collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ZnodeStore for MemoryStore {
    fn exists(&self, path: &ZnodePath, _conn: &ConnectionOptions) -> Result<bool> {
        let state = self.lock();
        Self::check_online(&state)?;
        Ok(state.nodes.contains_key(path.as_str()))
    }

    fn get(&self, path: &ZnodePath, _conn: &ConnectionOptions) -> Result<NodeValue> {
        let state = self.lock();
        Self::check_online(&state)?;
        state
            .nodes
            .get(path.as_str())
            .map(|record| record.value.clone())
            .ok_or_else(|| Error::not_found(path.as_str()))
    }

    fn get_acls(&self, path: &ZnodePath, _conn: &ConnectionOptions) -> Result<Vec<AclEntry>> {
        let state = self.lock();
        Self::check_online(&state)?;
        state
            .nodes
            .get(path.as_str())
            .map(|record| record.acls.clone())
            .ok_or_else(|| Error::not_found(path.as_str()))
    }

    fn get_children(&self, path: &ZnodePath, _conn: &ConnectionOptions) -> Result<Vec<String>> {
        let state = self.lock();
        Self::check_online(&state)?;
        if !state.nodes.contains_key(path.as_str()) {
            return Err(Error::not_found(path.as_str()));
        }
        Ok(Self::child_names(&state, path))
    }

    fn make_digest_acl(&self, rule: &AclRule) -> Result<AclEntry> {
        let state = self.lock();
        Self::check_online(&state)?;
        Ok(Self::digest_entry(rule))
    }

    fn create(
        &self,
        path: &ZnodePath,
        value: &NodeValue,
        acls: &[AclEntry],
        flags: CreateFlags,
        conn: &ConnectionOptions,
    ) -> Result<ZnodePath> {
        let mut state = self.lock();
        Self::check_online(&state)?;

        let actual = if flags.sequential {
            let sequence = state.sequence;
            state.sequence += 1;
            ZnodePath::parse(format!("{}{:010}", path.as_str(), sequence))?
        } else {
            path.clone()
        };

        if state.nodes.contains_key(actual.as_str()) {
            return Err(Error::NodeExists {
                path: actual.as_str().to_string(),
            });
        }

        let mut missing = Vec::new();
        let mut cursor = actual.parent();
        while let Some(ancestor) = cursor {
            if state.nodes.contains_key(ancestor.as_str()) {
                break;
            }
            cursor = ancestor.parent();
            missing.push(ancestor);
        }
        if !missing.is_empty() && !flags.make_path {
            return Err(Error::ParentNotFound {
                path: actual.as_str().to_string(),
            });
        }
        for ancestor in missing.into_iter().rev() {
            state
                .nodes
                .insert(ancestor.as_str().to_string(), NodeRecord::empty());
        }

        let acls = if acls.is_empty() {
            Self::resolve_default_acls(conn)
        } else {
            acls.to_vec()
        };
        state.nodes.insert(
            actual.as_str().to_string(),
            NodeRecord {
                value: value.clone(),
                acls,
                version: 0,
                ephemeral: flags.ephemeral,
            },
        );
        Ok(actual)
    }

    fn set(
        &self,
        path: &ZnodePath,
        value: &NodeValue,
        expected: ExpectedVersion,
        _conn: &ConnectionOptions,
    ) -> Result<()> {
        let mut state = self.lock();
        Self::check_online(&state)?;
        let record = state
            .nodes
            .get_mut(path.as_str())
            .ok_or_else(|| Error::not_found(path.as_str()))?;
        if !expected.matches(record.version) {
            return Err(Error::VersionConflict {
                path: path.as_str().to_string(),
                expected: expected.as_raw(),
                actual: record.version,
            });
        }
        record.value = value.clone();
        record.version += 1;
        Ok(())
    }

    fn set_acls(
        &self,
        path: &ZnodePath,
        acls: &[AclEntry],
        expected: ExpectedVersion,
        _conn: &ConnectionOptions,
    ) -> Result<()> {
        let mut state = self.lock();
        Self::check_online(&state)?;
        let record = state
            .nodes
            .get_mut(path.as_str())
            .ok_or_else(|| Error::not_found(path.as_str()))?;
        if !expected.matches(record.version) {
            return Err(Error::VersionConflict {
                path: path.as_str().to_string(),
                expected: expected.as_raw(),
                actual: record.version,
            });
        }
        record.acls = acls.to_vec();
        record.version += 1;
        Ok(())
    }

    fn delete(
        &self,
        path: &ZnodePath,
        expected: ExpectedVersion,
        recursive: bool,
        _conn: &ConnectionOptions,
    ) -> Result<()> {
        let mut state = self.lock();
        Self::check_online(&state)?;
        let record = state
            .nodes
            .get(path.as_str())
            .ok_or_else(|| Error::not_found(path.as_str()))?;
        if !expected.matches(record.version) {
            return Err(Error::VersionConflict {
                path: path.as_str().to_string(),
                expected: expected.as_raw(),
                actual: record.version,
            });
        }
        let children = Self::child_names(&state, path);
        if !children.is_empty() && !recursive {
            return Err(Error::NonEmptyNode {
                path: path.as_str().to_string(),
                child_count: children.len(),
            });
        }
        let keys: Vec<String> = state
            .nodes
            .keys()
            .filter(|key| {
                key.as_str() == path.as_str()
                    || ZnodePath::parse(key)
                        .map(|candidate| path.is_ancestor_of(&candidate))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        for key in keys {
            state.nodes.remove(&key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn conn() -> ConnectionOptions {
        ConnectionOptions::default()
    }

    fn path(s: &str) -> ZnodePath {
        ZnodePath::parse(s).unwrap()
    }

    #[test]
    fn test_root_exists() {
        let store = MemoryStore::new();
        assert!(store.exists(&ZnodePath::root(), &conn()).unwrap());
    }

    #[test]
    fn test_create_requires_parent() {
        let store = MemoryStore::new();
        let err = store
            .create(
                &path("/a/b"),
                &NodeValue::from("v"),
                &[],
                CreateFlags::default(),
                &conn(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::ParentNotFound { .. }));
    }

    #[test]
    fn test_create_make_path_builds_chain() {
        let store = MemoryStore::new();
        let flags = CreateFlags {
            make_path: true,
            ..Default::default()
        };
        store
            .create(&path("/a/b/c"), &NodeValue::from("v"), &[], flags, &conn())
            .unwrap();
        assert!(store.contains("/a"));
        assert!(store.contains("/a/b"));
        assert_eq!(store.value_of("/a/b/c").unwrap(), NodeValue::from("v"));
    }

    #[test]
    fn test_create_duplicate_fails() {
        let store = MemoryStore::new();
        store.seed("/a", "v");
        let err = store
            .create(
                &path("/a"),
                &NodeValue::from("v"),
                &[],
                CreateFlags::default(),
                &conn(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::NodeExists { .. }));
    }

    #[test]
    fn test_sequential_create_suffixes_index() {
        let store = MemoryStore::new();
        store.seed("/queue", "");
        let flags = CreateFlags {
            sequential: true,
            ..Default::default()
        };
        let first = store
            .create(&path("/queue/item-"), &NodeValue::from("a"), &[], flags, &conn())
            .unwrap();
        let second = store
            .create(&path("/queue/item-"), &NodeValue::from("b"), &[], flags, &conn())
            .unwrap();
        assert_eq!(first.as_str(), "/queue/item-0000000000");
        assert_eq!(second.as_str(), "/queue/item-0000000001");
    }

    #[test]
    fn test_set_bumps_version_and_checks_expected() {
        let store = MemoryStore::new();
        store.seed("/a", "v1");
        assert_eq!(store.version_of("/a"), Some(0));

        store
            .set(&path("/a"), &NodeValue::from("v2"), ExpectedVersion::Exact(0), &conn())
            .unwrap();
        assert_eq!(store.version_of("/a"), Some(1));

        let err = store
            .set(&path("/a"), &NodeValue::from("v3"), ExpectedVersion::Exact(0), &conn())
            .unwrap_err();
        assert!(matches!(err, Error::VersionConflict { actual: 1, .. }));
    }

    #[test]
    fn test_delete_non_empty_requires_recursive() {
        let store = MemoryStore::new();
        store.seed("/a/b", "x");
        store.seed("/a/c", "y");

        let err = store
            .delete(&path("/a"), ExpectedVersion::Any, false, &conn())
            .unwrap_err();
        assert!(matches!(err, Error::NonEmptyNode { child_count: 2, .. }));

        store
            .delete(&path("/a"), ExpectedVersion::Any, true, &conn())
            .unwrap();
        assert!(!store.contains("/a"));
        assert!(!store.contains("/a/b"));
        assert!(!store.contains("/a/c"));
    }

    #[test]
    fn test_recursive_delete_spares_siblings() {
        let store = MemoryStore::new();
        store.seed("/app/a", "x");
        store.seed("/apple", "y");

        store
            .delete(&path("/app"), ExpectedVersion::Any, true, &conn())
            .unwrap();
        assert!(store.contains("/apple"));
    }

    #[test]
    fn test_get_children_direct_only() {
        let store = MemoryStore::new();
        store.seed("/a/b", "x");
        store.seed("/a/c/d", "y");

        let children = store.get_children(&path("/a"), &conn()).unwrap();
        assert_eq!(children, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_offline_fails_everything() {
        let store = MemoryStore::new();
        store.seed("/a", "v");
        store.set_offline(true);

        let err = store.exists(&path("/a"), &conn()).unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }));
    }

    #[test]
    fn test_digest_entry_is_deterministic_and_opaque() {
        let rule = AclRule::new("daniel", "test").with_all();
        let a = MemoryStore::digest_entry(&rule);
        let b = MemoryStore::digest_entry(&rule);
        assert_eq!(a, b);
        assert_eq!(a.scheme, "digest");
        assert!(a.id.starts_with("daniel:"));
        assert!(!a.id.contains("test"));
    }

    #[test]
    fn test_create_applies_connection_default_acl() {
        let store = MemoryStore::new();
        let conn = ConnectionOptions {
            default_acl: vec![AclRule::new("deploy", "secret").with_all()],
            ..Default::default()
        };
        store
            .create(&path("/a"), &NodeValue::from("v"), &[], CreateFlags::default(), &conn)
            .unwrap();

        let expected = MemoryStore::digest_entry(&AclRule::new("deploy", "secret").with_all());
        assert_eq!(store.acls_of("/a").unwrap(), vec![expected]);
    }
}
