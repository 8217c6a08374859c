//! Call-recording store wrapper

use std::sync::{Arc, Mutex};

use zk_store::{
    AclEntry, AclRule, ConnectionOptions, CreateFlags, ExpectedVersion, NodeValue, Result,
    ZnodePath, ZnodeStore,
};

/// Delegating `ZnodeStore` wrapper that records operation names in call
/// order. Lets tests assert which store operations an invocation issued —
/// in particular that dry runs and early failures issue no mutations.
#[derive(Debug, Clone)]
pub struct RecordingStore<S> {
    inner: S,
    calls: Arc<Mutex<Vec<String>>>,
}

impl<S> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Operation names recorded so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log lock poisoned").clone()
    }

    pub fn clear(&self) {
        self.calls.lock().expect("call log lock poisoned").clear();
    }

    /// Whether any mutating operation was recorded.
    pub fn mutated(&self) -> bool {
        self.calls()
            .iter()
            .any(|op| matches!(op.as_str(), "create" | "set" | "set_acls" | "delete"))
    }

    fn record(&self, op: &str) {
        self.calls
            .lock()
            .expect("call log lock poisoned")
            .push(op.to_string());
    }
}

impl<S: ZnodeStore> ZnodeStore for RecordingStore<S> {
    fn exists(&self, path: &ZnodePath, conn: &ConnectionOptions) -> Result<bool> {
        self.record("exists");
        self.inner.exists(path, conn)
    }

    fn get(&self, path: &ZnodePath, conn: &ConnectionOptions) -> Result<NodeValue> {
        self.record("get");
        self.inner.get(path, conn)
    }

    fn get_acls(&self, path: &ZnodePath, conn: &ConnectionOptions) -> Result<Vec<AclEntry>> {
        self.record("get_acls");
        self.inner.get_acls(path, conn)
    }

    fn get_children(&self, path: &ZnodePath, conn: &ConnectionOptions) -> Result<Vec<String>> {
        self.record("get_children");
        self.inner.get_children(path, conn)
    }

    fn make_digest_acl(&self, rule: &AclRule) -> Result<AclEntry> {
        self.record("make_digest_acl");
        self.inner.make_digest_acl(rule)
    }

    fn create(
        &self,
        path: &ZnodePath,
        value: &NodeValue,
        acls: &[AclEntry],
        flags: CreateFlags,
        conn: &ConnectionOptions,
    ) -> Result<ZnodePath> {
        self.record("create");
        self.inner.create(path, value, acls, flags, conn)
    }

    fn set(
        &self,
        path: &ZnodePath,
        value: &NodeValue,
        expected: ExpectedVersion,
        conn: &ConnectionOptions,
    ) -> Result<()> {
        self.record("set");
        self.inner.set(path, value, expected, conn)
    }

    fn set_acls(
        &self,
        path: &ZnodePath,
        acls: &[AclEntry],
        expected: ExpectedVersion,
        conn: &ConnectionOptions,
    ) -> Result<()> {
        self.record("set_acls");
        self.inner.set_acls(path, acls, expected, conn)
    }

    fn delete(
        &self,
        path: &ZnodePath,
        expected: ExpectedVersion,
        recursive: bool,
        conn: &ConnectionOptions,
    ) -> Result<()> {
        self.record("delete");
        self.inner.delete(path, expected, recursive, conn)
    }
}
