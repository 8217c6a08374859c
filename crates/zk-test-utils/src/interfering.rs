//! Store wrapper simulating a concurrent writer

use std::sync::{Arc, Mutex};

use zk_store::{
    AclEntry, AclRule, ConnectionOptions, CreateFlags, ExpectedVersion, NodeValue, Result,
    ZnodePath, ZnodeStore,
};

#[derive(Debug, Default)]
struct Interference {
    value: Option<NodeValue>,
    acls: Option<Vec<AclEntry>>,
    triggered: bool,
}

/// Delegating `ZnodeStore` wrapper that models a concurrent writer
/// slipping in between a successful mutation and its read-back.
///
/// Writes go through to the inner store and succeed; once any mutation
/// has happened, subsequent `get`/`get_acls` calls return the configured
/// overwrite instead of the real data. Lets tests reach the
/// read-back-mismatch failure mode, which a consistent store never
/// exhibits.
#[derive(Debug, Clone)]
pub struct InterferingStore<S> {
    inner: S,
    state: Arc<Mutex<Interference>>,
}

impl<S> InterferingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            state: Arc::new(Mutex::new(Interference::default())),
        }
    }

    /// Have reads report this value once a mutation has gone through.
    pub fn overwrite_value_with(self, value: impl Into<NodeValue>) -> Self {
        self.lock().value = Some(value.into());
        self
    }

    /// Have reads report this ACL set once a mutation has gone through.
    pub fn overwrite_acls_with(self, acls: Vec<AclEntry>) -> Self {
        self.lock().acls = Some(acls);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Interference> {
        self.state.lock().expect("interference lock poisoned")
    }

    fn mark_mutated(&self) {
        self.lock().triggered = true;
    }
}

impl<S: ZnodeStore> ZnodeStore for InterferingStore<S> {
    fn exists(&self, path: &ZnodePath, conn: &ConnectionOptions) -> Result<bool> {
        self.inner.exists(path, conn)
    }

    fn get(&self, path: &ZnodePath, conn: &ConnectionOptions) -> Result<NodeValue> {
        let real = self.inner.get(path, conn)?;
        let state = self.lock();
        match &state.value {
            Some(overwrite) if state.triggered => Ok(overwrite.clone()),
            _ => Ok(real),
        }
    }

    fn get_acls(&self, path: &ZnodePath, conn: &ConnectionOptions) -> Result<Vec<AclEntry>> {
        let real = self.inner.get_acls(path, conn)?;
        let state = self.lock();
        match &state.acls {
            Some(overwrite) if state.triggered => Ok(overwrite.clone()),
            _ => Ok(real),
        }
    }

    fn get_children(&self, path: &ZnodePath, conn: &ConnectionOptions) -> Result<Vec<String>> {
        self.inner.get_children(path, conn)
    }

    fn make_digest_acl(&self, rule: &AclRule) -> Result<AclEntry> {
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
        let created = self.inner.create(path, value, acls, flags, conn)?;
        self.mark_mutated();
        Ok(created)
    }

    fn set(
        &self,
        path: &ZnodePath,
        value: &NodeValue,
        expected: ExpectedVersion,
        conn: &ConnectionOptions,
    ) -> Result<()> {
        self.inner.set(path, value, expected, conn)?;
        self.mark_mutated();
        Ok(())
    }

    fn set_acls(
        &self,
        path: &ZnodePath,
        acls: &[AclEntry],
        expected: ExpectedVersion,
        conn: &ConnectionOptions,
    ) -> Result<()> {
        self.inner.set_acls(path, acls, expected, conn)?;
        self.mark_mutated();
        Ok(())
    }

    fn delete(
        &self,
        path: &ZnodePath,
        expected: ExpectedVersion,
        recursive: bool,
        conn: &ConnectionOptions,
    ) -> Result<()> {
        self.inner.delete(path, expected, recursive, conn)?;
        self.mark_mutated();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use pretty_assertions::assert_eq;

    fn conn() -> ConnectionOptions {
        ConnectionOptions::default()
    }

    fn path(s: &str) -> ZnodePath {
        ZnodePath::parse(s).unwrap()
    }

    #[test]
    fn test_reads_are_truthful_before_any_mutation() {
        let inner = MemoryStore::new();
        inner.seed("/a", "real");
        let store = InterferingStore::new(inner).overwrite_value_with("fake");

        assert_eq!(store.get(&path("/a"), &conn()).unwrap(), NodeValue::from("real"));
    }

    #[test]
    fn test_reads_lie_after_a_write() {
        let inner = MemoryStore::new();
        inner.seed("/a", "real");
        let store = InterferingStore::new(inner.clone()).overwrite_value_with("fake");

        store
            .set(&path("/a"), &NodeValue::from("v2"), ExpectedVersion::Any, &conn())
            .unwrap();

        // The write itself landed in the inner store
        assert_eq!(inner.value_of("/a"), Some(NodeValue::from("v2")));
        // But the read-back reports the interfering writer's data
        assert_eq!(store.get(&path("/a"), &conn()).unwrap(), NodeValue::from("fake"));
    }

    #[test]
    fn test_unconfigured_dimensions_stay_truthful() {
        let inner = MemoryStore::new();
        inner.seed("/a", "real");
        let store = InterferingStore::new(inner).overwrite_acls_with(vec![]);

        store
            .set(&path("/a"), &NodeValue::from("v2"), ExpectedVersion::Any, &conn())
            .unwrap();

        assert_eq!(store.get(&path("/a"), &conn()).unwrap(), NodeValue::from("v2"));
        assert_eq!(store.get_acls(&path("/a"), &conn()).unwrap(), vec![]);
    }
}
