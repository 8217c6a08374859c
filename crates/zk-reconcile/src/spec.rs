//! Desired-state specification for a single znode

use serde::{Deserialize, Serialize};
use zk_store::{AclRule, CreateFlags, ExpectedVersion, NodeValue, ZnodePath};

/// The desired state of one znode: its value, its ACL set, and how to
/// create it if it is missing.
///
/// The path is stable identity; value and ACLs are the mutable payload.
/// An empty `acls` list means the ACL dimension is unmanaged: existing
/// ACLs are never compared and never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub path: ZnodePath,
    pub value: NodeValue,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acls: Vec<AclRule>,

    #[serde(default)]
    pub ephemeral: bool,

    #[serde(default)]
    pub sequential: bool,

    /// Create missing parents on the create path
    #[serde(default)]
    pub create_parents: bool,

    /// Version conditional updates must match
    #[serde(default)]
    pub expected_version: ExpectedVersion,
}

impl NodeSpec {
    pub fn new(path: ZnodePath, value: impl Into<NodeValue>) -> Self {
        Self {
            path,
            value: value.into(),
            acls: Vec::new(),
            ephemeral: false,
            sequential: false,
            create_parents: false,
            expected_version: ExpectedVersion::Any,
        }
    }

    pub fn with_acls(mut self, acls: Vec<AclRule>) -> Self {
        self.acls = acls;
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    pub fn sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    pub fn create_parents(mut self, create_parents: bool) -> Self {
        self.create_parents = create_parents;
        self
    }

    pub fn expected_version(mut self, expected: ExpectedVersion) -> Self {
        self.expected_version = expected;
        self
    }

    /// Whether this spec manages the node's ACL set at all.
    pub fn manages_acls(&self) -> bool {
        !self.acls.is_empty()
    }

    /// Creation flags for the create path.
    pub fn create_flags(&self) -> CreateFlags {
        CreateFlags {
            ephemeral: self.ephemeral,
            sequential: self.sequential,
            make_path: self.create_parents,
        }
    }
}

/// Request to remove a znode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsentSpec {
    pub path: ZnodePath,

    /// Version a conditional delete must match
    #[serde(default)]
    pub expected_version: ExpectedVersion,

    /// Delete the whole subtree instead of failing on children
    #[serde(default)]
    pub recursive: bool,
}

impl AbsentSpec {
    pub fn new(path: ZnodePath) -> Self {
        Self {
            path,
            expected_version: ExpectedVersion::Any,
            recursive: false,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn expected_version(mut self, expected: ExpectedVersion) -> Self {
        self.expected_version = expected;
        self
    }
}

/// Request to converge only a znode's ACL set, leaving the value alone.
///
/// Unlike [`NodeSpec`], the target here is always managed; ACL updates on
/// a missing node fail rather than create it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclUpdateSpec {
    pub path: ZnodePath,
    pub rules: Vec<AclRule>,

    #[serde(default)]
    pub expected_version: ExpectedVersion,
}

impl AclUpdateSpec {
    /// Accepts a single rule or a list, per the declarative input shape.
    pub fn new(path: ZnodePath, rules: impl Into<zk_store::AclRuleset>) -> Self {
        Self {
            path,
            rules: rules.into().into_rules(),
            expected_version: ExpectedVersion::Any,
        }
    }

    pub fn expected_version(mut self, expected: ExpectedVersion) -> Self {
        self.expected_version = expected;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let spec = NodeSpec::new(ZnodePath::parse("/app").unwrap(), "v1");
        assert!(!spec.manages_acls());
        assert_eq!(spec.expected_version, ExpectedVersion::Any);
        assert_eq!(spec.create_flags(), CreateFlags::default());
    }

    #[test]
    fn test_builder_flags_thread_through() {
        let spec = NodeSpec::new(ZnodePath::parse("/app").unwrap(), "v1")
            .ephemeral(true)
            .sequential(true)
            .create_parents(true)
            .expected_version(ExpectedVersion::Exact(2));

        let flags = spec.create_flags();
        assert!(flags.ephemeral && flags.sequential && flags.make_path);
        assert_eq!(spec.expected_version, ExpectedVersion::Exact(2));
    }

    #[test]
    fn test_with_acls_marks_managed() {
        let spec = NodeSpec::new(ZnodePath::parse("/app").unwrap(), "v1")
            .with_acls(vec![AclRule::new("daniel", "test").with_all()]);
        assert!(spec.manages_acls());
    }

    #[test]
    fn test_acl_update_spec_accepts_one_or_many() {
        let path = ZnodePath::parse("/app").unwrap();
        let one = AclUpdateSpec::new(path.clone(), AclRule::new("daniel", "test"));
        let many = AclUpdateSpec::new(
            path,
            vec![
                AclRule::new("daniel", "test"),
                AclRule::new("gtmanfred", "test"),
            ],
        );
        assert_eq!(one.rules.len(), 1);
        assert_eq!(many.rules.len(), 2);
    }
}
