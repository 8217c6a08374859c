//! The znode store capability interface
//!
//! Everything that actually talks to a coordination service sits behind
//! `ZnodeStore`. The reconciler only ever sees this trait; session
//! management, watches, retries, and the wire protocol are the
//! implementation's business.

use serde::{Deserialize, Serialize};

use crate::acl::{AclEntry, AclRule};
use crate::conn::ConnectionOptions;
use crate::error::Result;
use crate::path::ZnodePath;
use crate::value::NodeValue;
use crate::version::ExpectedVersion;

/// Creation flags for a new znode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFlags {
    /// Remove the node automatically when the creating session ends
    #[serde(default)]
    pub ephemeral: bool,
    /// Suffix the final path segment with a store-assigned index
    #[serde(default)]
    pub sequential: bool,
    /// Create missing parent nodes instead of failing
    #[serde(default)]
    pub make_path: bool,
}

/// Capability interface to a remote hierarchical key store.
///
/// Every operation threads `ConnectionOptions` through untouched. Errors
/// use the `zk_store::Error` taxonomy; in particular `set` and `delete`
/// fail with `VersionConflict` on a moved version, and `delete` fails with
/// `NonEmptyNode` when the node has children and `recursive` is false.
pub trait ZnodeStore: Send + Sync {
    /// Whether a node exists at `path`.
    fn exists(&self, path: &ZnodePath, conn: &ConnectionOptions) -> Result<bool>;

    /// Read the node's value.
    fn get(&self, path: &ZnodePath, conn: &ConnectionOptions) -> Result<NodeValue>;

    /// Read the node's ACL set.
    fn get_acls(&self, path: &ZnodePath, conn: &ConnectionOptions) -> Result<Vec<AclEntry>>;

    /// List the node's direct children by name.
    fn get_children(&self, path: &ZnodePath, conn: &ConnectionOptions) -> Result<Vec<String>>;

    /// Resolve a declarative rule into a digest-credential ACL entry.
    fn make_digest_acl(&self, rule: &AclRule) -> Result<AclEntry>;

    /// Create a node and return the path actually created.
    ///
    /// Sequential creates suffix the final segment with a store-assigned
    /// index, so the returned path is the one to verify against.
    fn create(
        &self,
        path: &ZnodePath,
        value: &NodeValue,
        acls: &[AclEntry],
        flags: CreateFlags,
        conn: &ConnectionOptions,
    ) -> Result<ZnodePath>;

    /// Conditionally overwrite the node's value.
    fn set(
        &self,
        path: &ZnodePath,
        value: &NodeValue,
        expected: ExpectedVersion,
        conn: &ConnectionOptions,
    ) -> Result<()>;

    /// Conditionally overwrite the node's ACL set.
    fn set_acls(
        &self,
        path: &ZnodePath,
        acls: &[AclEntry],
        expected: ExpectedVersion,
        conn: &ConnectionOptions,
    ) -> Result<()>;

    /// Conditionally delete the node, and its subtree when `recursive`.
    fn delete(
        &self,
        path: &ZnodePath,
        expected: ExpectedVersion,
        recursive: bool,
        conn: &ConnectionOptions,
    ) -> Result<()>;
}
