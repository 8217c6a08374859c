//! Structured outcome reporting for reconciliation operations

use serde::{Deserialize, Serialize};
use zk_store::{AclEntry, NodeValue};

/// Partial snapshot of a node, carrying only the fields an operation
/// touched or observed. Untouched fields stay `None` and are omitted from
/// serialized output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NodeValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acls: Option<Vec<AclEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
}

impl NodePatch {
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.acls.is_none() && self.children.is_none()
    }

    pub fn with_value(mut self, value: NodeValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_acls(mut self, acls: Vec<AclEntry>) -> Self {
        self.acls = Some(acls);
        self
    }

    pub fn with_children(mut self, children: Vec<String>) -> Self {
        self.children = Some(children);
        self
    }
}

/// Before/after diff attached to an outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<NodePatch>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<NodePatch>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.old.as_ref().is_none_or(NodePatch::is_empty)
            && self.new.as_ref().is_none_or(NodePatch::is_empty)
    }

    pub fn old(mut self, patch: NodePatch) -> Self {
        self.old = Some(patch);
        self
    }

    pub fn new_state(mut self, patch: NodePatch) -> Self {
        self.new = Some(patch);
        self
    }
}

/// Report from one reconciliation operation.
///
/// `pending` marks a dry-run decision: the operation found drift and would
/// have mutated, but did not. A pending outcome is never also a success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    /// The path the operation targeted
    pub path: String,
    /// Whether remote state converged to (or already matched) the desired state
    pub success: bool,
    /// Dry-run indicator: drift found, mutation withheld
    pub pending: bool,
    /// Human-readable summary
    pub message: String,
    /// Before/after diff of the touched fields
    #[serde(default, skip_serializing_if = "ChangeSet::is_empty")]
    pub changes: ChangeSet,
}

impl ReconcileOutcome {
    /// A converged or already-correct result.
    pub fn success(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            success: true,
            pending: false,
            message: message.into(),
            changes: ChangeSet::default(),
        }
    }

    /// A dry-run result: changes describe what would happen.
    pub fn pending(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            success: false,
            pending: true,
            message: message.into(),
            changes: ChangeSet::default(),
        }
    }

    /// A failed convergence.
    pub fn failure(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            success: false,
            pending: false,
            message: message.into(),
            changes: ChangeSet::default(),
        }
    }

    pub fn with_changes(mut self, changes: ChangeSet) -> Self {
        self.changes = changes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zk_store::{AclEntry, Permissions};

    #[test]
    fn test_success_outcome_has_no_changes() {
        let outcome = ReconcileOutcome::success("/a", "already correct");
        assert!(outcome.success);
        assert!(!outcome.pending);
        assert!(outcome.changes.is_empty());
    }

    #[test]
    fn test_pending_is_not_success() {
        let outcome = ReconcileOutcome::pending("/a", "would update");
        assert!(outcome.pending);
        assert!(!outcome.success);
    }

    #[test]
    fn test_changeset_empty_detection() {
        assert!(ChangeSet::default().is_empty());
        assert!(
            ChangeSet::default()
                .old(NodePatch::default())
                .new_state(NodePatch::default())
                .is_empty()
        );
        assert!(
            !ChangeSet::default()
                .new_state(NodePatch::default().with_value(NodeValue::from("v1")))
                .is_empty()
        );
    }

    #[test]
    fn test_untouched_fields_omitted_from_json() {
        let outcome = ReconcileOutcome::pending("/a", "would update").with_changes(
            ChangeSet::default()
                .old(NodePatch::default().with_value(NodeValue::from("v1")))
                .new_state(NodePatch::default().with_value(NodeValue::from("v2"))),
        );

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["changes"]["old"]["value"], "v1");
        assert_eq!(json["changes"]["new"]["value"], "v2");
        assert!(json["changes"]["old"].get("acls").is_none());
    }

    #[test]
    fn test_acl_patch_serializes_entries() {
        let patch = NodePatch::default()
            .with_acls(vec![AclEntry::new("digest", "daniel:x", Permissions::all())]);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["acls"][0]["scheme"], "digest");
    }
}
