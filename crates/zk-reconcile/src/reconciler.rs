//! The reconciliation engine
//!
//! The `Reconciler` compares desired node state against what the store
//! reports, issues the minimal set of remote operations to converge, and
//! reports a structured before/after outcome. It holds no state between
//! calls and provides no cross-caller locking; concurrent interference is
//! detected only through the store's conditional-write semantics and
//! surfaces as a failed outcome.

use zk_store::{
    AclEntry, AclRule, ConnectionOptions, Error as StoreError, ZnodeStore, equivalent,
};

use crate::error::Result;
use crate::outcome::{ChangeSet, NodePatch, ReconcileOutcome};
use crate::spec::{AbsentSpec, AclUpdateSpec, NodeSpec};

/// Options for reconciliation operations
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// If true, report what would change without mutating remote state.
    /// Drifted outcomes come back with `pending = true`.
    pub dry_run: bool,
}

/// Engine for converging znode state
///
/// Three operations:
/// - **present**: make the node exist with the desired value and ACLs
/// - **absent**: make sure no node exists at the path
/// - **acls**: converge only the ACL set, independent of value
///
/// Each reads remote state fresh per invocation, mutates only what
/// differs, and re-reads after every mutation to verify convergence.
pub struct Reconciler {
    store: Box<dyn ZnodeStore>,
    conn: ConnectionOptions,
}

impl Reconciler {
    pub fn new(store: Box<dyn ZnodeStore>, conn: ConnectionOptions) -> Self {
        Self { store, conn }
    }

    /// The connection options threaded through every store call.
    pub fn conn(&self) -> &ConnectionOptions {
        &self.conn
    }

    /// Converge the node at `spec.path` to the desired value and ACL set.
    ///
    /// Repeated calls with an identical spec against unchanged remote
    /// state are no-ops: the second call reports success with an empty
    /// change set. An empty `spec.acls` leaves existing ACLs unmanaged.
    ///
    /// # Errors
    ///
    /// Store transport failures propagate unchanged. Version conflicts on
    /// the update path are reported as failed outcomes, not errors.
    pub fn present(&self, spec: &NodeSpec) -> Result<ReconcileOutcome> {
        self.present_with_options(spec, ReconcileOptions::default())
    }

    /// `present` with an explicit dry-run switch.
    pub fn present_with_options(
        &self,
        spec: &NodeSpec,
        options: ReconcileOptions,
    ) -> Result<ReconcileOutcome> {
        let path = &spec.path;
        let target = self.resolve_rules(&spec.acls)?;

        if !self.store.exists(path, &self.conn)? {
            return self.create_node(spec, &target, options);
        }

        let cur_value = self.store.get(path, &self.conn)?;
        let cur_acls = self.store.get_acls(path, &self.conn)?;
        let value_matches = cur_value == spec.value;
        let acls_match = !spec.manages_acls() || equivalent(&cur_acls, &target);

        if value_matches && acls_match {
            tracing::debug!(%path, "Znode already converged");
            return Ok(ReconcileOutcome::success(
                path.as_str(),
                format!("Znode {path} already has the desired value and acls"),
            ));
        }

        if options.dry_run {
            tracing::info!(%path, "[dry-run] Would update znode");
            let mut old = NodePatch::default();
            let mut new = NodePatch::default();
            if !value_matches {
                old.value = Some(cur_value);
                new.value = Some(spec.value.clone());
            }
            if !acls_match {
                old.acls = Some(cur_acls);
                new.acls = Some(target);
            }
            return Ok(ReconcileOutcome::pending(
                path.as_str(),
                format!("Znode {path} will be updated"),
            )
            .with_changes(ChangeSet::default().old(old).new_state(new)));
        }

        let mut old = NodePatch::default();
        let mut new = NodePatch::default();
        let mut value_ok = true;
        let mut acl_ok = true;

        if !value_matches {
            tracing::info!(%path, "Setting znode value");
            if let Err(err) =
                self.store
                    .set(path, &spec.value, spec.expected_version, &self.conn)
            {
                let message = mutation_failure(err)?;
                return Ok(ReconcileOutcome::failure(path.as_str(), message)
                    .with_changes(ChangeSet::default().old(old.with_value(cur_value))));
            }
            let reread = self.store.get(path, &self.conn)?;
            value_ok = reread == spec.value;
            old.value = Some(cur_value);
            new.value = Some(reread);
        }

        if !acls_match {
            tracing::info!(%path, "Setting znode acls");
            if let Err(err) =
                self.store
                    .set_acls(path, &target, spec.expected_version, &self.conn)
            {
                let message = mutation_failure(err)?;
                return Ok(ReconcileOutcome::failure(path.as_str(), message).with_changes(
                    ChangeSet::default().old(old.with_acls(cur_acls)).new_state(new),
                ));
            }
            let reread = self.store.get_acls(path, &self.conn)?;
            acl_ok = equivalent(&reread, &target);
            old.acls = Some(cur_acls);
            new.acls = Some(reread);
        }

        let changes = ChangeSet::default().old(old).new_state(new);
        if value_ok && acl_ok {
            Ok(
                ReconcileOutcome::success(path.as_str(), format!("Znode {path} updated"))
                    .with_changes(changes),
            )
        } else {
            Ok(ReconcileOutcome::failure(
                path.as_str(),
                format!("Znode {path} update did not converge"),
            )
            .with_changes(changes))
        }
    }

    /// Make sure no node exists at `spec.path`.
    ///
    /// Deleting a node that still has children fails distinctly unless
    /// `spec.recursive` is set; the outcome carries the store's message so
    /// the caller can decide to retry recursively.
    pub fn absent(&self, spec: &AbsentSpec) -> Result<ReconcileOutcome> {
        self.absent_with_options(spec, ReconcileOptions::default())
    }

    /// `absent` with an explicit dry-run switch.
    pub fn absent_with_options(
        &self,
        spec: &AbsentSpec,
        options: ReconcileOptions,
    ) -> Result<ReconcileOutcome> {
        let path = &spec.path;

        if !self.store.exists(path, &self.conn)? {
            tracing::debug!(%path, "Znode already absent");
            return Ok(ReconcileOutcome::success(
                path.as_str(),
                format!("Znode {path} does not exist"),
            ));
        }

        // Audit snapshot of what is being removed
        let mut snapshot = NodePatch::default()
            .with_value(self.store.get(path, &self.conn)?)
            .with_acls(self.store.get_acls(path, &self.conn)?);
        if spec.recursive {
            snapshot.children = Some(self.store.get_children(path, &self.conn)?);
        }

        if options.dry_run {
            tracing::info!(%path, "[dry-run] Would remove znode");
            return Ok(ReconcileOutcome::pending(
                path.as_str(),
                format!("Znode {path} will be removed"),
            )
            .with_changes(ChangeSet::default().old(snapshot)));
        }

        tracing::info!(%path, recursive = spec.recursive, "Deleting znode");
        if let Err(err) =
            self.store
                .delete(path, spec.expected_version, spec.recursive, &self.conn)
        {
            let message = mutation_failure(err)?;
            return Ok(ReconcileOutcome::failure(path.as_str(), message)
                .with_changes(ChangeSet::default().old(snapshot)));
        }

        if self.store.exists(path, &self.conn)? {
            return Ok(ReconcileOutcome::failure(
                path.as_str(),
                format!("Znode {path} still exists after delete"),
            ));
        }

        Ok(
            ReconcileOutcome::success(path.as_str(), format!("Znode {path} removed"))
                .with_changes(ChangeSet::default().old(snapshot)),
        )
    }

    /// Converge only the ACL set at `spec.path`.
    ///
    /// ACL management never implicitly creates: a missing node is an
    /// immediate failure, with no store calls beyond the existence check.
    pub fn acls(&self, spec: &AclUpdateSpec) -> Result<ReconcileOutcome> {
        self.acls_with_options(spec, ReconcileOptions::default())
    }

    /// `acls` with an explicit dry-run switch.
    pub fn acls_with_options(
        &self,
        spec: &AclUpdateSpec,
        options: ReconcileOptions,
    ) -> Result<ReconcileOutcome> {
        let path = &spec.path;
        let target = self.resolve_rules(&spec.rules)?;

        if !self.store.exists(path, &self.conn)? {
            return Ok(ReconcileOutcome::failure(
                path.as_str(),
                format!("Failed to set acls: znode {path} does not exist"),
            ));
        }

        let cur_acls = self.store.get_acls(path, &self.conn)?;
        if equivalent(&cur_acls, &target) {
            tracing::debug!(%path, "Znode acls already converged");
            return Ok(ReconcileOutcome::success(
                path.as_str(),
                format!("Znode {path} acls already set"),
            ));
        }

        if options.dry_run {
            tracing::info!(%path, "[dry-run] Would update znode acls");
            return Ok(ReconcileOutcome::pending(
                path.as_str(),
                format!("Znode {path} acls will be updated"),
            )
            .with_changes(
                ChangeSet::default()
                    .old(NodePatch::default().with_acls(cur_acls))
                    .new_state(NodePatch::default().with_acls(target)),
            ));
        }

        tracing::info!(%path, "Setting znode acls");
        if let Err(err) = self
            .store
            .set_acls(path, &target, spec.expected_version, &self.conn)
        {
            let message = mutation_failure(err)?;
            return Ok(ReconcileOutcome::failure(path.as_str(), message).with_changes(
                ChangeSet::default()
                    .old(NodePatch::default().with_acls(cur_acls))
                    .new_state(NodePatch::default().with_acls(target)),
            ));
        }

        // Report the re-read set, not the target, so a failed convergence
        // shows the actual divergence
        let reread = self.store.get_acls(path, &self.conn)?;
        let converged = equivalent(&reread, &target);
        let changes = ChangeSet::default()
            .old(NodePatch::default().with_acls(cur_acls))
            .new_state(NodePatch::default().with_acls(reread));

        if converged {
            Ok(
                ReconcileOutcome::success(path.as_str(), format!("Znode {path} acls updated"))
                    .with_changes(changes),
            )
        } else {
            Ok(ReconcileOutcome::failure(
                path.as_str(),
                format!("Znode {path} acls failed to converge"),
            )
            .with_changes(changes))
        }
    }

    fn create_node(
        &self,
        spec: &NodeSpec,
        target: &[AclEntry],
        options: ReconcileOptions,
    ) -> Result<ReconcileOutcome> {
        let path = &spec.path;

        if options.dry_run {
            tracing::info!(%path, "[dry-run] Would create znode");
            let mut new = NodePatch::default().with_value(spec.value.clone());
            if spec.manages_acls() {
                new.acls = Some(target.to_vec());
            }
            return Ok(ReconcileOutcome::pending(
                path.as_str(),
                format!("Znode {path} will be created"),
            )
            .with_changes(ChangeSet::default().new_state(new)));
        }

        tracing::info!(
            %path,
            ephemeral = spec.ephemeral,
            sequential = spec.sequential,
            "Creating znode"
        );
        let created = self
            .store
            .create(path, &spec.value, target, spec.create_flags(), &self.conn)?;

        // Verify against the created path; sequential creates suffix it
        let new_value = self.store.get(&created, &self.conn)?;
        let new_acls = self.store.get_acls(&created, &self.conn)?;
        let value_ok = new_value == spec.value;
        let acl_ok = !spec.manages_acls() || equivalent(&new_acls, target);

        let changes = ChangeSet::default().old(NodePatch::default()).new_state(
            NodePatch::default()
                .with_value(new_value)
                .with_acls(new_acls),
        );

        if value_ok && acl_ok {
            Ok(
                ReconcileOutcome::success(created.as_str(), format!("Znode {created} created"))
                    .with_changes(changes),
            )
        } else {
            Ok(ReconcileOutcome::failure(
                created.as_str(),
                format!("Znode {created} created but read-back does not match the desired state"),
            )
            .with_changes(changes))
        }
    }

    fn resolve_rules(&self, rules: &[AclRule]) -> Result<Vec<AclEntry>> {
        rules
            .iter()
            .map(|rule| self.store.make_digest_acl(rule).map_err(Into::into))
            .collect()
    }
}

/// Classify a store error from a mutation: conditional-write conflicts and
/// non-empty-node refusals become failed outcomes carrying the store's
/// message; anything else propagates unchanged.
fn mutation_failure(err: StoreError) -> Result<String> {
    match err {
        conflict @ (StoreError::VersionConflict { .. } | StoreError::NonEmptyNode { .. }) => {
            Ok(conflict.to_string())
        }
        other => Err(other.into()),
    }
}
