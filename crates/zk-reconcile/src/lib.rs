//! Declarative reconciliation engine for znode state and ACLs
//!
//! Given a desired node specification and a [`zk_store::ZnodeStore`]
//! capability, the [`Reconciler`] determines the minimal set of remote
//! operations needed to converge actual state to desired state, executes
//! them (unless in dry-run mode), and reports a structured
//! [`ReconcileOutcome`] with a before/after diff.
//!
//! # Architecture
//!
//! ```text
//!        caller (host runtime)
//!               |
//!          zk-reconcile          <- this crate: present / absent / acls
//!               |
//!           zk-store             <- model + ZnodeStore capability trait
//!               |
//!     coordination client        <- out of scope (sessions, watches, wire)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use zk_reconcile::{NodeSpec, Reconciler, ReconcileOptions};
//! use zk_store::{ConnectionOptions, ZnodePath};
//!
//! let reconciler = Reconciler::new(store, ConnectionOptions::default());
//! let spec = NodeSpec::new(ZnodePath::parse("/app/flag")?, "enabled");
//! let outcome = reconciler.present(&spec)?;
//! assert!(outcome.success);
//! ```

pub mod error;
pub mod logging;
pub mod outcome;
pub mod reconciler;
pub mod spec;

pub use error::{Error, Result};
pub use outcome::{ChangeSet, NodePatch, ReconcileOutcome};
pub use reconciler::{ReconcileOptions, Reconciler};
pub use spec::{AbsentSpec, AclUpdateSpec, NodeSpec};
