//! Znode data model and store capability layer
//!
//! This crate defines everything the reconciliation engine needs to talk
//! about a coordination service's hierarchical namespace without talking
//! to one:
//!
//! - **Paths and values**: validated `ZnodePath` identity, `NodeValue`
//!   byte payloads
//! - **ACL model**: declarative `AclRule` input, resolved `AclEntry` sets,
//!   order-independent set equivalence
//! - **Store capability**: the `ZnodeStore` trait every backing client
//!   implements, with typed `ExpectedVersion` conditional writes
//! - **Connection configuration**: pass-through `ConnectionOptions` and
//!   TOML `ProfileSet` profiles
//!
//! The actual coordination client (sessions, watches, the wire protocol)
//! lives behind the `ZnodeStore` trait and is out of scope here.

pub mod acl;
pub mod conn;
pub mod error;
pub mod path;
pub mod store;
pub mod value;
pub mod version;

pub use acl::{AclEntry, AclRule, AclRuleset, Permissions, equivalent};
pub use conn::{ConnectionOptions, ProfileSet};
pub use error::{Error, Result};
pub use path::ZnodePath;
pub use store::{CreateFlags, ZnodeStore};
pub use value::NodeValue;
pub use version::ExpectedVersion;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_version_conflict_displays_versions() {
        let error = Error::VersionConflict {
            path: "/app".to_string(),
            expected: 3,
            actual: 5,
        };

        let display = format!("{}", error);
        assert!(
            display.contains("/app") && display.contains('3') && display.contains('5'),
            "Error display should carry path and both versions, got: {}",
            display
        );
    }

    #[test]
    fn error_non_empty_node_is_distinct() {
        let error = Error::NonEmptyNode {
            path: "/app".to_string(),
            child_count: 2,
        };
        assert!(format!("{}", error).contains("recursive"));
    }
}
