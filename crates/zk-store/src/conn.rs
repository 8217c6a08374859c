//! Connection options and named profile configuration
//!
//! The reconciler never interprets these fields; they thread through every
//! store call so the backing client can pick hosts, authenticate, and apply
//! a default ACL to nodes it creates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::acl::AclRule;
use crate::error::{Error, Result};

/// Pass-through connection configuration for the store capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Named profile this bundle came from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Host list, e.g. `["127.0.0.1:2181"]`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,

    /// Authentication scheme, e.g. `digest`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// ACL rules the client applies to nodes created without explicit ACLs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_acl: Vec<AclRule>,
}

impl ConnectionOptions {
    /// Overlay `other` onto this bundle; set fields in `other` win.
    pub fn merge(&mut self, other: &ConnectionOptions) {
        if other.profile.is_some() {
            self.profile = other.profile.clone();
        }
        if !other.hosts.is_empty() {
            self.hosts = other.hosts.clone();
        }
        if other.scheme.is_some() {
            self.scheme = other.scheme.clone();
        }
        if other.username.is_some() {
            self.username = other.username.clone();
        }
        if other.password.is_some() {
            self.password = other.password.clone();
        }
        if !other.default_acl.is_empty() {
            self.default_acl = other.default_acl.clone();
        }
    }
}

/// Named connection profiles parsed from a TOML document.
///
/// An optional `[defaults]` table supplies base values every profile is
/// layered over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileSet {
    #[serde(default)]
    pub defaults: ConnectionOptions,

    #[serde(default)]
    pub profiles: HashMap<String, ConnectionOptions>,
}

impl ProfileSet {
    /// Parse a profile set from TOML content.
    ///
    /// # Example
    ///
    /// ```
    /// use zk_store::ProfileSet;
    ///
    /// let profiles = ProfileSet::parse(r#"
    /// [defaults]
    /// hosts = ["127.0.0.1:2181"]
    /// scheme = "digest"
    ///
    /// [profiles.prod]
    /// hosts = ["zk1:2181", "zk2:2181", "zk3:2181"]
    /// username = "deploy"
    /// password = "hunter2"
    /// "#).unwrap();
    ///
    /// let prod = profiles.resolve("prod").unwrap();
    /// assert_eq!(prod.scheme.as_deref(), Some("digest"));
    /// assert_eq!(prod.hosts.len(), 3);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let set: ProfileSet = toml::from_str(content)?;
        Ok(set)
    }

    /// Resolve a named profile, layered over the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownProfile` if no profile carries that name.
    pub fn resolve(&self, name: &str) -> Result<ConnectionOptions> {
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| Error::UnknownProfile {
                name: name.to_string(),
            })?;
        tracing::debug!(profile = name, "Resolving connection profile");
        let mut resolved = self.defaults.clone();
        resolved.merge(profile);
        resolved.profile = Some(name.to_string());
        Ok(resolved)
    }
}
