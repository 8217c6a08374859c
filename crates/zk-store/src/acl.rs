//! ACL model and set equivalence
//!
//! Two shapes live here. `AclRule` is the declarative input form: a
//! username, a plain-text password, and permission flags, the way a caller
//! writes ACLs down. `AclEntry` is the resolved form the store actually
//! holds: an opaque digest credential plus a permission set. Resolution
//! from rule to entry goes through the store capability, because the digest
//! scheme belongs to the store, not to this layer.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Permission set attached to an ACL entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub admin: bool,
}

impl Permissions {
    /// The full permission set; the "all" shorthand expands to this.
    pub fn all() -> Self {
        Self {
            read: true,
            write: true,
            create: true,
            delete: true,
            admin: true,
        }
    }

    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl std::fmt::Display for Permissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flags = [
            (self.read, 'r'),
            (self.write, 'w'),
            (self.create, 'c'),
            (self.delete, 'd'),
            (self.admin, 'a'),
        ];
        for (set, c) in flags {
            if set {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

/// A resolved ACL entry as the store holds it.
///
/// `id` is the principal identity under `scheme`; for the digest scheme it
/// carries the opaque hashed credential and is compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclEntry {
    pub scheme: String,
    pub id: String,
    pub perms: Permissions,
}

impl AclEntry {
    pub fn new(scheme: impl Into<String>, id: impl Into<String>, perms: Permissions) -> Self {
        Self {
            scheme: scheme.into(),
            id: id.into(),
            perms,
        }
    }

    /// The well-known open entry: `world:anyone` with all permissions.
    pub fn world_anyone() -> Self {
        Self::new("world", "anyone", Permissions::all())
    }
}

impl std::fmt::Display for AclEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.scheme, self.id, self.perms)
    }
}

/// Declarative ACL input: username, password, permission flags.
///
/// `all: true` expands to the full permission set and wins over the
/// individual flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AclRule {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub delete: bool,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub all: bool,
}

impl AclRule {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_all(mut self) -> Self {
        self.all = true;
        self
    }

    pub fn with_permissions(mut self, perms: Permissions) -> Self {
        self.read = perms.read;
        self.write = perms.write;
        self.create = perms.create;
        self.delete = perms.delete;
        self.admin = perms.admin;
        self
    }

    /// Effective permission set, with the `all` shorthand expanded.
    pub fn permissions(&self) -> Permissions {
        if self.all {
            return Permissions::all();
        }
        Permissions {
            read: self.read,
            write: self.write,
            create: self.create,
            delete: self.delete,
            admin: self.admin,
        }
    }
}

/// Declarative input that accepts a single rule or a list of rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AclRuleset {
    One(AclRule),
    Many(Vec<AclRule>),
}

impl AclRuleset {
    pub fn into_rules(self) -> Vec<AclRule> {
        match self {
            Self::One(rule) => vec![rule],
            Self::Many(rules) => rules,
        }
    }
}

impl From<AclRule> for AclRuleset {
    fn from(rule: AclRule) -> Self {
        Self::One(rule)
    }
}

impl From<Vec<AclRule>> for AclRuleset {
    fn from(rules: Vec<AclRule>) -> Self {
        Self::Many(rules)
    }
}

/// Order-independent ACL set equivalence.
///
/// True iff the two slices, treated as sets, have an empty symmetric
/// difference. Duplicate entries collapse; multiplicity carries no meaning.
pub fn equivalent(left: &[AclEntry], right: &[AclEntry]) -> bool {
    let left: HashSet<&AclEntry> = left.iter().collect();
    let right: HashSet<&AclEntry> = right.iter().collect();
    left == right
}
