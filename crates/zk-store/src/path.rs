//! Validated znode path handling

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A validated path in the znode namespace.
///
/// Znode paths are absolute, '/'-separated, and carry no trailing slash
/// except for the root itself. The path is the stable identity of a node,
/// so validation happens once at construction and every consumer can rely
/// on the invariants holding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZnodePath {
    inner: String,
}

impl ZnodePath {
    /// The namespace root, `/`.
    pub fn root() -> Self {
        Self {
            inner: "/".to_string(),
        }
    }

    /// Parse and validate a znode path.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if the path is empty, relative, carries
    /// a trailing slash, or contains empty or dot segments.
    pub fn parse(path: impl AsRef<str>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_empty() {
            return Err(Error::invalid_path(path, "path must not be empty"));
        }
        if !path.starts_with('/') {
            return Err(Error::invalid_path(path, "path must be absolute"));
        }
        if path == "/" {
            return Ok(Self::root());
        }
        if path.ends_with('/') {
            return Err(Error::invalid_path(path, "trailing slash not allowed"));
        }
        for segment in path[1..].split('/') {
            if segment.is_empty() {
                return Err(Error::invalid_path(path, "empty path segment"));
            }
            if segment == "." || segment == ".." {
                return Err(Error::invalid_path(path, "relative path segment"));
            }
        }
        Ok(Self {
            inner: path.to_string(),
        })
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Whether this is the namespace root.
    pub fn is_root(&self) -> bool {
        self.inner == "/"
    }

    /// Get the final path segment, or None at the root.
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.inner.rsplit('/').next()
    }

    /// Get the parent path, or None at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.inner.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            None => None,
        }
    }

    /// Join a single child segment onto this path.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if the segment is empty or contains '/'.
    pub fn join(&self, child: &str) -> Result<Self> {
        if child.is_empty() || child.contains('/') {
            return Err(Error::invalid_path(child, "child must be a single segment"));
        }
        let joined = if self.is_root() {
            format!("/{child}")
        } else {
            format!("{}/{child}", self.inner)
        };
        Self::parse(joined)
    }

    /// Whether `other` sits strictly below this path.
    pub fn is_ancestor_of(&self, other: &ZnodePath) -> bool {
        if self.is_root() {
            return !other.is_root();
        }
        other
            .inner
            .strip_prefix(&self.inner)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl std::fmt::Display for ZnodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl TryFrom<&str> for ZnodePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ZnodePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<ZnodePath> for String {
    fn from(p: ZnodePath) -> String {
        p.inner
    }
}
