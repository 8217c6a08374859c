//! Error types for zk-store

/// Result type for zk-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Path failed znode path validation
    #[error("Invalid znode path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Operation required a node that does not exist
    #[error("Znode not found: {path}")]
    NotFound { path: String },

    /// Create attempted on a path that already holds a node
    #[error("Znode already exists: {path}")]
    NodeExists { path: String },

    /// Create attempted under a missing parent without make_path
    #[error("Parent znode missing for {path}")]
    ParentNotFound { path: String },

    /// Conditional write failed because the remote version moved
    #[error("Version conflict on {path}: expected {expected}, store has {actual}")]
    VersionConflict {
        path: String,
        expected: i32,
        actual: i32,
    },

    /// Delete without recursive on a node that still has children
    #[error("Znode {path} has {child_count} children; recursive delete required")]
    NonEmptyNode { path: String, child_count: usize },

    /// Named connection profile is not configured
    #[error("Unknown connection profile: {name}")]
    UnknownProfile { name: String },

    /// Transport or connection failure from the backing store
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    /// TOML deserialization error from profile files
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
