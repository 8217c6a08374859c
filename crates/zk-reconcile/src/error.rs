//! Error types for zk-reconcile

/// Result type for zk-reconcile operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during reconciliation
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Store capability error
    #[error(transparent)]
    Store(#[from] zk_store::Error),
}
