use thiserror::Error;

/// Result type for catalog storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failure reported by a [`crate::Catalog`] backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    /// A stored row could not be decoded into a country record.
    #[error("stored country is invalid: {0}")]
    InvalidData(String),
}
