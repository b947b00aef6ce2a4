use orbis_core::StorageError;
use thiserror::Error;

use crate::fetcher::SourceKind;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("{endpoint} source unavailable: {message}")]
    UpstreamUnavailable {
        endpoint: SourceKind,
        message: String,
    },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("summary artifact could not be written: {0}")]
    ArtifactWriteFailed(String),
    #[error("refresh exceeded its deadline of {0:?}")]
    DeadlineExceeded(std::time::Duration),
    #[error("country not found: {0}")]
    NotFound(String),
    #[error("summary artifact not found")]
    ArtifactNotFound,
    #[error("summary artifact could not be read: {0}")]
    ArtifactUnreadable(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
