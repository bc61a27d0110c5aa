//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive decode failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("No model entry found in archive")]
    NoModelEntry,
}
