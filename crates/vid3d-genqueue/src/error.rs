//! Generation queue error types.

use thiserror::Error;

pub type GenQueueResult<T> = Result<T, GenQueueError>;

#[derive(Debug, Error)]
pub enum GenQueueError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Submission rejected: {0}")]
    Submission(String),

    #[error("Status query failed: {0}")]
    Status(String),

    #[error("Result fetch failed: {0}")]
    ResultFetch(String),

    #[error("Artifact download failed: {0}")]
    Download(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected payload: {0}")]
    UnexpectedPayload(String),
}

impl GenQueueError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission(msg.into())
    }

    pub fn status(msg: impl Into<String>) -> Self {
        Self::Status(msg.into())
    }

    /// Check if the error came from the transport rather than the remote
    /// service's verdict on the job. Transport errors are retried by the
    /// polling layer; remote verdicts are terminal.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GenQueueError::Http(_) | GenQueueError::Status(_) | GenQueueError::UnexpectedPayload(_)
        )
    }
}
