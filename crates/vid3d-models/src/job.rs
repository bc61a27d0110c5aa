//! Remote generation jobs and queue statuses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::AssetKey;

/// Opaque job handle issued by the remote generation queue.
///
/// Owned by the remote service; this system only tracks it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A successfully submitted generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Remote job handle.
    pub request_id: RequestId,
    /// Asset key the finished artifact will be stored under.
    pub asset_key: AssetKey,
}

/// Job status as reported by the remote generation queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    /// Waiting for a remote worker.
    InQueue,
    /// A remote worker is generating.
    InProgress,
    /// Result is ready to fetch.
    Completed,
    /// The remote service gave up on the job.
    Failed,
}

impl QueueStatus {
    /// Parse the remote wire string. Unknown statuses yield `None`; callers
    /// treat those as non-terminal.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN_QUEUE" => Some(QueueStatus::InQueue),
            "IN_PROGRESS" => Some(QueueStatus::InProgress),
            "COMPLETED" => Some(QueueStatus::Completed),
            "FAILED" => Some(QueueStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::InQueue => "IN_QUEUE",
            QueueStatus::InProgress => "IN_PROGRESS",
            QueueStatus::Completed => "COMPLETED",
            QueueStatus::Failed => "FAILED",
        }
    }

    /// Check if the remote job will see no further updates.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Completed | QueueStatus::Failed)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_status_parse() {
        assert_eq!(QueueStatus::parse("IN_QUEUE"), Some(QueueStatus::InQueue));
        assert_eq!(
            QueueStatus::parse("IN_PROGRESS"),
            Some(QueueStatus::InProgress)
        );
        assert_eq!(QueueStatus::parse("COMPLETED"), Some(QueueStatus::Completed));
        assert_eq!(QueueStatus::parse("FAILED"), Some(QueueStatus::Failed));
        assert_eq!(QueueStatus::parse("SOMETHING_NEW"), None);
        assert_eq!(QueueStatus::parse(""), None);
    }

    #[test]
    fn test_queue_status_terminal() {
        assert!(!QueueStatus::InQueue.is_terminal());
        assert!(!QueueStatus::InProgress.is_terminal());
        assert!(QueueStatus::Completed.is_terminal());
        assert!(QueueStatus::Failed.is_terminal());
    }

    #[test]
    fn test_queue_status_wire_format() {
        let json = serde_json::to_string(&QueueStatus::InQueue).unwrap();
        assert_eq!(json, "\"IN_QUEUE\"");
        let back: QueueStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(back, QueueStatus::Completed);
    }

    #[test]
    fn test_generation_job() {
        let job = GenerationJob {
            request_id: RequestId::from_string("req-123"),
            asset_key: AssetKey::derive("frame_0.jpg"),
        };
        assert_eq!(job.request_id.as_str(), "req-123");
        assert_eq!(job.asset_key.as_str(), "frame-0");
    }
}
