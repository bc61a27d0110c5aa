//! Model records and their state machine.
//!
//! A [`ModelRecord`] tracks one asset from batch submission to a displayable
//! (or failed) 3D model. Records are keyed by asset key, owned exclusively
//! by one batch session, and mutated only through the transition methods
//! here so the legal-transition table is enforced in a single place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{AssetKey, RequestId};

/// Lifecycle state of a model record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Artifact was already on disk at submission time.
    Cached,
    /// Submission succeeded; a remote job is running.
    Generating,
    /// Artifact materialized and displayable.
    Completed,
    /// Submission or generation failed.
    Failed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Cached => "cached",
            RecordStatus::Generating => "generating",
            RecordStatus::Completed => "completed",
            RecordStatus::Failed => "failed",
        }
    }

    /// Check if no further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordStatus::Completed | RecordStatus::Failed)
    }

    /// The transition table: only `Generating -> Completed` and
    /// `Generating -> Failed` are legal. `Cached` and the terminal states
    /// are sticky.
    pub fn can_transition_to(&self, next: RecordStatus) -> bool {
        matches!(self, RecordStatus::Generating)
            && matches!(next, RecordStatus::Completed | RecordStatus::Failed)
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracking state for one asset within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Source frame filename.
    pub filename: String,
    /// Cache key the artifact is stored under. Unique within one batch.
    pub asset_key: AssetKey,
    /// Frame position in the source video, in seconds.
    pub timestamp: f64,
    /// Current lifecycle state.
    pub status: RecordStatus,
    /// URL of the displayable model, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,
    /// Remote job handle, for records that went through generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    /// Failure reason, for failed records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the record last changed state.
    pub updated_at: DateTime<Utc>,
}

impl ModelRecord {
    /// Create a record for an artifact that was already on disk.
    pub fn cached(
        filename: impl Into<String>,
        asset_key: AssetKey,
        timestamp: f64,
        artifact_url: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            asset_key,
            timestamp,
            status: RecordStatus::Cached,
            artifact_url: Some(artifact_url.into()),
            request_id: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Create a record for a successfully submitted generation job.
    pub fn generating(
        filename: impl Into<String>,
        asset_key: AssetKey,
        timestamp: f64,
        request_id: RequestId,
    ) -> Self {
        Self {
            filename: filename.into(),
            asset_key,
            timestamp,
            status: RecordStatus::Generating,
            artifact_url: None,
            request_id: Some(request_id),
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Create a record for a frame whose submission failed.
    pub fn failed(
        filename: impl Into<String>,
        asset_key: AssetKey,
        timestamp: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            asset_key,
            timestamp,
            status: RecordStatus::Failed,
            artifact_url: None,
            request_id: None,
            error: Some(error.into()),
            updated_at: Utc::now(),
        }
    }

    /// Transition `Generating -> Completed` with the artifact URL.
    ///
    /// Returns `false` (and logs) without mutating when the transition is
    /// not in the legal table, so a stale poll can never clobber a settled
    /// record.
    pub fn complete(&mut self, artifact_url: impl Into<String>) -> bool {
        if !self.status.can_transition_to(RecordStatus::Completed) {
            warn!(
                asset_key = %self.asset_key,
                status = %self.status,
                "Rejected illegal transition to completed"
            );
            return false;
        }
        self.status = RecordStatus::Completed;
        self.artifact_url = Some(artifact_url.into());
        self.error = None;
        self.updated_at = Utc::now();
        true
    }

    /// Transition `Generating -> Failed` with a failure reason.
    ///
    /// Same stickiness guarantee as [`ModelRecord::complete`].
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if !self.status.can_transition_to(RecordStatus::Failed) {
            warn!(
                asset_key = %self.asset_key,
                status = %self.status,
                "Rejected illegal transition to failed"
            );
            return false;
        }
        self.status = RecordStatus::Failed;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
        true
    }

    /// Check if the record still has a remote job to poll.
    pub fn is_generating(&self) -> bool {
        self.status == RecordStatus::Generating
    }
}
