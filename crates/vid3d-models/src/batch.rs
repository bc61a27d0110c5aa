//! Per-frame batch results.

use serde::{Deserialize, Serialize};

use crate::{AssetKey, ModelRecord, RequestId};

/// Outcome of submitting one frame in a batch.
///
/// Every input frame yields exactly one result; the result array preserves
/// the input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameResult {
    /// Source frame filename.
    pub filename: String,
    /// Cache key derived from the filename.
    pub asset_key: AssetKey,
    /// True when the artifact was already on disk and no remote call was made.
    pub cached: bool,
    /// URL of the cached model, for cache hits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,
    /// Remote job handle, for submitted frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    /// Per-frame failure reason. A failed frame never aborts its siblings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameResult {
    /// Result for a cache hit.
    pub fn cached(
        filename: impl Into<String>,
        asset_key: AssetKey,
        artifact_url: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            asset_key,
            cached: true,
            artifact_url: Some(artifact_url.into()),
            request_id: None,
            error: None,
        }
    }

    /// Result for a successful submission.
    pub fn submitted(
        filename: impl Into<String>,
        asset_key: AssetKey,
        request_id: RequestId,
    ) -> Self {
        Self {
            filename: filename.into(),
            asset_key,
            cached: false,
            artifact_url: None,
            request_id: Some(request_id),
            error: None,
        }
    }

    /// Result for a frame that could not be read or submitted.
    pub fn failed(
        filename: impl Into<String>,
        asset_key: AssetKey,
        error: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            asset_key,
            cached: false,
            artifact_url: None,
            request_id: None,
            error: Some(error.into()),
        }
    }

    /// Build the initial tracking record for this result.
    pub fn into_record(self, timestamp: f64) -> ModelRecord {
        if let Some(error) = self.error {
            return ModelRecord::failed(self.filename, self.asset_key, timestamp, error);
        }
        if self.cached {
            let url = self.artifact_url.unwrap_or_default();
            return ModelRecord::cached(self.filename, self.asset_key, timestamp, url);
        }
        match self.request_id {
            Some(request_id) => {
                ModelRecord::generating(self.filename, self.asset_key, timestamp, request_id)
            }
            // Submission reported neither an error nor a handle; treat as a
            // failure rather than polling a job that does not exist.
            None => ModelRecord::failed(
                self.filename,
                self.asset_key,
                timestamp,
                "submission returned no request id",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordStatus;

    #[test]
    fn test_cached_result_becomes_cached_record() {
        let result = FrameResult::cached(
            "frame_0.jpg",
            AssetKey::derive("frame_0.jpg"),
            "/generated/frame-0.glb",
        );
        let record = result.into_record(0.0);
        assert_eq!(record.status, RecordStatus::Cached);
        assert_eq!(record.artifact_url.as_deref(), Some("/generated/frame-0.glb"));
    }

    #[test]
    fn test_submitted_result_becomes_generating_record() {
        let result = FrameResult::submitted(
            "frame_1.jpg",
            AssetKey::derive("frame_1.jpg"),
            RequestId::from_string("r1"),
        );
        let record = result.into_record(2.0);
        assert_eq!(record.status, RecordStatus::Generating);
        assert_eq!(record.request_id.as_ref().unwrap().as_str(), "r1");
        assert_eq!(record.timestamp, 2.0);
    }

    #[test]
    fn test_error_result_becomes_failed_record() {
        let result = FrameResult::failed(
            "frame_2.jpg",
            AssetKey::derive("frame_2.jpg"),
            "frame file does not exist",
        );
        let record = result.into_record(4.0);
        assert_eq!(record.status, RecordStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("frame file does not exist"));
    }

    #[test]
    fn test_inconsistent_result_fails_closed() {
        let result = FrameResult {
            filename: "frame_3.jpg".into(),
            asset_key: AssetKey::derive("frame_3.jpg"),
            cached: false,
            artifact_url: None,
            request_id: None,
            error: None,
        };
        let record = result.into_record(6.0);
        assert_eq!(record.status, RecordStatus::Failed);
    }

    #[test]
    fn test_wire_format_skips_absent_fields() {
        let result = FrameResult::submitted(
            "frame_4.jpg",
            AssetKey::derive("frame_4.jpg"),
            RequestId::from_string("r4"),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["cached"], false);
        assert_eq!(json["request_id"], "r4");
        assert!(json.get("error").is_none());
        assert!(json.get("artifact_url").is_none());
    }
}
