//! Single-job status handler.
//!
//! Polling endpoint for external clients tracking one generation job. On
//! completion the artifact is materialized into the store server-side, so
//! pollers get local URLs and repeated polls for the same asset key settle
//! on the first write.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vid3d_models::{AssetKey, QueueStatus, RequestId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query parameters for the job status endpoint.
#[derive(Debug, Deserialize)]
pub struct JobStatusQuery {
    /// Raw asset name; the cache key is derived from it.
    pub asset: Option<String>,
}

/// Job status response.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    /// Remote status: IN_QUEUE, IN_PROGRESS, COMPLETED, FAILED
    pub status: QueueStatus,
    /// Queue position while waiting.
    pub position: Option<u32>,
    /// Remote progress log lines.
    pub logs: Vec<String>,
    /// Result payload, present once COMPLETED.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResultPayload>,
    /// Remote failure message, present once FAILED.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result payload of a completed job.
#[derive(Debug, Serialize)]
pub struct JobResultPayload {
    /// Remote archive URL as reported by the queue.
    pub model_url: Option<String>,
    /// Tokens billed by the remote service.
    pub usage_tokens: Option<u64>,
    /// Local archive URL, once materialized.
    pub local_zip_url: Option<String>,
    /// Local model URL, once materialized and extracted.
    pub local_glb_url: Option<String>,
}

/// GET /api/jobs/:request_id?asset=<name>
///
/// Returns:
/// - 200: current job status (FAILED jobs are a 200 with `error` set;
///   only transport-level problems become error responses)
/// - 400: malformed request id or missing asset parameter
/// - 502: the queue itself was unreachable
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Query(query): Query<JobStatusQuery>,
) -> ApiResult<Json<JobStatusResponse>> {
    if !is_valid_request_id(&request_id) {
        return Err(ApiError::bad_request("Invalid request id format"));
    }

    let asset = query
        .asset
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing asset parameter"))?;
    let asset_key = AssetKey::derive(asset);

    let request_id = RequestId::from_string(request_id);
    let report = state.queue.status(&request_id).await?;

    let mut response = JobStatusResponse {
        status: report.status,
        position: report.queue_position,
        logs: report.logs,
        result: None,
        error: None,
    };

    match report.status {
        QueueStatus::Failed => {
            response.error = Some(
                report
                    .error
                    .unwrap_or_else(|| "generation job failed".to_string()),
            );
        }
        QueueStatus::Completed => {
            let result = state.queue.result(&request_id).await?;
            let (local_zip_url, local_glb_url) =
                materialize_result(&state, &asset_key, result.model_url.as_deref()).await;

            response.result = Some(JobResultPayload {
                model_url: result.model_url,
                usage_tokens: result.usage_tokens,
                local_zip_url,
                local_glb_url,
            });
        }
        QueueStatus::InQueue | QueueStatus::InProgress => {}
    }

    Ok(Json(response))
}

/// Ensure a local copy of the finished artifact, returning its URLs.
///
/// Failures here never fail the status response; the client still gets the
/// remote URL and can fall back to downloading itself.
async fn materialize_result(
    state: &AppState,
    asset_key: &AssetKey,
    remote_url: Option<&str>,
) -> (Option<String>, Option<String>) {
    // Already materialized by the session poller or an earlier poll.
    if let Some(glb_url) = state.store.model_url(asset_key).await {
        return (Some(state.store.archive_url(asset_key)), Some(glb_url));
    }

    let Some(remote_url) = remote_url else {
        return (None, None);
    };

    let bytes = match state.queue.download(remote_url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(key = %asset_key, error = %e, "Could not download artifact for local copy");
            return (None, None);
        }
    };

    match state.store.materialize(asset_key, &bytes).await {
        Ok(artifact) => {
            info!(key = %asset_key, "Artifact materialized via status endpoint");
            (Some(artifact.archive_url), artifact.model_url)
        }
        Err(e) => {
            warn!(key = %asset_key, error = %e, "Could not materialize local copy");
            (None, None)
        }
    }
}

/// Validate the request id to keep junk out of upstream URLs.
///
/// Valid format: alphanumeric characters, hyphens and underscores, 8-128
/// chars.
fn is_valid_request_id(id: &str) -> bool {
    if id.len() < 8 || id.len() > 128 {
        return false;
    }
    id.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request_ids() {
        assert!(is_valid_request_id("12345678"));
        assert!(is_valid_request_id("a1b2c3d4-e5f6-7890-abcd-ef0123456789"));
        assert!(is_valid_request_id("req_0001_abc"));
    }

    #[test]
    fn test_invalid_request_ids() {
        assert!(!is_valid_request_id(""));
        assert!(!is_valid_request_id("short"));
        assert!(!is_valid_request_id("has space in it"));
        assert!(!is_valid_request_id("has/slash-123"));
        assert!(!is_valid_request_id(&"a".repeat(129)));
    }
}
