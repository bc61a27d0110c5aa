//! Batch submission handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vid3d_models::{Frame, FrameResult};
use vid3d_session::{BatchSession, SessionEvent, StartedBatch};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Fallback spacing between frames when the caller omits timestamps.
const DEFAULT_FRAME_INTERVAL_SECS: f64 = 2.0;

/// One frame in a batch request.
#[derive(Debug, Deserialize)]
pub struct FrameInput {
    pub filename: String,
    pub url: String,
    /// Frame position in seconds. Taken from the extraction service's
    /// response; when absent, frames are assumed evenly spaced.
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// Batch submission request.
#[derive(Debug, Deserialize)]
pub struct GenerateBatchRequest {
    #[serde(default)]
    pub frames: Vec<FrameInput>,
}

/// Batch submission response: one result per input frame, input order.
#[derive(Debug, Serialize)]
pub struct GenerateBatchResponse {
    pub success: bool,
    pub results: Vec<FrameResult>,
}

/// POST /api/generate-batch
///
/// Decides cached-vs-generate for every frame, submits the misses to the
/// generation queue, and replaces the active session with one polling the
/// new jobs. The previous session, if any, is cancelled first.
///
/// Returns:
/// - 200: ordered per-frame results (individual failures ride inside them)
/// - 400: missing or empty frame list
pub async fn generate_batch(
    State(state): State<AppState>,
    Json(request): Json<GenerateBatchRequest>,
) -> ApiResult<Json<GenerateBatchResponse>> {
    if request.frames.is_empty() {
        return Err(ApiError::bad_request(
            "Please provide a non-empty frame list (frames)",
        ));
    }

    let frames: Vec<Frame> = request
        .frames
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            let timestamp = input
                .timestamp
                .unwrap_or(index as f64 * DEFAULT_FRAME_INTERVAL_SECS);
            Frame::new(timestamp.max(0.0), input.filename, input.url)
        })
        .collect();

    info!(frames = frames.len(), "Starting batch");

    // A new batch owns the record state exclusively; the old session's
    // timer is cleared before the new one starts.
    state.replace_session(None).await;

    let StartedBatch {
        session,
        results,
        events,
    } = BatchSession::start(
        state.config.session.clone(),
        state.store.clone(),
        state.queue.clone(),
        frames,
    )
    .await?;

    tokio::spawn(log_session_events(events));
    state.replace_session(Some(session)).await;

    Ok(Json(GenerateBatchResponse {
        success: true,
        results,
    }))
}

/// Drain a session's event queue into the log, in commit order.
async fn log_session_events(mut events: tokio::sync::mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::BatchStarted {
                total,
                cached,
                generating,
                failed,
            } => {
                info!(total, cached, generating, failed, "Batch submitted");
            }
            SessionEvent::AssetReady {
                asset_key,
                filename,
                artifact_url,
            } => {
                info!(%asset_key, %filename, %artifact_url, "Asset ready");
            }
            SessionEvent::AssetFailed {
                asset_key,
                filename,
                error,
            } => {
                warn!(%asset_key, %filename, %error, "Asset failed");
            }
            SessionEvent::BatchComplete {
                completed,
                failed,
                cached,
            } => {
                info!(completed, failed, cached, "All models settled");
            }
        }
    }
}
