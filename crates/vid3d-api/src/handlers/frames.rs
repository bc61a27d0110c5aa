//! Frame-extraction handler.

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::info;

use vid3d_models::ExtractedFrames;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /api/extract-frames
///
/// Accepts a multipart video upload and proxies it to the external media
/// service, which samples frames at fixed intervals into the shared frames
/// directory and reports their metadata. The frame images themselves are
/// served from `/frames/` on this server.
///
/// Selecting a new video abandons the previous batch: the active session
/// is cancelled and its record state discarded before extraction starts.
///
/// Returns:
/// - 200: `{duration, frames}` from the media service
/// - 400: missing video field
/// - 502: media service unreachable, no duration, or zero frames
pub async fn extract_frames(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ExtractedFrames>> {
    let mut video: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {}", e)))?
    {
        if field.name() == Some("video") {
            let filename = field
                .file_name()
                .unwrap_or("upload.mp4")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("could not read upload: {}", e)))?;
            video = Some((filename, bytes.to_vec()));
        }
    }

    let Some((filename, bytes)) = video else {
        return Err(ApiError::bad_request("Missing video file (field: video)"));
    };
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded video is empty"));
    }

    info!(filename = %filename, size = bytes.len(), "Video uploaded");

    // A new video invalidates whatever batch was in flight.
    state.replace_session(None).await;

    let extracted = state.extractor.extract(&filename, bytes).await?;
    Ok(Json(extracted))
}
