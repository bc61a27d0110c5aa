//! Client for the external frame-extraction service.
//!
//! The media service accepts raw video bytes and returns the video duration
//! plus the frames it sampled at fixed intervals. Everything about decoding
//! happens over there; this client only validates the response shape.

use reqwest::multipart;
use tracing::info;

use vid3d_models::ExtractedFrames;

use crate::error::{ApiError, ApiResult};

/// Frame-extraction service client.
#[derive(Debug, Clone)]
pub struct FrameExtractorClient {
    client: reqwest::Client,
    base_url: String,
}

impl FrameExtractorClient {
    /// Create a client against the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Upload a video and get its sampled frames back.
    ///
    /// Fails when the service is unreachable, cannot determine the video
    /// duration, or returns zero frames.
    pub async fn extract(&self, filename: &str, video_bytes: Vec<u8>) -> ApiResult<ExtractedFrames> {
        let part = multipart::Part::bytes(video_bytes)
            .file_name(filename.to_string())
            .mime_str("video/mp4")
            .map_err(|e| ApiError::internal(format!("building upload part: {}", e)))?;
        let form = multipart::Form::new().part("video", part);

        let response = self
            .client
            .post(format!("{}/extract-frames", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::upstream(format!("frame extraction unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::upstream(format!(
                "frame extraction returned {}",
                response.status()
            )));
        }

        let extracted: ExtractedFrames = response
            .json()
            .await
            .map_err(|e| ApiError::upstream(format!("frame extraction payload: {}", e)))?;

        if extracted.duration <= 0.0 {
            return Err(ApiError::upstream(
                "frame extraction could not determine video duration",
            ));
        }
        if extracted.frames.is_empty() {
            return Err(ApiError::upstream("frame extraction produced zero frames"));
        }

        info!(
            duration = extracted.duration,
            frames = extracted.frames.len(),
            "Frames extracted"
        );
        Ok(extracted)
    }
}
