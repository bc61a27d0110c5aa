//! Extracted video frames.

use serde::{Deserialize, Serialize};

/// A still frame extracted from an uploaded video.
///
/// Produced by the external media-processing service; immutable input to
/// the batch orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Position of the frame in the source video, in seconds.
    pub timestamp: f64,
    /// Frame image filename (e.g. `video_4.jpg`).
    pub filename: String,
    /// URL where the frame image is served.
    pub url: String,
}

impl Frame {
    pub fn new(timestamp: f64, filename: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            timestamp,
            filename: filename.into(),
            url: url.into(),
        }
    }
}

/// Response of the frame-extraction collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedFrames {
    /// Source video duration in seconds.
    pub duration: f64,
    /// Frames sampled at fixed intervals, in timestamp order.
    pub frames: Vec<Frame>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_roundtrip() {
        let frame = Frame::new(4.0, "clip_2.jpg", "/frames/clip_2.jpg");
        let json = serde_json::to_string(&frame).unwrap();
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_extracted_frames_deserializes_collaborator_payload() {
        let payload = r#"{
            "duration": 10.5,
            "frames": [
                {"timestamp": 0.0, "filename": "v_0.jpg", "url": "/frames/v_0.jpg"},
                {"timestamp": 2.0, "filename": "v_1.jpg", "url": "/frames/v_1.jpg"}
            ]
        }"#;
        let extracted: ExtractedFrames = serde_json::from_str(payload).unwrap();
        assert_eq!(extracted.frames.len(), 2);
        assert_eq!(extracted.frames[1].timestamp, 2.0);
    }
}
