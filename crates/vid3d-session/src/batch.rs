//! Batch orchestration.
//!
//! Maps each frame to a cache hit, a submitted generation job, or a
//! per-frame error. Frames are processed concurrently; the result array
//! preserves input order and a failure on one frame never aborts or omits
//! results for the others.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::future::join_all;
use tokio::fs;
use tracing::{debug, info, warn};

use vid3d_genqueue::GenerationQueue;
use vid3d_models::{AssetKey, Frame, FrameResult, ModelRecord};
use vid3d_storage::ArtifactStore;

use crate::error::{SessionError, SessionResult};

/// Process a batch of frames against the artifact cache and the remote
/// generation queue.
///
/// Returns exactly one [`FrameResult`] per input frame, in input order. An
/// empty frame list is a batch-level validation error; everything after
/// that is captured per-frame.
pub async fn submit_batch(
    frames: &[Frame],
    frames_dir: &Path,
    store: &ArtifactStore,
    queue: &dyn GenerationQueue,
) -> SessionResult<Vec<FrameResult>> {
    if frames.is_empty() {
        return Err(SessionError::validation("frame list is empty"));
    }

    let results = join_all(
        frames
            .iter()
            .map(|frame| process_frame(frame, frames_dir, store, queue)),
    )
    .await;

    let cached = results.iter().filter(|r| r.cached).count();
    let errored = results.iter().filter(|r| r.error.is_some()).count();
    info!(
        total = results.len(),
        cached,
        submitted = results.len() - cached - errored,
        errored,
        "Batch submission finished"
    );

    Ok(results)
}

/// Build the initial record collection for a batch, pairing each result
/// with its frame's timestamp.
pub fn initial_records(frames: &[Frame], results: &[FrameResult]) -> Vec<ModelRecord> {
    frames
        .iter()
        .zip(results.iter().cloned())
        .map(|(frame, result)| result.into_record(frame.timestamp))
        .collect()
}

async fn process_frame(
    frame: &Frame,
    frames_dir: &Path,
    store: &ArtifactStore,
    queue: &dyn GenerationQueue,
) -> FrameResult {
    let asset_key = AssetKey::derive(&frame.filename);

    // Cache hit: the extracted model already exists, skip the remote call.
    if let Some(url) = store.model_url(&asset_key).await {
        debug!(key = %asset_key, "Artifact cache HIT");
        return FrameResult::cached(&frame.filename, asset_key, url);
    }
    debug!(key = %asset_key, "Artifact cache MISS");

    let bytes = match read_frame_bytes(frames_dir, &frame.filename).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(filename = %frame.filename, error = %e, "Frame unreadable, skipping submission");
            return FrameResult::failed(&frame.filename, asset_key, e.to_string());
        }
    };

    let data_uri = encode_image_data_uri(&frame.filename, &bytes);
    match queue.submit(&data_uri).await {
        Ok(request_id) => FrameResult::submitted(&frame.filename, asset_key, request_id),
        Err(e) => {
            warn!(filename = %frame.filename, error = %e, "Submission failed");
            FrameResult::failed(&frame.filename, asset_key, e.to_string())
        }
    }
}

async fn read_frame_bytes(frames_dir: &Path, filename: &str) -> SessionResult<Vec<u8>> {
    if !is_safe_filename(filename) {
        return Err(SessionError::validation(format!(
            "invalid frame filename: {}",
            filename
        )));
    }

    let path = frames_dir.join(filename);
    fs::read(&path)
        .await
        .map_err(|_| SessionError::validation(format!("frame file does not exist: {}", filename)))
}

/// Frame filenames come from the extraction collaborator and must stay
/// inside the frames directory.
fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && filename != "."
        && filename != ".."
}

fn encode_image_data_uri(filename: &str, bytes: &[u8]) -> String {
    let mime = if filename.to_ascii_lowercase().ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    };
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeQueue;
    use vid3d_models::RecordStatus;

    fn frame(n: usize) -> Frame {
        Frame::new(
            n as f64 * 2.0,
            format!("clip_{}.jpg", n),
            format!("/frames/clip_{}.jpg", n),
        )
    }

    fn write_frame(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"jpeg-bytes").unwrap();
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("generated"), "/generated");
        let queue = FakeQueue::new();

        let err = submit_batch(&[], dir.path(), &store, &queue)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cache_hits_skip_submission() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("generated"), "/generated");
        let queue = FakeQueue::new();

        let frames = vec![frame(0), frame(1)];
        write_frame(dir.path(), "clip_1.jpg");

        // Pre-materialize clip_0's model so it reads as cached.
        let key = AssetKey::derive("clip_0.jpg");
        store
            .materialize(&key, &crate::testing::archive_with_model("clip-0.glb"))
            .await
            .unwrap();

        queue.push_submit_ok("r1");
        let results = submit_batch(&frames, dir.path(), &store, &queue)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].cached);
        assert_eq!(
            results[0].artifact_url.as_deref(),
            Some("/generated/clip-0.glb")
        );
        assert!(!results[1].cached);
        assert_eq!(results[1].request_id.as_ref().unwrap().as_str(), "r1");

        // Exactly one submission went out, and it was a data URI.
        let submitted = queue.submitted();
        assert_eq!(submitted.len(), 1);
        assert!(submitted[0].starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_unreadable_frame_fails_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("generated"), "/generated");
        let queue = FakeQueue::new();

        let frames = vec![frame(0), frame(1), frame(2)];
        write_frame(dir.path(), "clip_0.jpg");
        write_frame(dir.path(), "clip_2.jpg");
        // clip_1.jpg intentionally missing.

        queue.push_submit_ok("r1");
        queue.push_submit_ok("r2");
        let results = submit_batch(&frames, dir.path(), &store, &queue)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].error.is_none());
        assert!(results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("does not exist"));
        assert!(results[2].error.is_none());
        assert_eq!(queue.submitted().len(), 2);
    }

    #[tokio::test]
    async fn test_submission_failure_is_captured_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("generated"), "/generated");
        let queue = FakeQueue::new();

        let frames = vec![frame(0), frame(1)];
        write_frame(dir.path(), "clip_0.jpg");
        write_frame(dir.path(), "clip_1.jpg");

        queue.push_submit_err("queue unreachable");
        queue.push_submit_ok("r2");

        // Submissions race, so either frame may draw the scripted failure;
        // what matters is that it stays contained to one result.
        let results = submit_batch(&frames, dir.path(), &store, &queue)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.error.is_some()).count(), 1);
        assert_eq!(results.iter().filter(|r| r.request_id.is_some()).count(), 1);
    }

    #[tokio::test]
    async fn test_initial_records_carry_frame_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("generated"), "/generated");
        let queue = FakeQueue::new();

        let frames = vec![frame(0), frame(3)];
        write_frame(dir.path(), "clip_0.jpg");
        write_frame(dir.path(), "clip_3.jpg");
        queue.push_submit_ok("r1");
        queue.push_submit_ok("r2");

        let results = submit_batch(&frames, dir.path(), &store, &queue)
            .await
            .unwrap();
        let records = initial_records(&frames, &results);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, 0.0);
        assert_eq!(records[1].timestamp, 6.0);
        assert!(records
            .iter()
            .all(|r| r.status == RecordStatus::Generating));
    }

    #[test]
    fn test_safe_filename_rejects_traversal() {
        assert!(is_safe_filename("clip_0.jpg"));
        assert!(!is_safe_filename("../secrets.txt"));
        assert!(!is_safe_filename("a/b.jpg"));
        assert!(!is_safe_filename("a\\b.jpg"));
        assert!(!is_safe_filename(""));
    }

    #[test]
    fn test_png_gets_png_mime() {
        assert!(encode_image_data_uri("f.PNG", b"x").starts_with("data:image/png;base64,"));
        assert!(encode_image_data_uri("f.jpg", b"x").starts_with("data:image/jpeg;base64,"));
    }
}
