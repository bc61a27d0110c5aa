//! API integration tests.
//!
//! The router is exercised end-to-end with an in-process scripted
//! generation queue, so no network or remote service is involved.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use vid3d_api::{create_router, ApiConfig, AppState, FrameExtractorClient};
use vid3d_genqueue::{
    GenQueueError, GenQueueResult, GenerationQueue, GenerationResult, JobStatusReport,
};
use vid3d_models::{QueueStatus, RequestId};
use vid3d_storage::ArtifactStore;

/// Scripted queue: fixed responses per request id.
#[derive(Default)]
struct ScriptedQueue {
    submit_ids: Mutex<Vec<String>>,
    statuses: Mutex<HashMap<String, QueueStatus>>,
    results: Mutex<HashMap<String, GenerationResult>>,
    downloads: Mutex<HashMap<String, Vec<u8>>>,
}

impl ScriptedQueue {
    fn with_submit(self, id: &str) -> Self {
        self.submit_ids.lock().unwrap().push(id.to_string());
        self
    }

    fn with_status(self, id: &str, status: QueueStatus) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(id.to_string(), status);
        self
    }

    fn with_result(self, id: &str, model_url: &str) -> Self {
        self.results.lock().unwrap().insert(
            id.to_string(),
            GenerationResult {
                model_url: Some(model_url.to_string()),
                usage_tokens: Some(42),
            },
        );
        self
    }

    fn with_download(self, url: &str, bytes: Vec<u8>) -> Self {
        self.downloads
            .lock()
            .unwrap()
            .insert(url.to_string(), bytes);
        self
    }
}

#[async_trait]
impl GenerationQueue for ScriptedQueue {
    async fn submit(&self, _image_data_uri: &str) -> GenQueueResult<RequestId> {
        let mut ids = self.submit_ids.lock().unwrap();
        if ids.is_empty() {
            return Err(GenQueueError::Submission("no submissions scripted".into()));
        }
        Ok(RequestId::from_string(ids.remove(0)))
    }

    async fn status(&self, request_id: &RequestId) -> GenQueueResult<JobStatusReport> {
        let statuses = self.statuses.lock().unwrap();
        let status = statuses
            .get(request_id.as_str())
            .copied()
            .ok_or_else(|| GenQueueError::Status("unscripted status".into()))?;
        Ok(JobStatusReport {
            status,
            queue_position: None,
            logs: vec!["ok".into()],
            error: match status {
                QueueStatus::Failed => Some("scripted failure".into()),
                _ => None,
            },
        })
    }

    async fn result(&self, request_id: &RequestId) -> GenQueueResult<GenerationResult> {
        self.results
            .lock()
            .unwrap()
            .get(request_id.as_str())
            .cloned()
            .ok_or_else(|| GenQueueError::ResultFetch("unscripted result".into()))
    }

    async fn download(&self, url: &str) -> GenQueueResult<Vec<u8>> {
        self.downloads
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| GenQueueError::Download("unscripted download".into()))
    }
}

fn model_archive(entry: &str) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(&mut cursor);
    writer
        .start_file(entry, zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"glb-bytes").unwrap();
    writer.finish().unwrap();
    cursor.into_inner()
}

fn test_state(dir: &tempfile::TempDir, queue: ScriptedQueue) -> AppState {
    let frames_dir = dir.path().join("frames");
    let generated_dir = dir.path().join("generated");
    std::fs::create_dir_all(&frames_dir).unwrap();

    let mut config = ApiConfig::default();
    config.frames_dir = frames_dir.clone();
    config.generated_dir = generated_dir.clone();
    config.session.frames_dir = frames_dir;
    config.session.poll_interval = Duration::from_millis(10);

    AppState {
        store: ArtifactStore::new(generated_dir, "/generated"),
        queue: Arc::new(queue),
        extractor: FrameExtractorClient::new(&config.extractor_url),
        session: Arc::new(tokio::sync::Mutex::new(None)),
        config,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(&dir, ScriptedQueue::default()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_generate_batch_rejects_empty_frames() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(&dir, ScriptedQueue::default()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generate-batch")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"frames": []}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_batch_runs_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let queue = ScriptedQueue::default()
        .with_submit("req-0001-abcd")
        .with_status("req-0001-abcd", QueueStatus::Completed)
        .with_result("req-0001-abcd", "https://cdn.example/r1.zip")
        .with_download("https://cdn.example/r1.zip", model_archive("clip-0.glb"));
    let state = test_state(&dir, queue);

    std::fs::write(state.config.frames_dir.join("clip_0.jpg"), b"jpeg").unwrap();

    let app = create_router(state.clone());
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generate-batch")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"frames": [{"filename": "clip_0.jpg", "url": "/frames/clip_0.jpg", "timestamp": 0.0}]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["results"][0]["cached"], false);
    assert_eq!(json["results"][0]["request_id"], "req-0001-abcd");

    // The session polls in the background until the record settles.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/models")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        if json["models"][0]["status"] == "completed" {
            assert_eq!(json["models"][0]["artifact_url"], "/generated/clip-0.glb");
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "record never settled: {}",
            json
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_models_endpoint_without_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(&dir, ScriptedQueue::default()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/models")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["active"], false);
    assert_eq!(json["models"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_job_status_completed_materializes_locally() {
    let dir = tempfile::tempdir().unwrap();
    let queue = ScriptedQueue::default()
        .with_status("req-0002-abcd", QueueStatus::Completed)
        .with_result("req-0002-abcd", "https://cdn.example/r2.zip")
        .with_download("https://cdn.example/r2.zip", model_archive("scene.glb"));
    let state = test_state(&dir, queue);
    let app = create_router(state.clone());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/jobs/req-0002-abcd?asset=clip_5.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "COMPLETED");
    assert_eq!(json["result"]["local_glb_url"], "/generated/clip-5.glb");
    assert_eq!(json["result"]["model_url"], "https://cdn.example/r2.zip");

    // The artifact landed on disk under the derived key.
    assert!(dir.path().join("generated").join("clip-5.glb").exists());
    assert!(dir.path().join("generated").join("clip-5.zip").exists());
}

#[tokio::test]
async fn test_job_status_failed_carries_error() {
    let dir = tempfile::tempdir().unwrap();
    let queue = ScriptedQueue::default().with_status("req-0003-abcd", QueueStatus::Failed);
    let app = create_router(test_state(&dir, queue));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/jobs/req-0003-abcd?asset=clip_6.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "FAILED");
    assert_eq!(json["error"], "scripted failure");
}

#[tokio::test]
async fn test_job_status_validates_params() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(&dir, ScriptedQueue::default()));

    // Malformed request id
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/jobs/bad!id?asset=clip.jpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing asset parameter
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/jobs/req-0004-abcd")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
