//! The generation queue seam.

use async_trait::async_trait;

use vid3d_models::RequestId;

use crate::error::GenQueueResult;
use crate::messages::{GenerationResult, JobStatusReport};

/// Remote asynchronous image-to-3D generation queue.
///
/// The orchestration layer depends on this trait rather than the HTTP
/// client so job handling can be exercised against a scripted fake.
#[async_trait]
pub trait GenerationQueue: Send + Sync {
    /// Submit one image for generation. Returns the remote job handle.
    ///
    /// No retries at this layer; retry policy belongs to the caller.
    async fn submit(&self, image_data_uri: &str) -> GenQueueResult<RequestId>;

    /// Query the current status of a submitted job.
    async fn status(&self, request_id: &RequestId) -> GenQueueResult<JobStatusReport>;

    /// Fetch the result payload of a completed job.
    async fn result(&self, request_id: &RequestId) -> GenQueueResult<GenerationResult>;

    /// Download an artifact archive from the remote store.
    async fn download(&self, url: &str) -> GenQueueResult<Vec<u8>>;
}
