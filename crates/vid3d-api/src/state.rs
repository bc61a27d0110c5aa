//! Application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use vid3d_genqueue::{GenerationQueue, SeedQueueClient};
use vid3d_session::BatchSession;
use vid3d_storage::ArtifactStore;

use crate::config::ApiConfig;
use crate::extractor::FrameExtractorClient;

/// Shared application state.
///
/// At most one batch session is live at a time; starting a new one cancels
/// and replaces whatever is in the slot.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: ArtifactStore,
    pub queue: Arc<dyn GenerationQueue>,
    pub extractor: FrameExtractorClient,
    pub session: Arc<Mutex<Option<BatchSession>>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = ArtifactStore::new(&config.generated_dir, &config.generated_url_base);
        let queue = Arc::new(SeedQueueClient::from_env()?);
        let extractor = FrameExtractorClient::new(&config.extractor_url);

        Ok(Self {
            config,
            store,
            queue,
            extractor,
            session: Arc::new(Mutex::new(None)),
        })
    }

    /// Cancel and drop the active session, if any.
    ///
    /// Selecting a new video discards all in-flight record state; results
    /// of polls still in the air are dropped with the old task.
    pub async fn replace_session(&self, next: Option<BatchSession>) {
        let mut slot = self.session.lock().await;
        if let Some(old) = slot.take() {
            old.cancel();
        }
        *slot = next;
    }
}
