//! Session snapshot handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use vid3d_models::ModelRecord;

use crate::state::AppState;

/// Snapshot of the active session's records.
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    /// True when a batch session exists (finished or not).
    pub active: bool,
    /// Records as of the last committed poll cycle, batch order.
    pub models: Vec<ModelRecord>,
}

/// GET /api/models
///
/// UI state endpoint: the current record collection of the active batch,
/// empty when no video has been processed yet.
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let slot = state.session.lock().await;
    match slot.as_ref() {
        Some(session) => Json(ModelsResponse {
            active: true,
            models: session.records(),
        }),
        None => Json(ModelsResponse {
            active: false,
            models: Vec::new(),
        }),
    }
}
