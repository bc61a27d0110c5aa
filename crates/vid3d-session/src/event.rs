//! Session events.
//!
//! State transitions are committed first, then their events are pushed onto
//! the outbound queue, so observers always see effects in commit order and
//! never interleaved with a half-applied cycle.

use serde::Serialize;

use vid3d_models::AssetKey;

/// Notification emitted by a batch session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Batch submission finished; polling is about to begin.
    BatchStarted {
        total: usize,
        cached: usize,
        generating: usize,
        failed: usize,
    },
    /// One asset finished generating and is displayable.
    AssetReady {
        asset_key: AssetKey,
        filename: String,
        artifact_url: String,
    },
    /// One asset failed; its siblings are unaffected.
    AssetFailed {
        asset_key: AssetKey,
        filename: String,
        error: String,
    },
    /// No record is generating any more; the session is done.
    BatchComplete {
        completed: usize,
        failed: usize,
        cached: usize,
    },
}
