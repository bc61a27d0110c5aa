//! Shared data models for the Vid3D backend.
//!
//! This crate provides Serde-serializable types for:
//! - Asset keys and the cache-key derivation rules
//! - Extracted video frames
//! - Remote generation jobs and queue statuses
//! - Model records and their state machine
//! - Per-frame batch results

pub mod asset;
pub mod batch;
pub mod frame;
pub mod job;
pub mod record;

// Re-export common types
pub use asset::{AssetKey, FALLBACK_ASSET_KEY};
pub use batch::FrameResult;
pub use frame::{ExtractedFrames, Frame};
pub use job::{GenerationJob, QueueStatus, RequestId};
pub use record::{ModelRecord, RecordStatus};
