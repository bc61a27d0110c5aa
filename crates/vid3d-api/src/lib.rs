//! Axum HTTP API for the Vid3D backend.
//!
//! This crate provides:
//! - Batch submission and replacement of the active session
//! - Single-job status polling with server-side artifact materialization
//! - Frame-extraction proxying to the external media service
//! - Static serving of extracted frames and generated artifacts
//! - Health endpoints

pub mod config;
pub mod error;
pub mod extractor;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use extractor::FrameExtractorClient;
pub use routes::create_router;
pub use state::AppState;
