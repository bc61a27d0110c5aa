//! Client for the remote image-to-3D generation queue.
//!
//! This crate provides:
//! - The [`GenerationQueue`] trait, the seam the orchestration layer
//!   depends on
//! - [`SeedQueueClient`], the HTTP implementation against a fal.ai-style
//!   queue running the Seed3D model
//! - Wire payload types and remote log normalization

pub mod client;
pub mod error;
pub mod messages;
pub mod queue;

pub use client::SeedQueueClient;
pub use error::{GenQueueError, GenQueueResult};
pub use messages::{extract_logs, GenerationResult, JobStatusReport};
pub use queue::GenerationQueue;
