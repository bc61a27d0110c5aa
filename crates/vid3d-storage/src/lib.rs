//! On-disk artifact store for generated 3D models.
//!
//! This crate provides:
//! - A flat directory of artifacts keyed by asset key (`<key>.zip` archive,
//!   `<key>.glb` extracted model)
//! - Existence probes used as the cache-hit signal
//! - Idempotent materialization of downloaded archives
//! - Extraction of the model entry from an archive bundle

pub mod archive;
pub mod error;
pub mod store;

pub use archive::extract_model_entry;
pub use error::{StorageError, StorageResult};
pub use store::{ArtifactStore, MaterializedArtifact};
