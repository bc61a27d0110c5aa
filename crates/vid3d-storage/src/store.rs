//! On-disk artifact store.
//!
//! Artifacts live in one flat directory keyed by asset key: `<key>.zip`
//! (the downloaded bundle) and `<key>.glb` (the extracted model). Presence
//! of the `.glb` is the sole cache-hit signal; a `.zip` without its `.glb`
//! counts as a miss so extraction is re-attempted on the next materialize.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use vid3d_models::AssetKey;

use crate::archive::extract_model_entry;
use crate::error::StorageResult;

/// Archive filename suffix.
const ARCHIVE_EXT: &str = "zip";
/// Extracted model filename suffix.
const MODEL_EXT: &str = "glb";

/// Store for generated artifacts, addressed by [`AssetKey`].
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    public_base: String,
}

/// Paths and URLs of a materialized artifact.
///
/// `model_path`/`model_url` are `None` when the archive held no extractable
/// model; the archive itself is still retained on disk.
#[derive(Debug, Clone)]
pub struct MaterializedArtifact {
    pub archive_path: PathBuf,
    pub model_path: Option<PathBuf>,
    pub archive_url: String,
    pub model_url: Option<String>,
}

impl ArtifactStore {
    /// Create a store rooted at `root`, serving files under `public_base`.
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        let public_base = public_base.into();
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    /// Create a store from environment variables.
    pub fn from_env() -> Self {
        let root = std::env::var("GENERATED_DIR").unwrap_or_else(|_| "public/generated".to_string());
        let base = std::env::var("GENERATED_URL_BASE").unwrap_or_else(|_| "/generated".to_string());
        Self::new(root, base)
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Disk path of the archive for `key`.
    pub fn archive_path(&self, key: &AssetKey) -> PathBuf {
        self.root.join(format!("{}.{}", key, ARCHIVE_EXT))
    }

    /// Disk path of the extracted model for `key`.
    pub fn model_path(&self, key: &AssetKey) -> PathBuf {
        self.root.join(format!("{}.{}", key, MODEL_EXT))
    }

    /// Public URL of the archive for `key`.
    pub fn archive_url(&self, key: &AssetKey) -> String {
        format!("{}/{}.{}", self.public_base, key, ARCHIVE_EXT)
    }

    /// Public URL the model for `key` would be served at.
    fn model_url_unchecked(&self, key: &AssetKey) -> String {
        format!("{}/{}.{}", self.public_base, key, MODEL_EXT)
    }

    /// Check whether a displayable model exists for `key`.
    ///
    /// This is the cache-hit test: only the extracted model counts, never
    /// the archive alone.
    pub async fn has_model(&self, key: &AssetKey) -> bool {
        fs::try_exists(self.model_path(key)).await.unwrap_or(false)
    }

    /// Public URL of the model for `key`, if it exists on disk.
    pub async fn model_url(&self, key: &AssetKey) -> Option<String> {
        if self.has_model(key).await {
            Some(self.model_url_unchecked(key))
        } else {
            None
        }
    }

    /// Write the archive and extract its model entry, idempotently.
    ///
    /// Existence is checked before every write, so concurrent or repeated
    /// materializations of the same key settle on the first bytes written.
    /// Extraction failure is non-fatal: the archive is retained and
    /// `model_path` comes back `None`.
    pub async fn materialize(
        &self,
        key: &AssetKey,
        archive_bytes: &[u8],
    ) -> StorageResult<MaterializedArtifact> {
        fs::create_dir_all(&self.root).await?;

        let archive_path = self.archive_path(key);
        if !fs::try_exists(&archive_path).await.unwrap_or(false) {
            fs::write(&archive_path, archive_bytes).await?;
            debug!(key = %key, path = %archive_path.display(), "Stored artifact archive");
        }

        let model_path = self.model_path(key);
        let mut model_present = fs::try_exists(&model_path).await.unwrap_or(false);
        if !model_present {
            match extract_model_entry(archive_bytes) {
                Ok((entry_name, model_bytes)) => {
                    fs::write(&model_path, model_bytes).await?;
                    model_present = true;
                    debug!(key = %key, entry = %entry_name, "Extracted model from archive");
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Archive retained without extracted model");
                }
            }
        }

        Ok(MaterializedArtifact {
            archive_path,
            model_path: model_present.then(|| self.model_path(key)),
            archive_url: self.archive_url(key),
            model_url: model_present.then(|| self.model_url_unchecked(key)),
        })
    }
}
