//! Asset key derivation.
//!
//! An [`AssetKey`] is the content-derived cache key that maps a frame
//! filename to its generated 3D artifact on disk. Two frames with the same
//! normalized name always resolve to the same key, which is what makes the
//! generation cache deduplicate work.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key used when the raw name is empty or normalizes to nothing.
pub const FALLBACK_ASSET_KEY: &str = "seed3d-asset";

/// Normalized, filesystem-safe cache key for a generated asset.
///
/// Invariants: lowercase, alphanumeric-and-hyphen only, no leading or
/// trailing hyphens, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    /// Derive a key from a raw name (typically a frame filename).
    ///
    /// The raw name is trimmed, reduced to its last path segment, stripped
    /// of its trailing extension, lowercased, and every maximal run of
    /// non-alphanumeric characters is collapsed into a single hyphen.
    /// Empty input, or input that normalizes to nothing, yields
    /// [`FALLBACK_ASSET_KEY`].
    ///
    /// Pure and total: no I/O, no errors.
    pub fn derive(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::fallback();
        }

        // Last path segment, accepting both separator styles.
        let file_name = trimmed
            .rsplit(['/', '\\'])
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(trimmed);

        // Strip the trailing extension (text after the final dot), but only
        // when there is actually text after it.
        let stem = match file_name.rfind('.') {
            Some(idx) if idx + 1 < file_name.len() => &file_name[..idx],
            _ => file_name,
        };

        let slug = slugify(stem);
        if slug.is_empty() {
            Self::fallback()
        } else {
            Self(slug)
        }
    }

    /// The fixed fallback key.
    pub fn fallback() -> Self {
        Self(FALLBACK_ASSET_KEY.to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowercase and collapse every run of non-`[a-z0-9]` characters into a
/// single hyphen, with no leading or trailing hyphen.
fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for c in value.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}
