//! Archive bundle decoding.
//!
//! The generation service delivers finished models as zip bundles holding
//! one binary glTF file plus auxiliary textures. Only the model entry is
//! pulled out; everything else stays inside the retained archive.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::{StorageError, StorageResult};

/// File suffix identifying the model entry, matched case-insensitively.
const MODEL_SUFFIX: &str = ".glb";

/// Extract the model entry from an in-memory archive.
///
/// Returns the entry name and its bytes. Fails with
/// [`StorageError::NoModelEntry`] when the archive decodes cleanly but
/// contains no model, and with [`StorageError::Archive`] when the bytes are
/// not a readable archive.
pub fn extract_model_entry(archive_bytes: &[u8]) -> StorageResult<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if !entry.name().to_ascii_lowercase().ends_with(MODEL_SUFFIX) {
            continue;
        }

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        return Ok((entry.name().to_string(), bytes));
    }

    Err(StorageError::NoModelEntry)
}
