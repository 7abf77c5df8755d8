//! On-disk persistence for presentation documents.
//!
//! Documents are stored as a versioned JSON envelope. Saves go through a
//! sibling temporary file and an atomic rename, so readers never observe a
//! torn document and a failed mutation leaves the previous bytes in place.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Presentation;

/// Version of the persisted document envelope.
pub const FORMAT_VERSION: u32 = 1;

/// Errors that can occur during document persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred reading or writing the document file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document file is not valid JSON for the current envelope.
    #[error("Malformed document file: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The document file was written by an unsupported format version.
    #[error("Unsupported document format version {found} (supported: {FORMAT_VERSION})")]
    UnsupportedVersion {
        /// The version found in the file.
        found: u32,
    },
}

/// Versioned envelope around the serialized document graph.
#[derive(Debug, Serialize, Deserialize)]
struct DocumentFile {
    format_version: u32,
    presentation: Presentation,
}

/// Load a presentation document from `path`.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be read,
/// [`StoreError::Malformed`] if it does not parse, or
/// [`StoreError::UnsupportedVersion`] on a format version mismatch.
pub fn load(path: &Path) -> Result<Presentation, StoreError> {
    let contents = fs::read_to_string(path)?;
    let file: DocumentFile = serde_json::from_str(&contents)?;
    if file.format_version != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: file.format_version,
        });
    }
    Ok(file.presentation)
}

/// Save a presentation document to `path`, replacing it atomically.
///
/// The document is written to a sibling `.tmp` file first and renamed over
/// the target, so a crash mid-write cannot corrupt the existing document.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the write or rename fails, or
/// [`StoreError::Malformed`] if serialization fails.
pub fn save(presentation: &Presentation, path: &Path) -> Result<(), StoreError> {
    let file = DocumentFile {
        format_version: FORMAT_VERSION,
        presentation: presentation.clone(),
    };
    let json = serde_json::to_string_pretty(&file)?;

    let tmp_path = sibling_tmp_path(path);
    fs::write(&tmp_path, json)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        // Leave no orphan temp file behind on a failed rename.
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io(e));
    }
    tracing::debug!("Persisted document to {}", path.display());
    Ok(())
}

/// The temporary sibling path used during an atomic save.
fn sibling_tmp_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().map_or_else(
        || std::ffi::OsString::from("document"),
        std::ffi::OsStr::to_os_string,
    );
    name.push(".tmp");
    path.with_file_name(name)
}
