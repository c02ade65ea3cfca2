//! Chunk backup between the expensive compute phase and the upload phase.
//!
//! Chunking, clustering, and labeling burn LLM calls; the backup lets a run
//! that dies during upload resume without repeating any of them.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::Result;
use crate::types::Chunk;

/// Writes `chunks` to `path` as pretty-printed JSON.
///
/// The write goes through a sibling temp file and a rename, so a crash
/// mid-write never leaves a truncated backup behind.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, serialization
/// fails, or the filesystem rejects the write.
pub fn save_backup(chunks: &[Chunk], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(chunks)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    tracing::info!(path = %path.display(), chunks = chunks.len(), "backup saved");
    Ok(())
}

/// Reads a backup if one exists and parses.
///
/// A missing file is the normal case and stays silent; unreadable or
/// unparseable backups are logged and treated as absent.
#[must_use]
pub fn load_backup(path: &Path) -> Option<Vec<Chunk>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read backup");
            return None;
        }
    };
    match serde_json::from_str::<Vec<Chunk>>(&raw) {
        Ok(chunks) => {
            tracing::info!(path = %path.display(), chunks = chunks.len(), "backup loaded");
            Some(chunks)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "backup is not parseable, ignoring");
            None
        }
    }
}

/// Deletes the backup after a successful upload. Missing files are fine;
/// any other failure is logged and swallowed.
pub fn remove_backup(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "backup removed"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove backup");
        }
    }
}
