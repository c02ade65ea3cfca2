//! Policy document loading from a flat directory.

use std::path::Path;

#[derive(Clone, Debug, PartialEq)]
pub struct LoadedDocument {
    /// File name, used downstream for source attribution.
    pub name: String,
    pub content: String,
}

/// Result of a directory scan: everything that loaded plus a description of
/// everything that did not.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<LoadedDocument>,
    pub errors: Vec<String>,
}

/// Loads every `.txt` and `.md` file in `dir`, `.txt` files first, each
/// group in name order.
///
/// Never fails as a whole: an unreadable directory or file is logged and
/// recorded in [`LoadOutcome::errors`] while the rest proceeds. Whitespace-only
/// files are skipped with a warning but are not errors.
#[must_use]
pub fn load_documents(dir: &Path) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(dir = %dir.display(), error = %e, "cannot read documents directory");
            outcome.errors.push(format!("{}: {e}", dir.display()));
            return outcome;
        }
    };

    let mut txt_paths = Vec::new();
    let mut md_paths = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("txt") => txt_paths.push(path),
            Some("md") => md_paths.push(path),
            _ => {}
        }
    }
    txt_paths.sort();
    md_paths.sort();

    for path in txt_paths.into_iter().chain(md_paths) {
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );
        match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => {
                tracing::warn!(file = %name, "skipping empty document");
            }
            Ok(content) => {
                tracing::info!(file = %name, chars = content.chars().count(), "loaded document");
                outcome.documents.push(LoadedDocument { name, content });
            }
            Err(e) => {
                tracing::error!(file = %name, error = %e, "failed to read document");
                outcome.errors.push(format!("{name}: {e}"));
            }
        }
    }
    outcome
}
