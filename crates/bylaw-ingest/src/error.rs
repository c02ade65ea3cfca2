use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Llm(#[from] bylaw_llm::LlmError),

    #[error(transparent)]
    Store(#[from] bylaw_store::StoreError),

    #[error("backup serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no documents found to ingest")]
    NoDocuments,

    #[error("no chunks produced from loaded documents")]
    NoChunks,

    #[error(
        "upload failed; chunks kept at {}, retry with --reuse-backup: {source}",
        .backup_path.display()
    )]
    UploadFailed {
        backup_path: PathBuf,
        source: bylaw_store::StoreError,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;
