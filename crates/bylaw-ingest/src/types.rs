use serde::{Deserialize, Serialize};

/// A bounded span of document text plus its source and topic metadata, the
/// unit stored in and retrieved from the vector index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Identified by `(source_document, chunk_index)` within one ingestion run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_document: String,
    pub chunk_index: usize,
    pub cluster_id: usize,
    #[serde(default)]
    pub cluster_label: String,
}

/// Pipeline stages in execution order.
///
/// `BackupSaved` is re-enterable: a restarted run that finds a usable backup
/// resumes from there straight into `Uploading`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestStage {
    LoadingDocs,
    Chunking,
    Clustering,
    Labeling,
    BackupSaved,
    Uploading,
    Done,
}

/// Outcome summary of one ingestion run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IngestReport {
    pub documents_loaded: usize,
    pub chunks_created: usize,
    pub clusters_labeled: usize,
    pub backup_reused: bool,
    /// Per-file load failures, formatted as `"name: cause"`.
    pub file_errors: Vec<String>,
    pub elapsed_ms: u128,
}
