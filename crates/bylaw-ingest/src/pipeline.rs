//! End-to-end ingest orchestration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use bylaw_llm::LlmProvider;
use bylaw_store::{Payload, SOURCE_DOCUMENT_KEY, VectorIndex};
use serde_json::Value;

use crate::backup::{load_backup, remove_backup, save_backup};
use crate::chunker::{ChunkerConfig, SemanticChunker};
use crate::cluster::TopicClusterer;
use crate::error::{IngestError, Result};
use crate::labeler::ClusterLabeler;
use crate::loader::load_documents;
use crate::types::{Chunk, IngestReport, IngestStage};

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Directory scanned for `.txt` and `.md` policy documents.
    pub documents_dir: PathBuf,
    /// Where chunks are parked between compute and upload.
    pub backup_path: PathBuf,
    /// Cluster count requested per document.
    pub n_clusters: usize,
    pub chunker: ChunkerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("./data/policies"),
            backup_path: PathBuf::from("./data/chunks_backup.json"),
            n_clusters: 6,
            chunker: ChunkerConfig::default(),
        }
    }
}

/// Runs the full ingest: load, chunk, cluster, label, back up, upload.
///
/// The backup sits between the LLM-heavy compute phase and the upload, so a
/// run that dies talking to the index can be resumed with `reuse_backup`
/// without spending any provider calls.
pub struct IngestPipeline<P> {
    chunker: SemanticChunker<P>,
    clusterer: TopicClusterer<P>,
    labeler: ClusterLabeler<P>,
    index: Arc<dyn VectorIndex>,
    config: PipelineConfig,
}

impl<P> std::fmt::Debug for IngestPipeline<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> IngestPipeline<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, index: Arc<dyn VectorIndex>, config: PipelineConfig) -> Self {
        Self {
            chunker: SemanticChunker::new(Arc::clone(&provider), config.chunker.clone()),
            clusterer: TopicClusterer::new(Arc::clone(&provider)),
            labeler: ClusterLabeler::new(provider),
            index,
            config,
        }
    }

    /// Executes one ingest run.
    ///
    /// With `reuse_backup` set, an existing backup replaces the whole compute
    /// phase; otherwise (or when no usable backup exists) chunks are computed
    /// fresh and backed up before the upload starts.
    ///
    /// # Errors
    ///
    /// Returns an error when no documents load, chunking or clustering fail,
    /// the backup cannot be written, or the upload fails. After an upload
    /// failure the backup stays on disk for a later `reuse_backup` run.
    pub async fn run(&self, reuse_backup: bool) -> Result<IngestReport> {
        let started = Instant::now();
        let mut report = IngestReport::default();

        let chunks = match self.reusable_chunks(reuse_backup) {
            Some(chunks) => {
                report.backup_reused = true;
                report.chunks_created = chunks.len();
                chunks
            }
            None => self.compute_chunks(&mut report).await?,
        };

        self.transition(IngestStage::Uploading);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let payloads: Vec<Payload> = chunks.iter().map(chunk_payload).collect();
        if let Err(e) = self.index.add(texts, payloads).await {
            tracing::error!(
                error = %e,
                backup = %self.config.backup_path.display(),
                "upload failed, backup retained"
            );
            return Err(IngestError::UploadFailed {
                backup_path: self.config.backup_path.clone(),
                source: e,
            });
        }
        tracing::info!(chunks = chunks.len(), "chunks uploaded to index");
        remove_backup(&self.config.backup_path);

        self.transition(IngestStage::Done);
        report.elapsed_ms = started.elapsed().as_millis();
        Ok(report)
    }

    fn reusable_chunks(&self, reuse_backup: bool) -> Option<Vec<Chunk>> {
        if !reuse_backup {
            return None;
        }
        match load_backup(&self.config.backup_path) {
            Some(chunks) if chunks.is_empty() => {
                tracing::warn!("backup holds no chunks, recomputing");
                None
            }
            Some(chunks) => {
                self.transition(IngestStage::BackupSaved);
                tracing::info!(chunks = chunks.len(), "reusing chunks from backup");
                Some(chunks)
            }
            None => {
                tracing::warn!(
                    path = %self.config.backup_path.display(),
                    "no usable backup, recomputing"
                );
                None
            }
        }
    }

    async fn compute_chunks(&self, report: &mut IngestReport) -> Result<Vec<Chunk>> {
        self.transition(IngestStage::LoadingDocs);
        let outcome = load_documents(&self.config.documents_dir);
        report.file_errors = outcome.errors;
        if outcome.documents.is_empty() {
            return Err(IngestError::NoDocuments);
        }
        report.documents_loaded = outcome.documents.len();

        self.transition(IngestStage::Chunking);
        let mut per_document = Vec::with_capacity(outcome.documents.len());
        for doc in &outcome.documents {
            let chunks = self.chunker.chunk_document(&doc.content, &doc.name).await?;
            tracing::info!(file = %doc.name, chunks = chunks.len(), "document chunked");
            per_document.push(chunks);
        }

        // Clusters are computed within each document; ids restart at 0 per
        // document, and labeling groups across documents by id.
        self.transition(IngestStage::Clustering);
        for chunks in &mut per_document {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let assignments = self.clusterer.assign(&texts, self.config.n_clusters).await?;
            for (chunk, cluster_id) in chunks.iter_mut().zip(assignments) {
                chunk.metadata.cluster_id = cluster_id;
            }
        }
        let mut chunks: Vec<Chunk> = per_document.into_iter().flatten().collect();
        if chunks.is_empty() {
            return Err(IngestError::NoChunks);
        }
        report.chunks_created = chunks.len();

        self.transition(IngestStage::Labeling);
        let labels = self.labeler.label(&chunks).await;
        report.clusters_labeled = labels.len();
        for chunk in &mut chunks {
            chunk.metadata.cluster_label = labels
                .get(&chunk.metadata.cluster_id)
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());
        }

        tracing::info!(
            documents = report.documents_loaded,
            chunks = chunks.len(),
            clusters = labels.len(),
            "compute phase complete"
        );
        save_backup(&chunks, &self.config.backup_path)?;
        self.transition(IngestStage::BackupSaved);
        Ok(chunks)
    }

    fn transition(&self, stage: IngestStage) {
        tracing::info!(stage = ?stage, "ingest stage");
    }
}

fn chunk_payload(chunk: &Chunk) -> Payload {
    let mut payload = Payload::new();
    payload.insert(
        SOURCE_DOCUMENT_KEY.to_string(),
        Value::from(chunk.metadata.source_document.clone()),
    );
    payload.insert(
        "chunk_index".to_string(),
        Value::from(chunk.metadata.chunk_index),
    );
    payload.insert(
        "cluster_id".to_string(),
        Value::from(chunk.metadata.cluster_id),
    );
    payload.insert(
        "cluster_label".to_string(),
        Value::from(chunk.metadata.cluster_label.clone()),
    );
    payload
}
