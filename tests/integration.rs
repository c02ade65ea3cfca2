//! End-to-end flows over the in-memory index: ingest then ask, and recovery
//! from a failed upload through the chunk backup.

use std::sync::Arc;

use bylaw_ingest::{ChunkerConfig, IngestPipeline, PipelineConfig};
use bylaw_llm::mock::MockProvider;
use bylaw_rag::{RagService, Retriever, RetrieverConfig};
use bylaw_store::{InMemoryIndex, VectorIndex};
use tempfile::TempDir;

const LEAVE_POLICY: &str = "Employees receive 25 days of annual leave per year.";
const EXPENSE_POLICY: &str = "Meal expenses are capped at 40 euros per travel day.";
const QUESTION: &str = "How many days of annual leave do I get?";

/// Two short policy files in a fresh directory, with the backup parked
/// alongside them.
fn write_policies(dir: &TempDir) -> PipelineConfig {
    let documents_dir = dir.path().join("policies");
    std::fs::create_dir(&documents_dir).unwrap();
    std::fs::write(documents_dir.join("leave.txt"), LEAVE_POLICY).unwrap();
    std::fs::write(documents_dir.join("expenses.txt"), EXPENSE_POLICY).unwrap();
    PipelineConfig {
        documents_dir,
        backup_path: dir.path().join("chunks_backup.json"),
        n_clusters: 2,
        chunker: ChunkerConfig::default(),
    }
}

/// Embeddings that put the leave policy much closer to the question than the
/// expense policy.
fn provider_with_policies() -> MockProvider {
    MockProvider::new()
        .with_embedding(LEAVE_POLICY, vec![1.0, 0.0])
        .with_embedding(EXPENSE_POLICY, vec![0.0, 1.0])
        .with_embedding(QUESTION, vec![0.9, 0.1])
}

#[tokio::test]
async fn ingest_then_ask_round_trip() {
    let dir = TempDir::new().unwrap();
    let config = write_policies(&dir);
    let backup_path = config.backup_path.clone();

    // First completion labels the single cluster, second answers the question.
    let provider = Arc::new(
        provider_with_policies()
            .with_response("Leave And Expenses")
            .with_response("You get 25 days of annual leave per year."),
    );
    let index: Arc<dyn VectorIndex> = Arc::new(InMemoryIndex::new(Arc::clone(&provider)));

    let pipeline = IngestPipeline::new(Arc::clone(&provider), Arc::clone(&index), config);
    let report = pipeline.run(false).await.unwrap();

    assert_eq!(report.documents_loaded, 2);
    assert_eq!(report.chunks_created, 2);
    assert_eq!(report.clusters_labeled, 1);
    assert!(!report.backup_reused);
    assert!(report.file_errors.is_empty());
    assert_eq!(index.count().await.unwrap(), 2);
    assert!(!backup_path.exists());

    let retriever = Retriever::new(Arc::clone(&index), RetrieverConfig::default());
    let service = RagService::new(Arc::clone(&provider), retriever);
    let answer = service.answer(QUESTION).await.unwrap();

    assert_eq!(answer.text, "You get 25 days of annual leave per year.");
    assert_eq!(answer.sources, vec!["leave.txt", "expenses.txt"]);
    assert_eq!(answer.documents_used, 2);
}

#[tokio::test]
async fn failed_upload_recovers_through_backup() {
    let dir = TempDir::new().unwrap();
    let config = write_policies(&dir);
    let backup_path = config.backup_path.clone();

    let pipeline_provider = Arc::new(provider_with_policies().with_response("Company Policies"));
    let broken_index: Arc<dyn VectorIndex> = Arc::new(InMemoryIndex::new(Arc::new(
        MockProvider::new().failing_embed(),
    )));

    let pipeline = IngestPipeline::new(
        Arc::clone(&pipeline_provider),
        broken_index,
        config.clone(),
    );
    let err = pipeline.run(false).await.unwrap_err();
    assert!(err.to_string().contains("--reuse-backup"));
    assert!(backup_path.exists());

    // Retry against a healthy index; the compute phase is skipped entirely.
    let retry_provider = Arc::new(provider_with_policies());
    let index: Arc<dyn VectorIndex> = Arc::new(InMemoryIndex::new(Arc::clone(&retry_provider)));
    let pipeline = IngestPipeline::new(Arc::clone(&retry_provider), Arc::clone(&index), config);
    let report = pipeline.run(true).await.unwrap();

    assert!(report.backup_reused);
    assert_eq!(report.chunks_created, 2);
    assert_eq!(retry_provider.complete_calls(), 0);
    assert_eq!(index.count().await.unwrap(), 2);
    assert!(!backup_path.exists());
}

#[tokio::test]
async fn ask_without_ingested_documents_answers_with_fallback() {
    let provider = Arc::new(MockProvider::new().with_embedding(QUESTION, vec![0.9, 0.1]));
    let index: Arc<dyn VectorIndex> = Arc::new(InMemoryIndex::new(Arc::clone(&provider)));

    let retriever = Retriever::new(index, RetrieverConfig::default());
    let service = RagService::new(Arc::clone(&provider), retriever);
    let answer = service.answer(QUESTION).await.unwrap();

    assert!(answer.text.contains("couldn't find any relevant information"));
    assert!(answer.sources.is_empty());
    assert_eq!(answer.documents_used, 0);
    assert_eq!(provider.complete_calls(), 0);
}
