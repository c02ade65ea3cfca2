//! Dependency construction from settings.
//!
//! Both subcommands get their provider, index, and component configs built
//! here once at startup and passed down explicitly; nothing is cached in
//! globals.

use std::sync::Arc;

use anyhow::bail;
use bylaw_core::Settings;
use bylaw_ingest::{ChunkerConfig, PipelineConfig};
use bylaw_llm::openai::OpenAiProvider;
use bylaw_rag::RetrieverConfig;
use bylaw_store::{InMemoryIndex, QdrantIndex, VectorIndex};

/// Builds the OpenAI-compatible provider from `[llm]` settings.
///
/// Local inference servers ignore the API key but some insist the header is
/// present; an empty configured key is sent as `"not-needed"`.
#[must_use]
pub fn build_provider(settings: &Settings) -> Arc<OpenAiProvider> {
    let llm = &settings.llm;
    let api_key = if llm.api_key.is_empty() {
        "not-needed".to_string()
    } else {
        llm.api_key.clone()
    };
    Arc::new(
        OpenAiProvider::new(api_key, &llm.base_url, &llm.model)
            .with_embedding_model(&llm.embedding_model)
            .with_temperature(llm.temperature)
            .with_max_tokens(llm.max_tokens),
    )
}

/// Builds the vector index selected by `[index] mode`.
///
/// # Errors
///
/// Returns an error for an unknown mode or when the Qdrant client cannot be
/// constructed from the configured URL.
pub fn build_index(
    settings: &Settings,
    provider: Arc<OpenAiProvider>,
) -> anyhow::Result<Arc<dyn VectorIndex>> {
    match settings.index.mode.as_str() {
        "memory" => Ok(Arc::new(InMemoryIndex::new(provider))),
        "qdrant" => Ok(Arc::new(QdrantIndex::new(
            &settings.index.url,
            settings.index.collection_name.clone(),
            provider,
        )?)),
        other => bail!("unknown index mode {other:?} (expected \"memory\" or \"qdrant\")"),
    }
}

#[must_use]
pub fn pipeline_config(settings: &Settings) -> PipelineConfig {
    PipelineConfig {
        documents_dir: settings.ingest.documents_dir.clone(),
        backup_path: settings.ingest.backup_path.clone(),
        n_clusters: settings.ingest.n_clusters,
        chunker: chunker_config(settings),
    }
}

fn chunker_config(settings: &Settings) -> ChunkerConfig {
    ChunkerConfig {
        chunk_size: settings.chunking.chunk_size,
        min_fragment_len: settings.chunking.min_fragment_len,
        max_chunk_len: settings.chunking.max_chunk_len,
        breakpoint_percentile: settings.chunking.breakpoint_percentile,
        min_document_len: settings.chunking.min_document_len,
    }
}

#[must_use]
pub fn retriever_config(settings: &Settings) -> RetrieverConfig {
    RetrieverConfig {
        top_k: settings.retrieval.top_k,
        distance_threshold: settings.retrieval.distance_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_build_a_memory_index() {
        let settings = Settings::default();
        let provider = build_provider(&settings);
        assert!(build_index(&settings, provider).is_ok());
    }

    #[test]
    fn qdrant_mode_builds_from_valid_url() {
        let mut settings = Settings::default();
        settings.index.mode = "qdrant".into();
        let provider = build_provider(&settings);
        assert!(build_index(&settings, provider).is_ok());
    }

    #[test]
    fn unknown_index_mode_is_rejected() {
        let mut settings = Settings::default();
        settings.index.mode = "chroma".into();
        let provider = build_provider(&settings);
        let err = build_index(&settings, provider).unwrap_err();
        assert!(err.to_string().contains("unknown index mode"));
    }

    #[test]
    fn pipeline_config_mirrors_settings() {
        let mut settings = Settings::default();
        settings.ingest.n_clusters = 9;
        settings.chunking.max_chunk_len = 800;
        let config = pipeline_config(&settings);
        assert_eq!(config.n_clusters, 9);
        assert_eq!(config.chunker.max_chunk_len, 800);
        assert_eq!(config.documents_dir, settings.ingest.documents_dir);
    }

    #[test]
    fn retriever_config_mirrors_settings() {
        let mut settings = Settings::default();
        settings.retrieval.top_k = 3;
        settings.retrieval.distance_threshold = 0.7;
        let config = retriever_config(&settings);
        assert_eq!(config.top_k, 3);
        assert!((config.distance_threshold - 0.7).abs() < f32::EPSILON);
    }
}
