//! Threshold-gated nearest-neighbor retrieval with source attribution.

use std::cmp::Ordering;
use std::sync::Arc;

use bylaw_store::{SOURCE_DOCUMENT_KEY, VectorIndex};

use crate::error::Result;

#[derive(Clone, Debug)]
pub struct RetrieverConfig {
    /// Maximum chunks fetched from the index per question.
    pub top_k: usize,
    /// Cosine-distance cutoff; chunks farther than this are discarded even
    /// when `top_k` has room.
    pub distance_threshold: f32,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            distance_threshold: 1.2,
        }
    }
}

/// A chunk that passed retrieval, with the document it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievedDocument {
    pub text: String,
    pub source: String,
    pub distance: f32,
}

pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    config: RetrieverConfig,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Retriever {
    #[must_use]
    pub fn new(index: Arc<dyn VectorIndex>, config: RetrieverConfig) -> Self {
        Self { index, config }
    }

    /// Chunks relevant to `question`, closest first.
    ///
    /// Fetches up to `top_k` nearest chunks, then drops anything beyond the
    /// distance threshold and anything that lost its source attribution in
    /// storage. An empty result means no stored chunk is close enough.
    ///
    /// # Errors
    ///
    /// Returns an error if query embedding or the index search fails.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedDocument>> {
        let mut hits = self.index.query(question, self.config.top_k).await?;
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));

        let mut documents = Vec::new();
        for hit in hits {
            if hit.distance > self.config.distance_threshold {
                continue;
            }
            let Some(source) = hit
                .payload
                .get(SOURCE_DOCUMENT_KEY)
                .and_then(|value| value.as_str())
            else {
                tracing::warn!(distance = hit.distance, "dropping hit without source attribution");
                continue;
            };
            let source = source.to_string();
            documents.push(RetrievedDocument {
                text: hit.text,
                source,
                distance: hit.distance,
            });
        }
        tracing::debug!(kept = documents.len(), "retrieval complete");
        Ok(documents)
    }
}
