use std::collections::HashMap;
use std::pin::Pin;

use crate::error::Result;

/// Flat metadata attached to a stored chunk.
pub type Payload = HashMap<String, serde_json::Value>;

/// Payload key holding the originating document's file name. Writers and
/// readers of the index share this so source attribution survives storage.
pub const SOURCE_DOCUMENT_KEY: &str = "source_document";

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One retrieval hit: the stored text, its metadata, and the cosine distance
/// from the query (0 = identical direction, 2 = opposite).
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredChunk {
    pub text: String,
    pub payload: Payload,
    pub distance: f32,
}

/// A searchable store of embedded texts.
///
/// Implementations embed index-side: callers hand over raw text and the
/// backend computes vectors itself, so ingestion and retrieval are guaranteed
/// to use the same embedding model.
pub trait VectorIndex: std::fmt::Debug + Send + Sync {
    /// Embeds and stores `texts` with their payloads, one payload per text.
    ///
    /// # Errors
    ///
    /// Returns an error if the lengths differ, embedding fails, or the
    /// backend rejects the write.
    fn add(&self, texts: Vec<String>, payloads: Vec<Payload>) -> BoxFuture<'_, Result<()>>;

    /// Embeds `query` and returns up to `top_k` nearest chunks, closest first.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails or the backend search fails.
    fn query(&self, query: &str, top_k: usize) -> BoxFuture<'_, Result<Vec<ScoredChunk>>>;

    /// Number of stored chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn count(&self) -> BoxFuture<'_, Result<usize>>;
}
