//! Qdrant-backed vector index.

use std::collections::HashMap;
use std::sync::Arc;

use bylaw_llm::LlmProvider;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder, value::Kind,
};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::index::{BoxFuture, Payload, ScoredChunk, VectorIndex};

/// Payload key under which the chunk text itself is stored.
const TEXT_KEY: &str = "text";

/// Persistent index in a Qdrant collection, created lazily with cosine
/// distance and sized from the first embedding the index sees.
pub struct QdrantIndex<P> {
    client: Qdrant,
    provider: Arc<P>,
    collection: String,
}

impl<P> std::fmt::Debug for QdrantIndex<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantIndex")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl<P> QdrantIndex<P> {
    /// Connects to Qdrant at `url`, without touching the collection yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built from the URL.
    pub fn new(url: &str, collection: impl Into<String>, provider: Arc<P>) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Box::new)?;
        Ok(Self {
            client,
            provider,
            collection: collection.into(),
        })
    }

    /// Idempotent: no-op if the collection already exists.
    async fn ensure_collection(&self, vector_size: u64) -> Result<()> {
        if self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(Box::new)?
        {
            return Ok(());
        }
        tracing::info!(
            collection = %self.collection,
            vector_size,
            "creating qdrant collection"
        );
        self.client
            .create_collection(
                CreateCollectionBuilder::new(self.collection.as_str())
                    .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
            )
            .await
            .map_err(Box::new)?;
        Ok(())
    }
}

fn value_to_json(value: qdrant_client::qdrant::Value) -> Option<serde_json::Value> {
    let json = match value.kind? {
        Kind::StringValue(s) => serde_json::Value::String(s),
        Kind::IntegerValue(i) => serde_json::Value::Number(i.into()),
        Kind::DoubleValue(d) => serde_json::Number::from_f64(d).map(serde_json::Value::Number)?,
        Kind::BoolValue(b) => serde_json::Value::Bool(b),
        _ => return None,
    };
    Some(json)
}

impl<P: LlmProvider> VectorIndex for QdrantIndex<P> {
    fn add(&self, texts: Vec<String>, payloads: Vec<Payload>) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if texts.len() != payloads.len() {
                return Err(StoreError::Mismatch {
                    texts: texts.len(),
                    payloads: payloads.len(),
                });
            }
            if texts.is_empty() {
                return Ok(());
            }
            let embeddings = self.provider.embed(&texts).await?;
            let Some(first) = embeddings.first() else {
                return Ok(());
            };
            self.ensure_collection(first.len() as u64).await?;

            let mut points = Vec::with_capacity(texts.len());
            for ((text, payload), vector) in texts.into_iter().zip(payloads).zip(embeddings) {
                let mut object: serde_json::Map<String, serde_json::Value> =
                    payload.into_iter().collect();
                object.insert(TEXT_KEY.to_string(), serde_json::Value::String(text));
                let payload: HashMap<String, qdrant_client::qdrant::Value> =
                    serde_json::from_value(serde_json::Value::Object(object))?;
                points.push(PointStruct::new(Uuid::new_v4().to_string(), vector, payload));
            }

            tracing::debug!(
                collection = %self.collection,
                points = points.len(),
                "upserting points"
            );
            self.client
                .upsert_points(UpsertPointsBuilder::new(self.collection.as_str(), points))
                .await
                .map_err(Box::new)?;
            Ok(())
        })
    }

    fn query(&self, query: &str, top_k: usize) -> BoxFuture<'_, Result<Vec<ScoredChunk>>> {
        let query = query.to_owned();
        Box::pin(async move {
            if top_k == 0 {
                return Ok(Vec::new());
            }
            let embeddings = self.provider.embed(std::slice::from_ref(&query)).await?;
            let Some(vector) = embeddings.into_iter().next() else {
                return Ok(Vec::new());
            };
            let response = self
                .client
                .search_points(
                    SearchPointsBuilder::new(self.collection.as_str(), vector, top_k as u64)
                        .with_payload(true),
                )
                .await
                .map_err(Box::new)?;

            let mut chunks = Vec::with_capacity(response.result.len());
            for point in response.result {
                let mut payload: Payload = point
                    .payload
                    .into_iter()
                    .filter_map(|(k, v)| Some((k, value_to_json(v)?)))
                    .collect();
                let Some(serde_json::Value::String(text)) = payload.remove(TEXT_KEY) else {
                    tracing::warn!("skipping point without text payload");
                    continue;
                };
                // Qdrant scores cosine similarity; callers threshold on distance.
                chunks.push(ScoredChunk {
                    text,
                    payload,
                    distance: 1.0 - point.score,
                });
            }
            Ok(chunks)
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<usize>> {
        Box::pin(async move {
            if !self
                .client
                .collection_exists(&self.collection)
                .await
                .map_err(Box::new)?
            {
                return Ok(0);
            }
            let response = self
                .client
                .count(CountPointsBuilder::new(self.collection.as_str()).exact(true))
                .await
                .map_err(Box::new)?;
            let count = response.result.map_or(0, |r| r.count);
            Ok(usize::try_from(count).unwrap_or(usize::MAX))
        })
    }
}
