use std::cmp::Ordering;
use std::sync::Arc;

use bylaw_llm::LlmProvider;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::index::{BoxFuture, Payload, ScoredChunk, VectorIndex};

/// Process-local index backed by a `Vec`, with brute-force cosine search.
///
/// Useful for tests and for trying the pipeline without a Qdrant instance.
/// Contents are lost when the process exits.
pub struct InMemoryIndex<P> {
    provider: Arc<P>,
    points: RwLock<Vec<StoredPoint>>,
}

struct StoredPoint {
    vector: Vec<f32>,
    text: String,
    payload: Payload,
}

impl<P> InMemoryIndex<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            points: RwLock::new(Vec::new()),
        }
    }
}

impl<P> std::fmt::Debug for InMemoryIndex<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex").finish_non_exhaustive()
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

impl<P: LlmProvider> VectorIndex for InMemoryIndex<P> {
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
            let mut points = self.points.write().await;
            for ((text, payload), vector) in texts.into_iter().zip(payloads).zip(embeddings) {
                points.push(StoredPoint {
                    vector,
                    text,
                    payload,
                });
            }
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
            let Some(query_vector) = embeddings.first() else {
                return Ok(Vec::new());
            };
            let points = self.points.read().await;
            let mut scored: Vec<ScoredChunk> = points
                .iter()
                .map(|p| ScoredChunk {
                    text: p.text.clone(),
                    payload: p.payload.clone(),
                    distance: cosine_distance(query_vector, &p.vector),
                })
                .collect();
            scored.sort_by(|a, b| {
                a.distance
                    .partial_cmp(&b.distance)
                    .unwrap_or(Ordering::Equal)
            });
            scored.truncate(top_k);
            Ok(scored)
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<usize>> {
        Box::pin(async move { Ok(self.points.read().await.len()) })
    }
}

#[cfg(test)]
mod tests {
    use bylaw_llm::mock::MockProvider;

    use super::*;

    fn payload_for(source: &str) -> Payload {
        let mut payload = Payload::new();
        payload.insert("source_document".to_string(), source.into());
        payload
    }

    #[tokio::test]
    async fn query_returns_nearest_first() {
        let provider = Arc::new(
            MockProvider::new()
                .with_embedding("leave policy", vec![1.0, 0.0])
                .with_embedding("expense policy", vec![0.0, 1.0])
                .with_embedding("vacation rules", vec![0.9, 0.1])
                .with_embedding("how much leave?", vec![1.0, 0.05]),
        );
        let index = InMemoryIndex::new(provider);

        index
            .add(
                vec![
                    "leave policy".to_string(),
                    "expense policy".to_string(),
                    "vacation rules".to_string(),
                ],
                vec![
                    payload_for("hr.txt"),
                    payload_for("finance.txt"),
                    payload_for("hr.txt"),
                ],
            )
            .await
            .unwrap();

        let hits = index.query("how much leave?", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "leave policy");
        assert_eq!(hits[1].text, "vacation rules");
        assert!(hits[0].distance < hits[1].distance);
        assert_eq!(
            hits[0].payload.get("source_document"),
            Some(&serde_json::Value::from("hr.txt"))
        );
    }

    #[tokio::test]
    async fn mismatched_lengths_are_rejected() {
        let index = InMemoryIndex::new(Arc::new(MockProvider::new()));
        let err = index
            .add(vec!["a".to_string()], vec![])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Mismatch {
                texts: 1,
                payloads: 0
            }
        ));
    }

    #[tokio::test]
    async fn empty_add_skips_embedding() {
        let provider = Arc::new(MockProvider::new());
        let index = InMemoryIndex::new(Arc::clone(&provider));
        index.add(vec![], vec![]).await.unwrap();
        assert_eq!(provider.embed_calls(), 0);
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn zero_norm_vectors_score_unit_distance() {
        let provider = Arc::new(
            MockProvider::new()
                .with_default_embedding(vec![0.0, 0.0])
                .with_embedding("q", vec![1.0, 0.0]),
        );
        let index = InMemoryIndex::new(provider);
        index
            .add(vec!["blank".to_string()], vec![Payload::new()])
            .await
            .unwrap();

        let hits = index.query("q", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].distance - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn count_tracks_additions() {
        let index = InMemoryIndex::new(Arc::new(MockProvider::new()));
        assert_eq!(index.count().await.unwrap(), 0);
        index
            .add(
                vec!["a".to_string(), "b".to_string()],
                vec![Payload::new(), Payload::new()],
            )
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 2);
    }
}
