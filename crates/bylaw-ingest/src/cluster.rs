//! Agglomerative topic clustering over chunk embeddings.

use std::sync::Arc;

use bylaw_llm::LlmProvider;

use crate::chunker::cosine_distance;
use crate::error::Result;

/// Average-linkage agglomerative clustering cut at `n_clusters` flat
/// clusters.
///
/// Returns one cluster id per embedding, numbered by first appearance in
/// input order starting at 0. `n_clusters` is clamped to `1..=n`. Ties on
/// merge distance resolve to the earliest cluster pair, so output is
/// deterministic for identical input.
#[must_use]
pub fn average_linkage_clusters(embeddings: &[Vec<f32>], n_clusters: usize) -> Vec<usize> {
    let n = embeddings.len();
    if n == 0 {
        return Vec::new();
    }
    let target = n_clusters.clamp(1, n);

    let mut clusters: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    while clusters.len() > target {
        let mut best = (0, 1);
        let mut best_distance = f64::INFINITY;
        for i in 0..clusters.len() {
            for j in (i + 1)..clusters.len() {
                let d = average_distance(&clusters[i], &clusters[j], embeddings);
                if d < best_distance {
                    best_distance = d;
                    best = (i, j);
                }
            }
        }
        let (i, j) = best;
        let merged = clusters.remove(j);
        clusters[i].extend(merged);
    }

    // Renumber cluster slots in order of first appearance.
    let mut assignment = vec![0usize; n];
    for (slot, members) in clusters.iter().enumerate() {
        for &point in members {
            assignment[point] = slot;
        }
    }
    let mut remap: Vec<Option<usize>> = vec![None; clusters.len()];
    let mut next = 0;
    let mut labels = vec![0usize; n];
    for (point, label) in labels.iter_mut().enumerate() {
        let slot = assignment[point];
        *label = match remap[slot] {
            Some(id) => id,
            None => {
                let id = next;
                remap[slot] = Some(id);
                next += 1;
                id
            }
        };
    }
    labels
}

// Naive O(n^3) linkage; chunk counts per run are small.
#[expect(clippy::cast_precision_loss)]
fn average_distance(a: &[usize], b: &[usize], embeddings: &[Vec<f32>]) -> f64 {
    let mut total = 0.0f64;
    for &x in a {
        for &y in b {
            total += f64::from(cosine_distance(&embeddings[x], &embeddings[y]));
        }
    }
    total / (a.len() * b.len()) as f64
}

/// Groups chunk texts into topical clusters via their embeddings.
pub struct TopicClusterer<P> {
    provider: Arc<P>,
}

impl<P> std::fmt::Debug for TopicClusterer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicClusterer").finish_non_exhaustive()
    }
}

impl<P: LlmProvider> TopicClusterer<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Assigns a cluster id to each text.
    ///
    /// Fewer than two texts short-circuit to id 0 for everything without
    /// calling the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails.
    pub async fn assign(&self, texts: &[String], n_clusters: usize) -> Result<Vec<usize>> {
        if texts.len() < 2 {
            return Ok(vec![0; texts.len()]);
        }
        let embeddings = self.provider.embed(texts).await?;
        Ok(average_linkage_clusters(&embeddings, n_clusters))
    }
}
