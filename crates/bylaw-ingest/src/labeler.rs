//! Human-readable topic labels for chunk clusters.

use std::collections::BTreeMap;
use std::sync::Arc;

use bylaw_llm::{LlmProvider, Message};

/// Per-cluster cap on the characters sent to the labeling prompt.
const LABEL_INPUT_BUDGET: usize = 3000;

/// Names each cluster by asking the LLM to summarize its combined text.
pub struct ClusterLabeler<P> {
    provider: Arc<P>,
}

impl<P> std::fmt::Debug for ClusterLabeler<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterLabeler").finish_non_exhaustive()
    }
}

impl<P: LlmProvider> ClusterLabeler<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Produces one label per distinct `cluster_id` among `chunks`.
    ///
    /// Labeling is best-effort: a failed or empty completion falls back to
    /// `cluster_{id}` for that cluster alone, so one bad call never sinks an
    /// ingest run.
    pub async fn label(&self, chunks: &[crate::types::Chunk]) -> BTreeMap<usize, String> {
        let mut groups: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        for chunk in chunks {
            groups
                .entry(chunk.metadata.cluster_id)
                .or_default()
                .push(chunk.text.as_str());
        }

        let mut labels = BTreeMap::new();
        for (cluster_id, texts) in groups {
            let combined: String = texts.join(" ").chars().take(LABEL_INPUT_BUDGET).collect();
            let prompt = format!(
                "Summarize what this text is about in 5 words or less. \
                 Be specific to the policy topic.\n\n{combined}"
            );
            let label = match self.provider.complete(&[Message::user(prompt)]).await {
                Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
                Ok(_) => {
                    tracing::warn!(cluster_id, "empty label from provider, using fallback");
                    format!("cluster_{cluster_id}")
                }
                Err(e) => {
                    tracing::error!(
                        cluster_id,
                        error = %e,
                        "cluster labeling failed, using fallback"
                    );
                    format!("cluster_{cluster_id}")
                }
            };
            tracing::info!(cluster_id, label = %label, "cluster labeled");
            labels.insert(cluster_id, label);
        }
        labels
    }
}
