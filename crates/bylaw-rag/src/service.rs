//! Grounded question answering.

use std::sync::Arc;

use bylaw_llm::{LlmProvider, Message};

use crate::context::format_context;
use crate::error::Result;
use crate::retriever::Retriever;

/// Returned verbatim when no stored chunk is close enough to the question.
const NO_CONTEXT_ANSWER: &str =
    "I couldn't find any relevant information to answer your question.";

/// An answer with the documents that grounded it.
#[derive(Clone, Debug, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Distinct source documents in retrieval-rank order.
    pub sources: Vec<String>,
    /// Chunks that made it into the prompt.
    pub documents_used: usize,
}

/// Answers questions strictly from retrieved policy chunks.
pub struct RagService<P> {
    provider: Arc<P>,
    retriever: Retriever,
}

impl<P> std::fmt::Debug for RagService<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagService")
            .field("retriever", &self.retriever)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> RagService<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, retriever: Retriever) -> Self {
        Self { provider, retriever }
    }

    /// Retrieves relevant chunks and asks the LLM to answer from them alone.
    ///
    /// With no chunk within the distance threshold the LLM is never called;
    /// a fixed fallback answer with no sources comes back instead.
    ///
    /// # Errors
    ///
    /// Returns an error if retrieval or the completion fails.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let documents = self.retriever.retrieve(question).await?;
        if documents.is_empty() {
            tracing::info!("no chunks within threshold, returning fallback answer");
            return Ok(Answer {
                text: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
                documents_used: 0,
            });
        }

        let context = format_context(&documents);
        let prompt = format!(
            "Answer the question using ONLY the policy documents below. \
             Do not use external knowledge.\n\n\
             If the documents don't contain enough information, say: \
             \"I don't have enough information in these policies to answer fully.\"\n\n\
             Always quote specific numbers, dates, and requirements exactly as written.\n\n\
             Policy Documents:\n{context}\n\nQuestion: {question}\n\nAnswer:"
        );
        let text = self.provider.complete(&[Message::user(prompt)]).await?;

        let mut sources = Vec::new();
        for doc in &documents {
            if !sources.contains(&doc.source) {
                sources.push(doc.source.clone());
            }
        }
        tracing::info!(
            documents = documents.len(),
            sources = sources.len(),
            "answer generated"
        );
        Ok(Answer {
            text: text.trim().to_string(),
            sources,
            documents_used: documents.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use bylaw_llm::mock::MockProvider;
    use bylaw_store::{InMemoryIndex, Payload, SOURCE_DOCUMENT_KEY, VectorIndex};
    use serde_json::Value;

    use super::*;
    use crate::retriever::RetrieverConfig;

    const QUESTION: &str = "How many vacation days?";

    fn payload(source: &str) -> Payload {
        let mut p = Payload::new();
        p.insert(SOURCE_DOCUMENT_KEY.to_string(), Value::from(source));
        p
    }

    async fn seeded_index(entries: Vec<(&str, &str, Vec<f32>)>) -> Arc<dyn VectorIndex> {
        let mut provider = MockProvider::new().with_embedding(QUESTION, vec![1.0, 0.0]);
        for (text, _, embedding) in &entries {
            provider = provider.with_embedding(*text, embedding.clone());
        }
        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryIndex::new(Arc::new(provider)));
        let (texts, payloads): (Vec<String>, Vec<Payload>) = entries
            .into_iter()
            .map(|(text, source, _)| (text.to_string(), payload(source)))
            .unzip();
        index.add(texts, payloads).await.unwrap();
        index
    }

    fn make_service(
        provider: Arc<MockProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> RagService<MockProvider> {
        RagService::new(provider, Retriever::new(index, RetrieverConfig::default()))
    }

    #[tokio::test]
    async fn no_relevant_chunks_yields_fallback_without_llm_call() {
        let provider = Arc::new(MockProvider::new());
        let index: Arc<dyn VectorIndex> =
            Arc::new(InMemoryIndex::new(Arc::new(MockProvider::new())));
        let service = make_service(Arc::clone(&provider), index);

        let answer = service.answer(QUESTION).await.unwrap();
        assert_eq!(
            answer.text,
            "I couldn't find any relevant information to answer your question."
        );
        assert!(answer.sources.is_empty());
        assert_eq!(answer.documents_used, 0);
        assert_eq!(provider.complete_calls(), 0);
    }

    #[tokio::test]
    async fn prompt_contains_sources_chunks_and_question() {
        let index = seeded_index(vec![(
            "Vacation accrues at 1.5 days per month.",
            "leave.txt",
            vec![1.0, 0.0],
        )])
        .await;
        let provider = Arc::new(MockProvider::new().with_response("1.5 days per month."));
        let service = make_service(Arc::clone(&provider), index);

        let answer = service.answer(QUESTION).await.unwrap();
        assert_eq!(answer.text, "1.5 days per month.");
        assert_eq!(answer.sources, vec!["leave.txt".to_string()]);
        assert_eq!(answer.documents_used, 1);

        let prompt = provider.prompts().remove(0);
        assert!(prompt.starts_with("Answer the question using ONLY"));
        assert!(prompt.contains("[Source: leave.txt]"));
        assert!(prompt.contains("Vacation accrues at 1.5 days per month."));
        assert!(prompt.contains("Question: How many vacation days?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[tokio::test]
    async fn sources_deduplicate_in_rank_order() {
        let index = seeded_index(vec![
            ("Vacation accrues monthly.", "leave.txt", vec![1.0, 0.0]),
            ("Unused days carry over.", "leave.txt", vec![0.95, 0.05]),
            ("Receipts are required.", "expenses.txt", vec![0.9, 0.1]),
        ])
        .await;
        let provider = Arc::new(MockProvider::new());
        let service = make_service(Arc::clone(&provider), index);

        let answer = service.answer(QUESTION).await.unwrap();
        assert_eq!(
            answer.sources,
            vec!["leave.txt".to_string(), "expenses.txt".to_string()]
        );
        assert_eq!(answer.documents_used, 3);
    }

    #[tokio::test]
    async fn completion_failure_propagates() {
        let index = seeded_index(vec![(
            "Vacation accrues monthly.",
            "leave.txt",
            vec![1.0, 0.0],
        )])
        .await;
        let provider = Arc::new(MockProvider::new().failing_complete());
        let service = make_service(provider, index);

        let err = service.answer(QUESTION).await.unwrap_err();
        assert!(matches!(err, crate::error::RagError::Llm(_)));
    }

    #[tokio::test]
    async fn answer_text_is_trimmed() {
        let index = seeded_index(vec![(
            "Vacation accrues monthly.",
            "leave.txt",
            vec![1.0, 0.0],
        )])
        .await;
        let provider = Arc::new(MockProvider::new().with_response("  20 days.\n"));
        let service = make_service(provider, index);

        let answer = service.answer(QUESTION).await.unwrap();
        assert_eq!(answer.text, "20 days.");
    }
}
