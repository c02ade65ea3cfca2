use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

/// Scripted provider for tests.
///
/// Completions are served from a FIFO queue, falling back to a default
/// response once the queue drains. Embeddings come from a per-text map with
/// a default vector for unknown texts, so tests can steer chunk boundaries
/// and retrieval order deterministically.
#[derive(Debug)]
pub struct MockProvider {
    responses: Mutex<VecDeque<String>>,
    default_response: String,
    embeddings: HashMap<String, Vec<f32>>,
    default_embedding: Vec<f32>,
    fail_complete: bool,
    fail_embed: bool,
    complete_calls: AtomicUsize,
    embed_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            default_response: "mock response".to_string(),
            embeddings: HashMap::new(),
            default_embedding: vec![0.0, 0.0, 0.0],
            fail_complete: false,
            fail_embed: false,
            complete_calls: AtomicUsize::new(0),
            embed_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses
            .lock()
            .expect("mock state lock poisoned")
            .push_back(response.into());
        self
    }

    #[must_use]
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    #[must_use]
    pub fn with_embedding(mut self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.embeddings.insert(text.into(), embedding);
        self
    }

    #[must_use]
    pub fn with_default_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.default_embedding = embedding;
        self
    }

    #[must_use]
    pub fn failing_complete(mut self) -> Self {
        self.fail_complete = true;
        self
    }

    #[must_use]
    pub fn failing_embed(mut self) -> Self {
        self.fail_embed = true;
        self
    }

    #[must_use]
    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Full text of every prompt seen by `complete`, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .expect("mock state lock poisoned")
            .clone()
    }
}

impl LlmProvider for MockProvider {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts
            .lock()
            .expect("mock state lock poisoned")
            .push(prompt);

        if self.fail_complete {
            return Err(LlmError::Other("mock complete failure".to_string()));
        }
        let response = self
            .responses
            .lock()
            .expect("mock state lock poisoned")
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone());
        Ok(response)
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embed {
            return Err(LlmError::Other("mock embed failure".to_string()));
        }
        Ok(texts
            .iter()
            .map(|t| {
                self.embeddings
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| self.default_embedding.clone())
            })
            .collect())
    }

    fn supports_embeddings(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "mock"
    }
}
