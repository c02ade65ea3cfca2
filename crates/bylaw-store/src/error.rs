use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("qdrant error: {0}")]
    Qdrant(#[from] Box<qdrant_client::QdrantError>),

    #[error(transparent)]
    Embedding(#[from] bylaw_llm::LlmError),

    #[error("payload error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("texts/payloads length mismatch: {texts} texts, {payloads} payloads")]
    Mismatch { texts: usize, payloads: usize },
}

pub type Result<T> = std::result::Result<T, StoreError>;
