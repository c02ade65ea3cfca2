use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error(transparent)]
    Llm(#[from] bylaw_llm::LlmError),

    #[error(transparent)]
    Store(#[from] bylaw_store::StoreError),
}

pub type Result<T> = std::result::Result<T, RagError>;
