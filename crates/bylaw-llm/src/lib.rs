//! LLM provider abstraction: chat completion plus batch embedding.

pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod provider;

pub use error::LlmError;
pub use openai::OpenAiProvider;
pub use provider::{LlmProvider, Message, Role};
