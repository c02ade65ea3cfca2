//! Question answering grounded in retrieved policy chunks.

pub mod context;
pub mod error;
pub mod retriever;
pub mod service;

pub use context::format_context;
pub use error::RagError;
pub use retriever::{RetrievedDocument, Retriever, RetrieverConfig};
pub use service::{Answer, RagService};
