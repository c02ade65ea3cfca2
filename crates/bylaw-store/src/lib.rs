//! Vector index abstraction with in-memory and Qdrant-backed implementations.

pub mod error;
pub mod in_memory;
pub mod index;
pub mod qdrant;

pub use error::StoreError;
pub use in_memory::InMemoryIndex;
pub use index::{BoxFuture, Payload, SOURCE_DOCUMENT_KEY, ScoredChunk, VectorIndex};
pub use qdrant::QdrantIndex;
