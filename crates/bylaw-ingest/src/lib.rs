//! Document ingestion: semantic chunking, topic clustering, labeling, and
//! upload into a vector index with crash-safe backup between the two.

pub mod backup;
pub mod chunker;
pub mod cluster;
pub mod error;
pub mod labeler;
pub mod loader;
pub mod pipeline;
pub mod types;

pub use chunker::{ChunkerConfig, SemanticChunker};
pub use cluster::TopicClusterer;
pub use error::IngestError;
pub use labeler::ClusterLabeler;
pub use pipeline::{IngestPipeline, PipelineConfig};
pub use types::{Chunk, ChunkMetadata, IngestReport, IngestStage};
