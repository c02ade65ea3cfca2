use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings file: {0}")]
    Parse(#[from] Box<toml::de::Error>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub index: IndexSettings,
    pub ingest: IngestSettings,
    pub retrieval: RetrievalSettings,
    pub chunking: ChunkingSettings,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".into(),
            model: "llama3.1:8b".into(),
            embedding_model: "nomic-embed-text".into(),
            api_key: String::new(),
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// `"memory"` or `"qdrant"`.
    pub mode: String,
    pub url: String,
    pub collection_name: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            mode: "memory".into(),
            url: "http://localhost:6334".into(),
            collection_name: "policy_rag_collection".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub documents_dir: PathBuf,
    pub backup_path: PathBuf,
    pub n_clusters: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            documents_dir: "./data/policies".into(),
            backup_path: "./data/chunks_backup.json".into(),
            n_clusters: 6,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub distance_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            distance_threshold: 1.2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub min_fragment_len: usize,
    pub max_chunk_len: usize,
    pub breakpoint_percentile: f64,
    pub min_document_len: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            min_fragment_len: 100,
            max_chunk_len: 1500,
            breakpoint_percentile: 0.85,
            min_document_len: 100,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file with env var overrides.
    ///
    /// Falls back to full defaults when the file does not exist; a partial
    /// file fills the missing fields from defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut settings = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Self>(&content).map_err(Box::new)?
        } else {
            Self::default()
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BYLAW_API_KEY") {
            self.llm.api_key = v;
        }
        if let Ok(v) = std::env::var("BYLAW_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("BYLAW_LLM_MODEL") {
            self.llm.model = v;
        }
    }
}
