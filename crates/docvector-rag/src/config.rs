//! Configuration for the RAG service

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagConfig {
    /// Corpus and index locations
    #[serde(default)]
    pub corpus: CorpusConfig,
    /// Embedding service configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Generation (LLM) configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Corpus and index directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory uploaded documents land in
    pub upload_dir: PathBuf,
    /// Directory the persisted index artifact lives in
    pub index_dir: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docvector");
        Self {
            upload_dir: data_dir.join("uploads"),
            index_dir: data_dir.join("index"),
        }
    }
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of an Ollama-compatible embedding endpoint
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (384 for MiniLM-class models, 768 for larger)
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            timeout_secs: 60,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
        }
    }
}

/// Generation (hosted LLM endpoint) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Inference endpoint base URL
    pub base_url: String,
    /// Model repository id
    pub model: String,
    /// API token; falls back to the HF_TOKEN environment variable
    #[serde(default)]
    pub api_token: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum new tokens to generate
    pub max_new_tokens: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co".to_string(),
            model: "mistralai/Mistral-7B-Instruct-v0.3".to_string(),
            api_token: None,
            temperature: 0.5,
            max_new_tokens: 512,
            timeout_secs: 120,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per query
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

impl RagConfig {
    /// Load configuration from a TOML file, or defaults when absent
    ///
    /// The LLM token is resolved from the file first, then from `HF_TOKEN`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.is_file() => {
                let raw = std::fs::read_to_string(p)?;
                toml::from_str(&raw).map_err(|e| Error::config(e.to_string()))?
            }
            Some(p) => {
                return Err(Error::config(format!(
                    "config file not found: {}",
                    p.display()
                )))
            }
            None => Self::default(),
        };

        if config.llm.api_token.is_none() {
            config.llm.api_token = std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunk_size must be positive"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::config("embedding dimensions must be positive"));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("top_k must be positive"));
        }
        Ok(())
    }
}
