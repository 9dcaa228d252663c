//! Error types for the RAG service

use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (bad settings, missing credential)
    #[error("Configuration error: {0}")]
    Config(String),

    /// File extension outside the supported set
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// A supported format that failed to parse
    #[error("Failed to load '{filename}': {message}")]
    FileLoad { filename: String, message: String },

    /// Loading or chunking produced nothing to index
    #[error("Document produced no indexable content: {0}")]
    EmptyDocument(String),

    /// Query text was empty or whitespace
    #[error("Query must not be empty")]
    EmptyQuery,

    /// No persisted index exists yet ("not ready", distinct from no results)
    #[error("No document index available; upload documents first")]
    IndexUnavailable,

    /// Embedding service call failed
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Generation service call failed
    #[error("Answer generation failed: {0}")]
    Generation(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    Index(#[from] docvector_core::DocvectorError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a file load error
    pub fn file_load(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileLoad {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Whether this error is soft at batch granularity: the file is logged
    /// and skipped instead of aborting a whole-corpus scan.
    pub fn is_soft_load_failure(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_) | Self::FileLoad { .. })
    }
}
