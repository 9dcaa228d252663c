//! Error types for the vector index core

use thiserror::Error;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, DocvectorError>;

/// Vector index errors
#[derive(Debug, Error)]
pub enum DocvectorError {
    /// Vector dimension does not match the index
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Index was constructed with zero dimensions
    #[error("Invalid index dimensions: {0}")]
    InvalidDimensions(usize),

    /// Persisted artifact is missing or unreadable
    #[error("Index artifact not found at '{0}'")]
    ArtifactNotFound(String),

    /// Persisted artifact failed an integrity check
    #[error("Corrupt index artifact: {0}")]
    Corrupt(String),

    /// Artifact was written by a newer, incompatible layout
    #[error("Incompatible index format: found version {found}, supported up to {supported}")]
    IncompatibleFormat { found: u32, supported: u32 },

    /// Serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocvectorError {
    /// Create a corrupt-artifact error
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}
