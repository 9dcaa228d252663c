//! docvector-rag: document question-answering with source attribution
//!
//! Ingests PDF, text, Word, and Markdown documents into a persistent vector
//! index (docvector-core) and answers natural-language questions by
//! retrieving the closest chunks and conditioning a hosted language model
//! on them. Embedding and generation are opaque services behind provider
//! traits; the index snapshot is versioned and swapped atomically.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use config::RagConfig;
pub use engine::QueryEngine;
pub use error::{Error, Result};
pub use ingestion::IngestPipeline;
pub use retrieval::IndexStore;
pub use types::{
    Chunk, ChunkSource, DocumentFormat, IngestReport, LoadedSegment, QueryResponse,
    SourceAttribution,
};

/// Re-export the index core for convenience
pub use docvector_core;
