//! Core domain types

pub mod document;
pub mod response;

pub use document::{Chunk, ChunkSource, DocumentFormat, LoadedSegment};
pub use response::{IngestReport, QueryResponse, SourceAttribution};
