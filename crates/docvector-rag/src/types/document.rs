//! Document, segment, and chunk types with source tracking

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported document formats
///
/// Resolved once from the file extension at ingestion time; everything else
/// is `Unknown` and routed to the soft-failure path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// PDF document
    Pdf,
    /// Plain text file
    Text,
    /// Microsoft Word document (.docx)
    Word,
    /// Markdown file
    Markdown,
    /// Unrecognized extension
    Unknown,
}

impl DocumentFormat {
    /// Detect format from a file path's extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self::from_extension(&ext)
    }

    /// Detect format from an extension string (without the dot)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Text,
            "docx" => Self::Word,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Check if this format can be loaded
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Extensions scanned for during whole-corpus ingestion
    pub fn supported_extensions() -> &'static [&'static str] {
        &["pdf", "txt", "docx", "md"]
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Text => "Text File",
            Self::Word => "Word Document (.docx)",
            Self::Markdown => "Markdown",
            Self::Unknown => "Unknown",
        }
    }
}

/// A span of text extracted from a document by the loader
///
/// Transient: consumed by the chunker immediately, never persisted.
#[derive(Debug, Clone)]
pub struct LoadedSegment {
    /// Extracted text
    pub content: String,
    /// Where the text came from
    pub source: ChunkSource,
}

/// Source information carried from segment to chunk to citation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Original filename as uploaded
    pub filename: String,
    /// Document format
    pub format: DocumentFormat,
    /// Page number (1-indexed, PDFs)
    pub page_number: Option<u32>,
    /// Total pages in the document
    pub page_count: Option<u32>,
    /// Section title (Markdown headings)
    pub section: Option<String>,
    /// SHA-256 hash of the document content
    pub content_hash: Option<String>,
}

impl ChunkSource {
    /// Source info for a single-segment document
    pub fn whole_file(filename: String, format: DocumentFormat) -> Self {
        Self {
            filename,
            format,
            page_number: None,
            page_count: None,
            section: None,
            content_hash: None,
        }
    }

    /// Source info for one page of a paginated document
    pub fn page(filename: String, format: DocumentFormat, page: u32, page_count: u32) -> Self {
        Self {
            filename,
            format,
            page_number: Some(page),
            page_count: Some(page_count),
            section: None,
            content_hash: None,
        }
    }

    /// Format source for display in attributions
    pub fn format_citation(&self) -> String {
        let mut parts = vec![self.filename.clone()];

        if let Some(page) = self.page_number {
            match self.page_count {
                Some(total) => parts.push(format!("Page {}/{}", page, total)),
                None => parts.push(format!("Page {}", page)),
            }
        }

        if let Some(section) = &self.section {
            parts.push(format!("Section: {}", section));
        }

        parts.join(", ")
    }
}

/// A bounded-length piece of a loaded segment, the atomic retrieval unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk id
    pub id: Uuid,
    /// Text content, including the leading overlap
    pub content: String,
    /// Source information inherited from the segment
    pub source: ChunkSource,
    /// Chunk index within the document
    pub chunk_index: u32,
    /// Number of leading characters shared with the previous chunk
    pub overlap: usize,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(content: String, source: ChunkSource, chunk_index: u32, overlap: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            source,
            chunk_index,
            overlap,
        }
    }

    /// Convert to index metadata for storage
    pub fn to_vector_metadata(&self) -> HashMap<String, serde_json::Value> {
        let mut meta = HashMap::new();
        meta.insert("chunk_id".to_string(), serde_json::json!(self.id.to_string()));
        meta.insert("content".to_string(), serde_json::json!(self.content));
        meta.insert("filename".to_string(), serde_json::json!(self.source.filename));
        meta.insert("format".to_string(), serde_json::json!(self.source.format));
        meta.insert("chunk_index".to_string(), serde_json::json!(self.chunk_index));
        meta.insert("overlap".to_string(), serde_json::json!(self.overlap));

        if let Some(page) = self.source.page_number {
            meta.insert("page_number".to_string(), serde_json::json!(page));
        }
        if let Some(total) = self.source.page_count {
            meta.insert("page_count".to_string(), serde_json::json!(total));
        }
        if let Some(section) = &self.source.section {
            meta.insert("section".to_string(), serde_json::json!(section));
        }
        if let Some(hash) = &self.source.content_hash {
            meta.insert("content_hash".to_string(), serde_json::json!(hash));
        }

        meta
    }

    /// Rebuild a chunk from index metadata
    pub fn from_vector_metadata(metadata: &HashMap<String, serde_json::Value>) -> Self {
        let id = metadata
            .get("chunk_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        let content = metadata
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let filename = metadata
            .get("filename")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        let format = metadata
            .get("format")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or(DocumentFormat::Unknown);

        let source = ChunkSource {
            filename,
            format,
            page_number: metadata
                .get("page_number")
                .and_then(|v| v.as_u64())
                .map(|p| p as u32),
            page_count: metadata
                .get("page_count")
                .and_then(|v| v.as_u64())
                .map(|p| p as u32),
            section: metadata
                .get("section")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            content_hash: metadata
                .get("content_hash")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        };

        Self {
            id,
            content,
            source,
            chunk_index: metadata
                .get("chunk_index")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            overlap: metadata
                .get("overlap")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as usize,
        }
    }
}
