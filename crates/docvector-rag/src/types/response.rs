//! Response types for queries and ingestion

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{Chunk, ChunkSource};

/// Maximum characters shown in a source preview
const PREVIEW_MAX_CHARS: usize = 200;

/// A source attributed to an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAttribution {
    /// Chunk the answer drew on
    pub chunk_id: Uuid,
    /// First 200 characters of the chunk, ellipsis-appended if truncated
    pub preview: String,
    /// Source metadata
    pub source: ChunkSource,
    /// Distance between query and chunk (lower is closer)
    pub distance: f32,
}

impl SourceAttribution {
    /// Create an attribution from a retrieved chunk
    pub fn from_chunk(chunk: &Chunk, distance: f32) -> Self {
        Self {
            chunk_id: chunk.id,
            preview: truncate_preview(&chunk.content, PREVIEW_MAX_CHARS),
            source: chunk.source.clone(),
            distance,
        }
    }

    /// Render the attribution as a single display string
    pub fn display(&self) -> String {
        format!("{} — {}", self.source.format_citation(), self.preview)
    }
}

/// Truncate text to `max_chars` characters at a char boundary
fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

/// Response from a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer, trimmed
    pub answer: String,
    /// Attributed sources, in retrieval order
    pub sources: Vec<SourceAttribution>,
}

impl QueryResponse {
    /// Attribution strings in the shape the transport layer returns
    pub fn source_strings(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.display()).collect()
    }
}

/// Outcome summary of an ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Files that contributed chunks
    pub files_processed: Vec<String>,
    /// Files skipped with the reason (batch runs only)
    pub files_skipped: Vec<(String, String)>,
    /// Chunks written in this run
    pub chunks_indexed: usize,
    /// Total chunks in the index after the run
    pub total_chunks: usize,
    /// When the run finished
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::DocumentFormat;

    #[test]
    fn test_preview_truncation() {
        let long = "x".repeat(450);
        let source = ChunkSource::whole_file("a.txt".to_string(), DocumentFormat::Text);
        let chunk = Chunk::new(long, source, 0, 0);

        let attribution = SourceAttribution::from_chunk(&chunk, 0.1);
        assert_eq!(attribution.preview.chars().count(), 203);
        assert!(attribution.preview.ends_with("..."));
    }

    #[test]
    fn test_short_preview_untouched() {
        let source = ChunkSource::whole_file("a.txt".to_string(), DocumentFormat::Text);
        let chunk = Chunk::new("short content".to_string(), source, 0, 0);

        let attribution = SourceAttribution::from_chunk(&chunk, 0.1);
        assert_eq!(attribution.preview, "short content");
    }

    #[test]
    fn test_display_includes_citation_and_preview() {
        let source = ChunkSource::page("r.pdf".to_string(), DocumentFormat::Pdf, 1, 3);
        let chunk = Chunk::new("Paris is the capital.".to_string(), source, 0, 0);

        let display = SourceAttribution::from_chunk(&chunk, 0.0).display();
        assert!(display.contains("r.pdf, Page 1/3"));
        assert!(display.contains("Paris is the capital."));
    }
}
