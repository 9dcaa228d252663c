//! Hierarchical text splitting with overlap
//!
//! Splits on paragraph breaks first, then line breaks, then spaces, then raw
//! characters, until every piece fits the configured size. Separators are
//! preserved, so the emitted windows concatenate back to the input text;
//! each chunk after the first is prefixed with the trailing `overlap`
//! characters of its predecessor and records that prefix length.

use crate::config::ChunkingConfig;
use crate::types::{Chunk, LoadedSegment};

/// Split hierarchy: paragraphs, lines, words, then raw characters
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Recursive character splitter with configurable size and overlap
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    overlap: usize,
}

impl RecursiveSplitter {
    /// Create a new splitter; `overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        debug_assert!(overlap < chunk_size);
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Create a splitter from chunking configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Chunk a sequence of loaded segments, numbering chunks document-wide
    pub fn chunk_segments(&self, segments: &[LoadedSegment]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut chunk_index = 0u32;

        for segment in segments {
            for (content, overlap) in self.split_with_overlap(&segment.content) {
                if content.trim().is_empty() {
                    continue;
                }
                chunks.push(Chunk::new(content, segment.source.clone(), chunk_index, overlap));
                chunk_index += 1;
            }
        }

        chunks
    }

    /// Split text into overlapping chunks; returns `(content, overlap_len)`
    /// pairs where `overlap_len` counts the leading characters shared with
    /// the previous chunk.
    pub fn split_with_overlap(&self, text: &str) -> Vec<(String, usize)> {
        let windows = self.windows(text);
        let mut out = Vec::with_capacity(windows.len());

        for (i, window) in windows.iter().enumerate() {
            if i == 0 {
                out.push((window.clone(), 0));
            } else {
                let tail = char_tail(&windows[i - 1], self.overlap);
                out.push((format!("{}{}", tail, window), tail.chars().count()));
            }
        }

        out
    }

    /// Split text into consecutive windows of at most `chunk_size`
    /// characters whose concatenation equals the input.
    fn windows(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let fragments = split_fragments(text, &SEPARATORS, self.chunk_size);

        let mut windows = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for fragment in fragments {
            let fragment_len = fragment.chars().count();
            if current_len > 0 && current_len + fragment_len > self.chunk_size {
                windows.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push_str(fragment);
            current_len += fragment_len;
        }
        if !current.is_empty() {
            windows.push(current);
        }

        windows
    }
}

/// Recursively split text into fragments of at most `chunk_size` characters,
/// trying each separator in order and keeping separators attached to the
/// preceding fragment.
fn split_fragments<'a>(text: &'a str, separators: &[&str], chunk_size: usize) -> Vec<&'a str> {
    if text.chars().count() <= chunk_size {
        return vec![text];
    }

    match separators.split_first() {
        Some((separator, rest)) => {
            let mut fragments = Vec::new();
            for piece in text.split_inclusive(separator) {
                if piece.chars().count() <= chunk_size {
                    fragments.push(piece);
                } else {
                    fragments.extend(split_fragments(piece, rest, chunk_size));
                }
            }
            fragments
        }
        None => hard_cut(text, chunk_size),
    }
}

/// Cut text into consecutive `chunk_size`-character pieces
fn hard_cut(text: &str, chunk_size: usize) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;

    for (i, _) in text.char_indices() {
        if count == chunk_size {
            out.push(&text[start..i]);
            start = i;
            count = 0;
        }
        count += 1;
    }
    out.push(&text[start..]);

    out
}

/// Last `n` characters of `text`, at a char boundary
fn char_tail(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let total = text.chars().count();
    if total <= n {
        return text;
    }
    match text.char_indices().nth(total - n) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
