//! Format-dispatched document loading

use std::path::Path;

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::{ChunkSource, DocumentFormat, LoadedSegment};

/// Multi-format document loader
///
/// Produces plain-text segments with per-segment source metadata. PDFs yield
/// one segment per page; Markdown yields one segment per heading-delimited
/// section; text and Word documents yield a single segment.
pub struct DocumentLoader;

impl DocumentLoader {
    /// Load a file into text segments based on its extension
    pub fn load(path: &Path) -> Result<Vec<LoadedSegment>> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let format = DocumentFormat::from_path(path);
        if !format.is_supported() {
            return Err(Error::UnsupportedFormat(filename));
        }

        let data =
            std::fs::read(path).map_err(|e| Error::file_load(&filename, e.to_string()))?;
        let content_hash = hash_content(&data);

        let mut segments = match format {
            DocumentFormat::Pdf => Self::load_pdf(&filename, &data)?,
            DocumentFormat::Text => Self::load_text(&filename, &data),
            DocumentFormat::Word => Self::load_docx(&filename, &data)?,
            DocumentFormat::Markdown => Self::load_markdown(&filename, &data),
            DocumentFormat::Unknown => unreachable!("unsupported formats are rejected above"),
        };

        segments.retain(|s| !s.content.trim().is_empty());
        for segment in &mut segments {
            segment.source.content_hash = Some(content_hash.clone());
        }

        tracing::info!("Loaded {} segments from {}", segments.len(), filename);
        Ok(segments)
    }

    /// Extract PDF text page by page; falls back to whole-document
    /// extraction when per-page extraction yields nothing.
    fn load_pdf(filename: &str, data: &[u8]) -> Result<Vec<LoadedSegment>> {
        match lopdf::Document::load_mem(data) {
            Ok(doc) => {
                let pages = doc.get_pages();
                let page_count = pages.len() as u32;
                let mut segments = Vec::new();

                for (&page_number, _) in pages.iter() {
                    match doc.extract_text(&[page_number]) {
                        Ok(text) if !text.trim().is_empty() => {
                            segments.push(LoadedSegment {
                                content: text,
                                source: ChunkSource::page(
                                    filename.to_string(),
                                    DocumentFormat::Pdf,
                                    page_number,
                                    page_count,
                                ),
                            });
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(
                                "Skipping page {} of {}: {}",
                                page_number,
                                filename,
                                e
                            );
                        }
                    }
                }

                if !segments.is_empty() {
                    return Ok(segments);
                }
                tracing::warn!(
                    "Per-page extraction of {} yielded no text, trying whole-document",
                    filename
                );
            }
            Err(e) => {
                tracing::warn!("lopdf failed on {}: {}, trying whole-document", filename, e);
            }
        }

        let content = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_load(filename, e.to_string()))?;

        Ok(vec![LoadedSegment {
            content,
            source: ChunkSource::whole_file(filename.to_string(), DocumentFormat::Pdf),
        }])
    }

    /// Read a plain-text file as a single segment
    fn load_text(filename: &str, data: &[u8]) -> Vec<LoadedSegment> {
        vec![LoadedSegment {
            content: String::from_utf8_lossy(data).into_owned(),
            source: ChunkSource::whole_file(filename.to_string(), DocumentFormat::Text),
        }]
    }

    /// Extract Word document text from paragraph runs
    fn load_docx(filename: &str, data: &[u8]) -> Result<Vec<LoadedSegment>> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::file_load(filename, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(vec![LoadedSegment {
            content,
            source: ChunkSource::whole_file(filename.to_string(), DocumentFormat::Word),
        }])
    }

    /// Extract Markdown as plain text, one segment per heading-delimited
    /// section with the heading carried as section metadata.
    fn load_markdown(filename: &str, data: &[u8]) -> Vec<LoadedSegment> {
        let text = String::from_utf8_lossy(data);
        let parser = Parser::new(&text);

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut section: Option<String> = None;
        let mut heading: Option<String> = None;

        let flush = |content: &mut String, section: &Option<String>, out: &mut Vec<LoadedSegment>| {
            if !content.trim().is_empty() {
                let mut source =
                    ChunkSource::whole_file(filename.to_string(), DocumentFormat::Markdown);
                source.section = section.clone();
                out.push(LoadedSegment {
                    content: std::mem::take(content),
                    source,
                });
            } else {
                content.clear();
            }
        };

        for event in parser {
            match event {
                Event::Start(Tag::Heading { .. }) => {
                    flush(&mut current, &section, &mut segments);
                    heading = Some(String::new());
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(h) = heading.take() {
                        let title = h.trim().to_string();
                        section = (!title.is_empty()).then_some(title.clone());
                        // Headings stay part of the extracted text.
                        current.push_str(&title);
                        current.push_str("\n\n");
                    }
                }
                Event::Text(t) | Event::Code(t) => match heading.as_mut() {
                    Some(h) => h.push_str(&t),
                    None => current.push_str(&t),
                },
                Event::SoftBreak | Event::HardBreak => current.push('\n'),
                Event::End(TagEnd::Paragraph) | Event::End(TagEnd::CodeBlock) => {
                    current.push_str("\n\n");
                }
                Event::End(TagEnd::Item) => current.push('\n'),
                _ => {}
            }
        }
        flush(&mut current, &section, &mut segments);

        segments
    }
}

/// SHA-256 hash of raw document bytes, hex-encoded
fn hash_content(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
