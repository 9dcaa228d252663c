//! Ingestion pipeline orchestration
//!
//! Two entry points with distinct consistency semantics: single-document
//! ingestion merges into the existing index (or creates one), while
//! whole-corpus ingestion rebuilds it from scratch. Only the rebuild path
//! can shrink the index, so document deletion goes through it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docvector_core::VectorEntry;
use walkdir::WalkDir;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::retrieval::IndexStore;
use crate::types::{Chunk, DocumentFormat, IngestReport};

use super::chunker::RecursiveSplitter;
use super::loader::DocumentLoader;

/// Pipeline wiring loader, chunker, embedder, and index store together
pub struct IngestPipeline {
    upload_dir: PathBuf,
    splitter: RecursiveSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<IndexStore>,
}

impl IngestPipeline {
    /// Create a pipeline from configuration and injected collaborators
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<IndexStore>,
    ) -> Self {
        Self {
            upload_dir: config.corpus.upload_dir.clone(),
            splitter: RecursiveSplitter::from_config(&config.chunking),
            embedder,
            store,
        }
    }

    /// Ingest one document: load, chunk, embed, then merge into the index
    /// (creating it on first ingestion). Nothing is persisted on failure.
    pub async fn process_single_document(&self, path: &Path) -> Result<IngestReport> {
        let filename = display_name(path);
        tracing::info!("Processing document: {}", filename);

        let segments = DocumentLoader::load(path)?;
        if segments.is_empty() {
            return Err(Error::EmptyDocument(filename));
        }

        let chunks = self.splitter.chunk_segments(&segments);
        if chunks.is_empty() {
            return Err(Error::EmptyDocument(filename));
        }

        let entries = self.embed_chunks(&chunks).await?;
        let manifest = self.store.merge_or_create(entries)?;

        tracing::info!(
            "Indexed {} chunks from {} (index now holds {})",
            chunks.len(),
            filename,
            manifest.count
        );

        Ok(IngestReport {
            files_processed: vec![filename],
            files_skipped: Vec::new(),
            chunks_indexed: chunks.len(),
            total_chunks: manifest.count,
            completed_at: chrono::Utc::now(),
        })
    }

    /// Rebuild the index from every supported file in the corpus directory
    ///
    /// Unreadable or unsupported files are logged and skipped; an empty
    /// total is a hard failure so a valid index is never replaced by an
    /// empty one.
    pub async fn process_all_documents(&self) -> Result<IngestReport> {
        let files = self.scan_corpus()?;

        let mut all_chunks: Vec<Chunk> = Vec::new();
        let mut files_processed = Vec::new();
        let mut files_skipped = Vec::new();

        for path in &files {
            let filename = display_name(path);
            match DocumentLoader::load(path) {
                Ok(segments) => {
                    let chunks = self.splitter.chunk_segments(&segments);
                    if chunks.is_empty() {
                        tracing::warn!("No indexable text in {}, skipping", filename);
                        files_skipped.push((filename, "no indexable text".to_string()));
                        continue;
                    }
                    files_processed.push(filename);
                    all_chunks.extend(chunks);
                }
                Err(e) if e.is_soft_load_failure() => {
                    tracing::warn!("Skipping {}: {}", filename, e);
                    files_skipped.push((filename, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        if all_chunks.is_empty() {
            return Err(Error::EmptyDocument(format!(
                "no indexable documents in {}",
                self.upload_dir.display()
            )));
        }

        let chunks_indexed = all_chunks.len();
        let entries = self.embed_chunks(&all_chunks).await?;
        let manifest = self.store.rebuild(entries)?;

        tracing::info!(
            "Rebuilt index from {} files ({} chunks)",
            files_processed.len(),
            manifest.count
        );

        Ok(IngestReport {
            files_processed,
            files_skipped,
            chunks_indexed,
            total_chunks: manifest.count,
            completed_at: chrono::Utc::now(),
        })
    }

    /// Delete a document from the corpus and reindex the remainder
    ///
    /// Merge cannot remove vectors, so deletion rebuilds from the surviving
    /// files; when none remain the artifact is removed and the engine
    /// reports not-ready.
    pub async fn remove_document(&self, filename: &str) -> Result<IngestReport> {
        let path = self.upload_dir.join(filename);
        if !path.is_file() {
            return Err(Error::file_load(filename, "not found in corpus"));
        }

        std::fs::remove_file(&path)?;
        tracing::info!("Deleted {} from corpus, reindexing", filename);

        match self.process_all_documents().await {
            Ok(report) => Ok(report),
            Err(Error::EmptyDocument(_)) => {
                self.store.remove()?;
                tracing::info!("Corpus is empty, index artifact removed");
                Ok(IngestReport {
                    files_processed: Vec::new(),
                    files_skipped: Vec::new(),
                    chunks_indexed: 0,
                    total_chunks: 0,
                    completed_at: chrono::Utc::now(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Embed chunks and pair them with their index metadata
    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<VectorEntry>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        if vectors.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        Ok(chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                VectorEntry::new(chunk.id.to_string(), vector, chunk.to_vector_metadata())
            })
            .collect())
    }

    /// Supported files directly under the corpus directory, sorted for
    /// deterministic rebuild order
    fn scan_corpus(&self) -> Result<Vec<PathBuf>> {
        if !self.upload_dir.is_dir() {
            tracing::warn!("Corpus directory {} not found", self.upload_dir.display());
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&self.upload_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| DocumentFormat::from_path(p).is_supported())
            .collect();
        files.sort();

        Ok(files)
    }
}

/// File name for logs and reports
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::HashEmbedder;

    const DIMS: usize = 64;

    struct Fixture {
        _tmp: tempfile::TempDir,
        upload_dir: PathBuf,
        pipeline: IngestPipeline,
        store: Arc<IndexStore>,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let upload_dir = tmp.path().join("uploads");
        std::fs::create_dir_all(&upload_dir).unwrap();

        let mut config = RagConfig::default();
        config.corpus.upload_dir = upload_dir.clone();
        config.corpus.index_dir = tmp.path().join("index");
        config.embeddings.dimensions = DIMS;

        let store = Arc::new(IndexStore::new(config.corpus.index_dir.clone(), DIMS));
        let embedder = Arc::new(HashEmbedder::new(DIMS));
        let pipeline = IngestPipeline::new(&config, embedder, Arc::clone(&store));

        Fixture {
            _tmp: tmp,
            upload_dir,
            pipeline,
            store,
        }
    }

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_single_document_creates_index() {
        let fx = fixture();
        let path = write_file(&fx.upload_dir, "a.txt", "The capital of France is Paris.");

        let report = fx.pipeline.process_single_document(&path).await.unwrap();
        assert_eq!(report.files_processed, vec!["a.txt"]);
        assert!(report.chunks_indexed >= 1);
        assert_eq!(fx.store.count().unwrap(), report.total_chunks);
    }

    #[tokio::test]
    async fn test_single_document_merges_into_existing() {
        let fx = fixture();
        let a = write_file(&fx.upload_dir, "a.txt", "Alpha document text.");
        let b = write_file(&fx.upload_dir, "b.txt", "Beta document text.");

        let first = fx.pipeline.process_single_document(&a).await.unwrap();
        let second = fx.pipeline.process_single_document(&b).await.unwrap();

        assert_eq!(
            second.total_chunks,
            first.chunks_indexed + second.chunks_indexed
        );
    }

    #[tokio::test]
    async fn test_empty_document_fails_without_persisting() {
        let fx = fixture();
        let path = write_file(&fx.upload_dir, "empty.txt", "   ");

        let err = fx.pipeline.process_single_document(&path).await.unwrap_err();
        assert!(matches!(err, Error::EmptyDocument(_)));
        assert!(!fx.store.exists());
    }

    #[tokio::test]
    async fn test_unsupported_file_fails_single_ingestion() {
        let fx = fixture();
        let path = write_file(&fx.upload_dir, "sheet.xlsx", "not really a spreadsheet");

        let err = fx.pipeline.process_single_document(&path).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_process_all_skips_unreadable_files() {
        let fx = fixture();
        write_file(&fx.upload_dir, "good.txt", "Readable content here.");
        write_file(&fx.upload_dir, "bad.docx", "not a zip archive");

        let report = fx.pipeline.process_all_documents().await.unwrap();
        assert_eq!(report.files_processed, vec!["good.txt"]);
        assert_eq!(report.files_skipped.len(), 1);
        assert_eq!(report.files_skipped[0].0, "bad.docx");
    }

    #[tokio::test]
    async fn test_process_all_empty_corpus_fails() {
        let fx = fixture();
        let err = fx.pipeline.process_all_documents().await.unwrap_err();
        assert!(matches!(err, Error::EmptyDocument(_)));
    }

    #[tokio::test]
    async fn test_merge_equals_rebuild_count() {
        let fx = fixture();
        let a = write_file(&fx.upload_dir, "a.txt", "First file with some words in it.");
        let b = write_file(&fx.upload_dir, "b.txt", "Second file with different words.");

        // Incremental: create from A, merge B.
        fx.pipeline.process_single_document(&a).await.unwrap();
        let merged = fx.pipeline.process_single_document(&b).await.unwrap();

        // Full rebuild over the same corpus.
        let rebuilt = fx.pipeline.process_all_documents().await.unwrap();

        assert_eq!(merged.total_chunks, rebuilt.total_chunks);
    }

    #[tokio::test]
    async fn test_remove_document_shrinks_index() {
        let fx = fixture();
        let a = write_file(&fx.upload_dir, "a.txt", "Document A talks about alpacas.");
        let b = write_file(&fx.upload_dir, "b.txt", "Document B talks about baboons.");

        fx.pipeline.process_single_document(&a).await.unwrap();
        let with_both = fx.pipeline.process_single_document(&b).await.unwrap();
        let b_chunks = with_both.chunks_indexed;

        let report = fx.pipeline.remove_document("a.txt").await.unwrap();
        assert_eq!(report.total_chunks, b_chunks);
        assert_eq!(fx.store.count().unwrap(), b_chunks);

        // Content unique to the deleted document no longer surfaces.
        let snapshot = fx.store.resolve(false).unwrap();
        let embedder = HashEmbedder::new(DIMS);
        let query = embedder.embed("alpacas").await.unwrap();
        let results = fx.store.search(&snapshot, &query, 5).unwrap();
        assert!(results.iter().all(|r| !r.chunk.content.contains("alpacas")));
    }

    #[tokio::test]
    async fn test_remove_last_document_drops_artifact() {
        let fx = fixture();
        let a = write_file(&fx.upload_dir, "only.txt", "Single document in the corpus.");

        fx.pipeline.process_single_document(&a).await.unwrap();
        let report = fx.pipeline.remove_document("only.txt").await.unwrap();

        assert_eq!(report.total_chunks, 0);
        assert!(!fx.store.exists());
    }

    #[tokio::test]
    async fn test_remove_missing_document() {
        let fx = fixture();
        let err = fx.pipeline.remove_document("ghost.txt").await.unwrap_err();
        assert!(matches!(err, Error::FileLoad { .. }));
    }
}
