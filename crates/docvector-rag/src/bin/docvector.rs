//! Docvector CLI
//!
//! Run with: cargo run -p docvector-rag --bin docvector -- <command>

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docvector_rag::providers::{
    EmbeddingProvider, HfEndpointClient, LlmProvider, OllamaEmbedder,
};
use docvector_rag::types::DocumentFormat;
use docvector_rag::{IndexStore, IngestPipeline, QueryEngine, RagConfig};

#[derive(Parser)]
#[command(name = "docvector", version, about = "Document Q&A with source attribution")]
struct Cli {
    /// Path to a docvector.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy a document into the corpus and index it incrementally
    Ingest {
        /// Document to ingest (.pdf, .txt, .docx, .md)
        file: PathBuf,
    },
    /// Rebuild the index from every document in the corpus
    Reindex,
    /// Delete a document from the corpus and reindex the remainder
    Remove {
        /// Filename within the corpus directory
        filename: String,
    },
    /// Ask a question against the indexed documents
    Ask {
        /// The question
        question: String,
    },
    /// Show index and provider status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docvector_rag=info,docvector_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load(cli.config.as_deref())?;

    let store = Arc::new(IndexStore::new(
        config.corpus.index_dir.clone(),
        config.embeddings.dimensions,
    ));
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::new(&config.embeddings)?);
    let llm: Arc<dyn LlmProvider> = Arc::new(HfEndpointClient::new(&config.llm)?);

    let pipeline = IngestPipeline::new(&config, Arc::clone(&embedder), Arc::clone(&store));
    let engine = QueryEngine::new(&config, Arc::clone(&store), Arc::clone(&embedder), Arc::clone(&llm));

    match cli.command {
        Command::Ingest { file } => {
            let format = DocumentFormat::from_path(&file);
            if !format.is_supported() {
                anyhow::bail!(
                    "unsupported file type; allowed: {}",
                    DocumentFormat::supported_extensions().join(", ")
                );
            }

            // Acting as the upload collaborator: land the file in the
            // corpus directory, then run the ingestion pipeline on it.
            let filename = file
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("invalid file path"))?;
            std::fs::create_dir_all(&config.corpus.upload_dir)?;
            let target = config.corpus.upload_dir.join(filename);
            if file.canonicalize()? != target.canonicalize().unwrap_or_default() {
                std::fs::copy(&file, &target)?;
            }

            let report = pipeline.process_single_document(&target).await?;
            println!(
                "Indexed {} chunks from {} ({} total)",
                report.chunks_indexed,
                filename.to_string_lossy(),
                report.total_chunks
            );
        }
        Command::Reindex => {
            let report = pipeline.process_all_documents().await?;
            println!(
                "Rebuilt index from {} files ({} chunks)",
                report.files_processed.len(),
                report.total_chunks
            );
            for (file, reason) in &report.files_skipped {
                println!("  skipped {}: {}", file, reason);
            }
        }
        Command::Remove { filename } => {
            let report = pipeline.remove_document(&filename).await?;
            println!(
                "Removed {}; index now holds {} chunks",
                filename, report.total_chunks
            );
        }
        Command::Ask { question } => {
            let response = engine.query(&question).await?;
            println!("{}\n", response.answer);
            if !response.sources.is_empty() {
                println!("Sources:");
                for source in response.source_strings() {
                    println!("  - {}", source);
                }
            }
        }
        Command::Status => {
            println!("Corpus: {}", config.corpus.upload_dir.display());
            println!("Index:  {}", config.corpus.index_dir.display());
            match engine.document_count() {
                Ok(count) => println!("Indexed chunks: {}", count),
                Err(_) => println!("Indexed chunks: none (upload documents first)"),
            }
            println!(
                "Embedding provider '{}': {}",
                embedder.name(),
                if embedder.health_check().await.unwrap_or(false) {
                    "reachable"
                } else {
                    "unreachable"
                }
            );
            println!(
                "Generation provider '{}' ({}): {}",
                llm.name(),
                llm.model(),
                if llm.has_credentials() {
                    "credential present"
                } else {
                    "credential missing (set HF_TOKEN)"
                }
            );
            println!(
                "Healthy: {}",
                if engine.health_check() { "yes" } else { "no" }
            );
        }
    }

    Ok(())
}
