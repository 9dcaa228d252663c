//! Retrieval-augmented query engine
//!
//! Per query: validate the question, resolve the freshest index snapshot,
//! retrieve the top-k chunks, render the grounded prompt, generate, and
//! attribute sources. Any stage failure aborts the query; no partial
//! answer is returned.

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::IndexStore;
use crate::types::{QueryResponse, SourceAttribution};

/// Query engine answering questions against the indexed corpus
pub struct QueryEngine {
    store: Arc<IndexStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl QueryEngine {
    /// Create an engine from configuration and injected collaborators
    pub fn new(
        config: &RagConfig,
        store: Arc<IndexStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            store,
            embedder,
            llm,
            top_k: config.retrieval.top_k,
        }
    }

    /// Answer a question from the indexed documents
    pub async fn query(&self, question: &str) -> Result<QueryResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuery);
        }

        tracing::info!("Query: \"{}\"", question);

        // Resolving picks up any index committed before this query arrived.
        let snapshot = self.store.resolve(false)?;

        let embedding = self.embedder.embed(question).await?;
        let retrieved = self.store.search(&snapshot, &embedding, self.top_k)?;

        let context = PromptBuilder::build_context(&retrieved);
        let prompt = PromptBuilder::build_qa_prompt(question, &context);
        let answer = self.llm.generate(&prompt).await?;

        let sources = retrieved
            .iter()
            .map(|r| SourceAttribution::from_chunk(&r.chunk, r.distance))
            .collect::<Vec<_>>();

        tracing::info!("Query answered with {} sources", sources.len());

        Ok(QueryResponse {
            answer: answer.trim().to_string(),
            sources,
        })
    }

    /// Whether a queryable index currently exists
    pub fn is_available(&self) -> bool {
        self.store.resolve(false).is_ok()
    }

    /// Indexed chunk count, read from the manifest of the freshest snapshot
    pub fn document_count(&self) -> Result<usize> {
        self.store.count()
    }

    /// Drop the cached snapshot and reload from disk immediately
    pub fn force_reload(&self) {
        self.store.invalidate();
        match self.store.resolve(true) {
            Ok(snapshot) => {
                tracing::info!("Index reloaded (v{}, {} chunks)", snapshot.version, snapshot.count)
            }
            Err(Error::IndexUnavailable) => tracing::info!("No index to reload"),
            Err(e) => tracing::error!("Index reload failed: {}", e),
        }
    }

    /// Distinguish why the engine is not healthy
    ///
    /// A missing generation credential is a configuration error; a missing
    /// index is the not-ready condition. Healthy means neither applies.
    pub fn health(&self) -> Result<()> {
        if !self.llm.has_credentials() {
            return Err(Error::config(format!(
                "no credential configured for generation provider '{}'",
                self.llm.name()
            )));
        }
        self.store.resolve(false).map(|_| ())
    }

    /// Boolean health view for transport layers
    pub fn health_check(&self) -> bool {
        match self.health() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                false
            }
        }
    }
}
