//! Provider abstractions for embeddings and answer generation
//!
//! Trait-based seams so the embedding and generation services stay opaque
//! and constructor-injected; no process-wide singletons.

pub mod embedding;
pub mod huggingface;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use huggingface::HfEndpointClient;
pub use llm::LlmProvider;
pub use ollama::OllamaEmbedder;

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic in-process providers for tests

    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use async_trait::async_trait;

    use crate::error::Result;

    use super::{EmbeddingProvider, LlmProvider};

    /// Bag-of-words embedder: tokens are hashed into dimension buckets, so
    /// texts sharing words land close under cosine distance.
    pub struct HashEmbedder {
        pub dimensions: usize,
    }

    impl HashEmbedder {
        pub fn new(dimensions: usize) -> Self {
            Self { dimensions }
        }

        fn vectorize(&self, text: &str) -> Vec<f32> {
            let mut v = vec![0.0f32; self.dimensions];
            for token in text
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| !t.is_empty())
            {
                let mut hasher = DefaultHasher::new();
                token.to_lowercase().hash(&mut hasher);
                let bucket = (hasher.finish() % self.dimensions as u64) as usize;
                v[bucket] += 1.0;
            }
            v
        }
    }

    #[async_trait]
    impl EmbeddingProvider for HashEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self.vectorize(text))
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "hash"
        }
    }

    /// Echoes the rendered prompt back as the answer, so tests can assert
    /// on what retrieval actually put in front of the model.
    pub struct EchoLlm {
        pub credentialed: bool,
    }

    impl EchoLlm {
        pub fn new() -> Self {
            Self { credentialed: true }
        }
    }

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_string())
        }

        fn has_credentials(&self) -> bool {
            self.credentialed
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(self.credentialed)
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }
    }
}
