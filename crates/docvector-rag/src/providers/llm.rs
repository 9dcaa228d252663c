//! Generation provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Trait for LLM-based answer generation
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text from a rendered prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Whether the provider has the credential it needs
    ///
    /// Missing credentials are a configuration error surfaced at
    /// health-check time, not at call time.
    fn has_credentials(&self) -> bool;

    /// Check if the provider is usable
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model identifier in use
    fn model(&self) -> &str;
}
