//! Hosted inference endpoint client for answer generation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::LlmProvider;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Serialize)]
struct GenerateParameters {
    temperature: f32,
    max_new_tokens: usize,
    return_full_text: bool,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Client for a HuggingFace-style text-generation inference endpoint
///
/// Requires a Bearer token; absence is reported by `has_credentials` so the
/// health check can flag it before any generation is attempted.
pub struct HfEndpointClient {
    client: Client,
    config: LlmConfig,
}

impl HfEndpointClient {
    /// Create a new client with a bounded request timeout
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl LlmProvider for HfEndpointClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let token = self
            .config
            .api_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::config("generation API token not configured (set HF_TOKEN)"))?;

        let url = format!(
            "{}/models/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let request = GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                temperature: self.config.temperature,
                max_new_tokens: self.config.max_new_tokens,
                return_full_text: false,
            },
        };

        tracing::info!("Generating answer with model: {}", self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::generation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generation(format!("HTTP {} - {}", status, body)));
        }

        let outputs: Vec<GeneratedText> = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("invalid response: {}", e)))?;

        outputs
            .into_iter()
            .next()
            .map(|o| o.generated_text)
            .ok_or_else(|| Error::generation("endpoint returned no generations"))
    }

    fn has_credentials(&self) -> bool {
        self.config
            .api_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }

    async fn health_check(&self) -> Result<bool> {
        // The endpoint is only exercised by real generations; the locally
        // checkable condition is the credential.
        Ok(self.has_credentials())
    }

    fn name(&self) -> &str {
        "huggingface"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_detected() {
        let config = LlmConfig {
            api_token: None,
            ..LlmConfig::default()
        };
        let client = HfEndpointClient::new(&config).unwrap();
        assert!(!client.has_credentials());
    }

    #[tokio::test]
    async fn test_generate_without_token_is_config_error() {
        let config = LlmConfig {
            api_token: Some(String::new()),
            ..LlmConfig::default()
        };
        let client = HfEndpointClient::new(&config).unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
