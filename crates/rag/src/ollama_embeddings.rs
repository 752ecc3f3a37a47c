//! Ollama embeddings
//!
//! Uses Ollama's `/api/embed` endpoint. Product text and shopper queries are
//! embedded as plain text so both sides share one vector space.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use storefront_chat_config::constants::{embedding, endpoints, timeouts};
use storefront_chat_core::mask_url;

use crate::embeddings::EmbeddingProvider;
use crate::RagError;

#[derive(Debug, Clone)]
pub struct OllamaEmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub embedding_dim: usize,
    pub timeout: Duration,
}

impl Default for OllamaEmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::OLLAMA_DEFAULT.to_string(),
            model: "nomic-embed-text".to_string(),
            embedding_dim: embedding::OLLAMA_DIMENSION,
            timeout: Duration::from_millis(timeouts::EMBEDDING_MS),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

pub struct OllamaEmbedder {
    client: Client,
    config: OllamaEmbeddingConfig,
}

impl OllamaEmbedder {
    pub fn new(config: OllamaEmbeddingConfig) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let request = EmbedRequest {
            model: &self.config.model,
            input: text,
        };

        let url = format!("{}/api/embed", self.config.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RagError::Timeout(self.config.timeout)
                } else {
                    RagError::Embedding(format!("Ollama request failed: {}", mask_url(&e.to_string())))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "Ollama embedding failed: {} - {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        embed_response
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RagError::Embedding("No embedding returned".to_string()))
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = OllamaEmbeddingConfig::default();
        assert_eq!(config.model, "nomic-embed-text");
        assert_eq!(config.embedding_dim, 768);
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(EmbedRequest {
            model: "nomic-embed-text",
            input: "red dress",
        })
        .unwrap();
        assert_eq!(json["model"], "nomic-embed-text");
        assert_eq!(json["input"], "red dress");
    }
}
