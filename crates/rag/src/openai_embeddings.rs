//! OpenAI-compatible embeddings (`POST {endpoint}/embeddings`)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use storefront_chat_core::mask_url;

use crate::embeddings::EmbeddingProvider;
use crate::RagError;

#[derive(Debug, Clone)]
pub struct OpenAIEmbeddingConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub embedding_dim: usize,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct OpenAIEmbedder {
    client: Client,
    config: OpenAIEmbeddingConfig,
}

impl OpenAIEmbedder {
    pub fn new(config: OpenAIEmbeddingConfig) -> Result<Self, RagError> {
        if config.api_key.trim().is_empty() {
            return Err(RagError::Configuration("OpenAI embeddings need an API key".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let request = EmbeddingsRequest {
            model: &self.config.model,
            input: text,
        };

        let response = self
            .client
            .post(self.embeddings_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RagError::Timeout(self.config.timeout)
                } else {
                    RagError::Embedding(format!("OpenAI request failed: {}", mask_url(&e.to_string())))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "OpenAI embedding failed: {} - {}",
                status,
                mask_url(&body)
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Failed to parse OpenAI response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
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
