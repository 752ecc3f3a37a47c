//! Embedding providers
//!
//! `HashEmbedder` runs fully offline by feature-hashing stemmed tokens into a
//! fixed-size vector. Remote providers (Ollama, OpenAI-compatible) are
//! selected by settings.

use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use storefront_chat_config::constants::embedding::{HASH_DIMENSION, OLLAMA_DIMENSION, OPENAI_DIMENSION};
use storefront_chat_config::EmbeddingConfig;
use storefront_chat_text_processing::tokenize;

use crate::ollama_embeddings::{OllamaEmbedder, OllamaEmbeddingConfig};
use crate::openai_embeddings::{OpenAIEmbedder, OpenAIEmbeddingConfig};
use crate::RagError;

const HASH_MODEL_ID: &str = "feature-hash-v1";
const OLLAMA_DEFAULT_MODEL: &str = "nomic-embed-text";
const OPENAI_DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Turns text into a fixed-dimension vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;

    /// Identifier stored next to every vector; vectors of different models are never compared
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    /// Whether each `embed` call goes over the network
    fn is_remote(&self) -> bool {
        true
    }
}

/// Offline embedder based on signed feature hashing
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_id: format!("{}-{}", HASH_MODEL_ID, dimension),
        }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            let index = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(HASH_DIMENSION)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        Ok(self.embed_sync(text))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn is_remote(&self) -> bool {
        false
    }
}

/// Embedding provider selected by settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Disabled,
    Hash,
    Ollama,
    OpenAI,
}

impl FromStr for EmbeddingBackend {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "disabled" | "" => Ok(Self::Disabled),
            "hash" | "local" => Ok(Self::Hash),
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            other => Err(RagError::Configuration(format!("unknown embedding provider '{}'", other))),
        }
    }
}

/// Build the configured embedding provider
///
/// Returns `None` when embeddings are disabled or a remote provider lacks
/// credentials; ranking then starts at the keyword tier. Settings still at
/// the offline defaults (model and dimension) are replaced by the remote
/// provider's own defaults.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Option<Arc<dyn EmbeddingProvider>>, RagError> {
    let uses_hash_defaults = config.model == HASH_MODEL_ID;
    let remote_dimension = |default: usize| {
        if uses_hash_defaults || config.dimension == HASH_DIMENSION {
            default
        } else {
            config.dimension
        }
    };

    match config.provider.parse::<EmbeddingBackend>()? {
        EmbeddingBackend::Disabled => {
            tracing::info!("Embeddings disabled, semantic ranking off");
            Ok(None)
        }
        EmbeddingBackend::Hash => Ok(Some(Arc::new(HashEmbedder::new(config.dimension)))),
        EmbeddingBackend::Ollama => {
            let embedder = OllamaEmbedder::new(OllamaEmbeddingConfig {
                endpoint: config.resolved_endpoint(),
                model: if uses_hash_defaults {
                    OLLAMA_DEFAULT_MODEL.to_string()
                } else {
                    config.model.clone()
                },
                embedding_dim: remote_dimension(OLLAMA_DIMENSION),
                timeout: Duration::from_millis(config.timeout_ms),
            })?;
            tracing::info!(model = %embedder.model(), "Using Ollama embeddings");
            Ok(Some(Arc::new(embedder)))
        }
        EmbeddingBackend::OpenAI => {
            let Some(api_key) = config.resolved_api_key() else {
                tracing::warn!("OpenAI embeddings selected without an API key, semantic ranking off");
                return Ok(None);
            };
            let embedder = OpenAIEmbedder::new(OpenAIEmbeddingConfig {
                endpoint: config.resolved_endpoint(),
                api_key,
                model: if uses_hash_defaults {
                    OPENAI_DEFAULT_MODEL.to_string()
                } else {
                    config.model.clone()
                },
                embedding_dim: remote_dimension(OPENAI_DIMENSION),
                timeout: Duration::from_millis(config.timeout_ms),
            })?;
            tracing::info!(model = %embedder.model(), "Using OpenAI embeddings");
            Ok(Some(Arc::new(embedder)))
        }
    }
}
