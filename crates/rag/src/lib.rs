//! Product retrieval for shopper queries
//!
//! Features:
//! - Embedding providers: offline feature hashing, Ollama, OpenAI-compatible
//! - Persistent per-shop embedding cache with model/dimension checks
//! - Semantic ranking by cosine similarity
//! - Keyword fallback ranking by token overlap
//! - Personalization boosts from the shopper profile

pub mod cache;
pub mod embeddings;
pub mod keyword;
pub mod ollama_embeddings;
pub mod openai_embeddings;
pub mod personalization;
pub mod scored;
pub mod semantic;

pub use cache::{BatchSummary, CacheOptions, EmbeddingCache};
pub use embeddings::{create_embedder, EmbeddingBackend, EmbeddingProvider, HashEmbedder};
pub use keyword::KeywordRanker;
pub use ollama_embeddings::{OllamaEmbedder, OllamaEmbeddingConfig};
pub use openai_embeddings::{OpenAIEmbedder, OpenAIEmbeddingConfig};
pub use personalization::{PersonalizationScorer, PersonalizationSignals};
pub use scored::{sort_by_relevance, RankingSource, ScoredProduct};
pub use semantic::{cosine_similarity, SemanticRanker};

use std::time::Duration;
use thiserror::Error;

use storefront_chat_core::TierFailure;
use storefront_chat_persistence::PersistenceError;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Store error: {0}")]
    Store(#[from] PersistenceError),
}

impl From<RagError> for TierFailure {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Timeout(after) => TierFailure::Timeout(after),
            RagError::Configuration(msg) => TierFailure::NotConfigured(msg),
            other => TierFailure::Upstream(other.to_string()),
        }
    }
}

impl From<RagError> for storefront_chat_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Configuration(msg) => storefront_chat_core::Error::Configuration(msg),
            other => storefront_chat_core::Error::Rag(other.to_string()),
        }
    }
}
