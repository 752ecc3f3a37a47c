//! External model provider configuration (chat LLM and embeddings)

use serde::{Deserialize, Serialize};

use crate::constants::{embedding, endpoints, timeouts};

/// Chat LLM used for intent/sentiment classification fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `none`, `ollama` or `openai`
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// Base URL; provider default when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Required for `openai`; read from `OPENAI_API_KEY` when unset
    #[serde(default)]
    pub api_key: Option<String>,

    /// Classification call timeout
    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_llm_provider() -> String {
    "none".to_string()
}

fn default_llm_model() -> String {
    "qwen2.5:1.5b-instruct".to_string()
}

fn default_classifier_timeout_ms() -> u64 {
    timeouts::CLASSIFIER_MS
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            endpoint: None,
            model: default_llm_model(),
            api_key: None,
            timeout_ms: default_classifier_timeout_ms(),
        }
    }
}

impl LlmConfig {
    /// Endpoint with the provider default filled in
    pub fn resolved_endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => endpoint.trim_end_matches('/').to_string(),
            _ => default_endpoint(&self.provider),
        }
    }

    /// API key from config, falling back to the environment
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()))
    }
}

/// Embedding provider used by the semantic ranker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// `hash`, `ollama`, `openai` or `none`
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Expected vector dimension; cached vectors of any other size are misses
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,

    /// Character budget for `title. description`
    #[serde(default = "default_text_budget")]
    pub text_budget_chars: usize,

    /// Pause between calls during batch generation
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

fn default_embedding_provider() -> String {
    "hash".to_string()
}

fn default_embedding_model() -> String {
    "feature-hash-v1".to_string()
}

fn default_embedding_dimension() -> usize {
    embedding::HASH_DIMENSION
}

fn default_embedding_timeout_ms() -> u64 {
    timeouts::EMBEDDING_MS
}

fn default_text_budget() -> usize {
    embedding::TEXT_BUDGET_CHARS
}

fn default_batch_delay_ms() -> u64 {
    embedding::BATCH_DELAY_MS
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            endpoint: None,
            model: default_embedding_model(),
            api_key: None,
            dimension: default_embedding_dimension(),
            timeout_ms: default_embedding_timeout_ms(),
            text_budget_chars: default_text_budget(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

impl EmbeddingConfig {
    pub fn resolved_endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => endpoint.trim_end_matches('/').to_string(),
            _ => default_endpoint(&self.provider),
        }
    }

    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()))
    }

    pub fn is_disabled(&self) -> bool {
        self.provider.eq_ignore_ascii_case("none")
    }
}

fn default_endpoint(provider: &str) -> String {
    match provider.to_lowercase().as_str() {
        "openai" => endpoints::OPENAI_DEFAULT.to_string(),
        _ => endpoints::OLLAMA_DEFAULT.to_string(),
    }
}
