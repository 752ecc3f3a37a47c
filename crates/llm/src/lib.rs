//! LLM integration
//!
//! Features:
//! - Ollama and OpenAI-compatible chat backends
//! - Provider factory driven by settings
//! - Classification prompts and answer parsing

pub mod backend;
pub mod factory;
pub mod prompt;

pub use backend::{
    GenerationResult, LlmBackend, OllamaBackend, OllamaConfig, OpenAIBackend, OpenAIConfig,
    SamplingParams,
};
pub use factory::{create_backend, LlmProvider};
pub use prompt::{intent_prompt, parse_intent, parse_sentiment, sentiment_prompt, Message, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(storefront_chat_core::mask_url(&err.to_string()))
        }
    }
}

impl From<LlmError> for storefront_chat_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(msg) => storefront_chat_core::Error::Configuration(msg),
            other => storefront_chat_core::Error::Llm(other.to_string()),
        }
    }
}
