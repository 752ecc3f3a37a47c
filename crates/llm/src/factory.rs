//! LLM factory
//!
//! Builds the classification backend from settings. A missing or disabled
//! provider is not an error: the classifier then runs on rules alone.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use storefront_chat_config::LlmConfig;

use crate::backend::{LlmBackend, OllamaBackend, OllamaConfig, OpenAIBackend, OpenAIConfig};
use crate::LlmError;

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Disabled,
    Ollama,
    OpenAI,
}

impl FromStr for LlmProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "disabled" => Ok(LlmProvider::Disabled),
            "ollama" | "local" => Ok(LlmProvider::Ollama),
            "openai" | "gpt" => Ok(LlmProvider::OpenAI),
            other => Err(LlmError::Configuration(format!("Unknown LLM provider '{}'", other))),
        }
    }
}

/// Create the configured backend, or `None` when classification by LLM is off
/// or credentials are missing
pub fn create_backend(config: &LlmConfig) -> Result<Option<Arc<dyn LlmBackend>>, LlmError> {
    let provider: LlmProvider = config.provider.parse()?;

    // Leave headroom so the caller's timeout fires first
    let timeout = Duration::from_millis(config.timeout_ms.saturating_mul(2).max(1_000));

    match provider {
        LlmProvider::Disabled => Ok(None),
        LlmProvider::Ollama => {
            let backend = OllamaBackend::new(OllamaConfig {
                model: config.model.clone(),
                endpoint: config.resolved_endpoint(),
                timeout,
                ..Default::default()
            })?;
            tracing::info!(model = %config.model, "Using Ollama for classification fallback");
            Ok(Some(Arc::new(backend)))
        }
        LlmProvider::OpenAI => {
            let Some(api_key) = config.resolved_api_key() else {
                tracing::warn!("OpenAI provider configured without an API key; LLM classification disabled");
                return Ok(None);
            };
            let backend = OpenAIBackend::new(OpenAIConfig {
                endpoint: config.resolved_endpoint(),
                api_key,
                model: config.model.clone(),
                timeout,
                organization: None,
            })?;
            tracing::info!(model = %config.model, "Using OpenAI for classification fallback");
            Ok(Some(Arc::new(backend)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("none".parse::<LlmProvider>().ok(), Some(LlmProvider::Disabled));
        assert_eq!("Ollama".parse::<LlmProvider>().ok(), Some(LlmProvider::Ollama));
        assert_eq!("gpt".parse::<LlmProvider>().ok(), Some(LlmProvider::OpenAI));
        assert!(matches!("claude".parse::<LlmProvider>(), Err(LlmError::Configuration(_))));
    }

    #[test]
    fn test_disabled_provider_yields_none() {
        let config = LlmConfig::default();
        assert!(create_backend(&config).unwrap().is_none());
    }

    #[test]
    fn test_ollama_provider_builds_backend() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            ..Default::default()
        };
        let backend = create_backend(&config).unwrap().unwrap();
        assert_eq!(backend.model_name(), config.model);
    }

    #[test]
    fn test_unknown_provider_is_configuration_error() {
        let config = LlmConfig {
            provider: "mystery".to_string(),
            ..Default::default()
        };
        assert!(matches!(create_backend(&config), Err(LlmError::Configuration(_))));
    }
}
