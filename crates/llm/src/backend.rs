//! LLM backend implementations
//!
//! Only non-streaming completion is needed: classification asks for a
//! single short label at zero temperature.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::prompt::Message;
use crate::LlmError;

/// Per-call decoding parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SamplingParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl SamplingParams {
    /// Zero-temperature decoding capped at `max_tokens`
    pub fn deterministic(max_tokens: usize) -> Self {
        Self {
            temperature: Some(0.0),
            max_tokens: Some(max_tokens),
        }
    }
}

/// LLM generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub tokens: usize,
    pub total_time_ms: u64,
}

/// LLM Backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a completion for the conversation
    async fn generate(
        &self,
        messages: &[Message],
        params: &SamplingParams,
    ) -> Result<GenerationResult, LlmError>;

    /// Check if the model is reachable
    async fn is_available(&self) -> bool;

    fn model_name(&self) -> &str;
}

/// Ollama connection settings
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    /// How long Ollama keeps the model loaded, e.g. `5m`
    pub keep_alive: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: "qwen2.5:1.5b-instruct".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            timeout: Duration::from_secs(10),
            keep_alive: "5m".to_string(),
        }
    }
}

/// Ollama chat backend
#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    config: OllamaConfig,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.endpoint.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn generate(
        &self,
        messages: &[Message],
        params: &SamplingParams,
    ) -> Result<GenerationResult, LlmError> {
        let start = std::time::Instant::now();

        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(OllamaMessage::from).collect(),
            stream: false,
            options: Some(OllamaOptions {
                temperature: params.temperature,
                num_predict: params.max_tokens.map(|n| n as i32),
            }),
            keep_alive: Some(self.config.keep_alive.clone()),
        };

        let response = self
            .client
            .post(self.api_url("/chat"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("Server error {}: {}", status, error)));
            }
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error)));
        }

        let result: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(GenerationResult {
            text: result.message.content,
            tokens: result.eval_count.unwrap_or(0) as usize,
            total_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(self.api_url("/tags"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    eval_count: Option<u64>,
}

// =============================================================================
// OpenAI-compatible Backend
// =============================================================================

/// Configuration for OpenAI-compatible backends
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API endpoint, e.g. https://api.openai.com/v1
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub organization: Option<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(10),
            organization: None,
        }
    }
}

/// OpenAI-compatible chat completions backend
pub struct OpenAIBackend {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() && !is_local_endpoint(&config.endpoint) {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::HeaderValue;

        let mut headers = reqwest::header::HeaderMap::new();

        if !self.config.api_key.is_empty() {
            let auth_value = format!("Bearer {}", self.config.api_key);
            if let Ok(val) = HeaderValue::from_str(&auth_value) {
                headers.insert(reqwest::header::AUTHORIZATION, val);
            }
        }

        if let Some(ref org) = self.config.organization {
            if let Ok(val) = HeaderValue::from_str(org) {
                headers.insert("OpenAI-Organization", val);
            }
        }

        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        headers
    }
}

fn is_local_endpoint(endpoint: &str) -> bool {
    endpoint.starts_with("http://localhost") || endpoint.starts_with("http://127.0.0.1")
}

#[async_trait]
impl LlmBackend for OpenAIBackend {
    async fn generate(
        &self,
        messages: &[Message],
        params: &SamplingParams,
    ) -> Result<GenerationResult, LlmError> {
        let start = std::time::Instant::now();

        let request = OpenAIChatRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: Some(false),
        };

        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("Server error {}: {}", status, error_text)));
            }
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        Ok(GenerationResult {
            text: choice.message.content.unwrap_or_default(),
            tokens: response.usage.map(|u| u.completion_tokens).unwrap_or(0),
            total_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/models", self.config.endpoint.trim_end_matches('/')))
            .headers(self.build_headers())
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_api_url() {
        let backend = OllamaBackend::new(OllamaConfig {
            endpoint: "http://localhost:11434/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend.api_url("/chat"), "http://localhost:11434/api/chat");
        assert_eq!(backend.model_name(), "qwen2.5:1.5b-instruct");
    }

    #[test]
    fn test_openai_requires_key_for_remote() {
        let result = OpenAIBackend::new(OpenAIConfig::default());
        assert!(matches!(result, Err(LlmError::Configuration(_))));

        let local = OpenAIBackend::new(OpenAIConfig {
            endpoint: "http://localhost:8000/v1".to_string(),
            ..Default::default()
        });
        assert!(local.is_ok());
    }

    #[test]
    fn test_openai_headers_and_url() {
        let backend = OpenAIBackend::new(OpenAIConfig {
            api_key: "sk-test-123456".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend.chat_url(), "https://api.openai.com/v1/chat/completions");
        let headers = backend.build_headers();
        assert_eq!(
            headers.get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer sk-test-123456"
        );
    }

    #[test]
    fn test_deterministic_params_serialize() {
        let params = SamplingParams::deterministic(8);
        let options = OllamaOptions {
            temperature: params.temperature,
            num_predict: params.max_tokens.map(|n| n as i32),
        };
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["num_predict"], 8);
    }

    #[tokio::test]
    async fn test_unreachable_ollama_reports_unavailable() {
        let backend = OllamaBackend::new(OllamaConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_millis(200),
            ..Default::default()
        })
        .unwrap();
        assert!(!backend.is_available().await);
    }
}
