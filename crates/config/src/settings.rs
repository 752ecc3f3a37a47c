//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::timeouts;
use crate::pipeline::{PipelineConfig, RankingConfig, WorkflowConfig};
use crate::providers::{EmbeddingConfig, LlmConfig};
use crate::ConfigError;

/// Prefix of environment overrides, e.g. `STOREFRONT_CHAT__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "STOREFRONT_CHAT";

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Relaxed validation, warnings only
    #[default]
    Development,
    Staging,
    /// All validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Chat LLM for classification fallback
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub ranking: RankingConfig,

    /// ScyllaDB persistence
    #[serde(default)]
    pub persistence: PersistenceConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed origins; empty allows any origin outside production
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout() -> u64 {
    timeouts::HTTP_REQUEST_SECS
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Persistence configuration for ScyllaDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable ScyllaDB persistence (false = in-memory only)
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_scylla_hosts")]
    pub scylla_hosts: Vec<String>,

    #[serde(default = "default_scylla_keyspace")]
    pub keyspace: String,

    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_scylla_hosts() -> Vec<String> {
    std::env::var("SCYLLA_HOSTS")
        .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
        .unwrap_or_else(|_| vec!["127.0.0.1:9042".to_string()])
}

fn default_scylla_keyspace() -> String {
    std::env::var("SCYLLA_KEYSPACE").unwrap_or_else(|_| "storefront_chat".to_string())
}

fn default_replication_factor() -> u8 {
    1
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scylla_hosts: default_scylla_hosts(),
            keyspace: default_scylla_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

/// Logging, tracing and metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    /// OTLP endpoint for traces (needs the `telemetry` feature)
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            otlp_endpoint: None,
            metrics_enabled: true,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    ///
    /// Missing provider credentials are not errors: the affected tier is
    /// skipped at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_pipeline()?;
        self.validate_ranking()?;
        self.validate_providers()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.environment.is_production()
            && self.server.cors_enabled
            && self.server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured; \
                 every origin will be allowed"
            );
        }

        Ok(())
    }

    fn validate_pipeline(&self) -> Result<(), ConfigError> {
        let pipeline = &self.pipeline;

        if pipeline.fallback_budget_ms < 100 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.fallback_budget_ms".to_string(),
                message: "Fallback budget too low (minimum 100ms)".to_string(),
            });
        }

        if pipeline.semantic_budget_ms == 0 || pipeline.semantic_budget_ms >= pipeline.fallback_budget_ms {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.semantic_budget_ms".to_string(),
                message: format!(
                    "Must be positive and below the fallback budget ({}ms)",
                    pipeline.fallback_budget_ms
                ),
            });
        }

        if self.workflow.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workflow.timeout_ms".to_string(),
                message: "Workflow timeout must be positive".to_string(),
            });
        }

        if pipeline.fallback_budget_ms <= self.llm.timeout_ms {
            tracing::warn!(
                fallback_budget_ms = pipeline.fallback_budget_ms,
                classifier_timeout_ms = self.llm.timeout_ms,
                "Fallback budget does not cover the classifier timeout"
            );
        }

        Ok(())
    }

    fn validate_ranking(&self) -> Result<(), ConfigError> {
        let ranking = &self.ranking;

        if !(0.0..=1.0).contains(&ranking.min_similarity) {
            return Err(ConfigError::InvalidValue {
                field: "ranking.min_similarity".to_string(),
                message: format!("Must be between 0.0 and 1.0, got {}", ranking.min_similarity),
            });
        }

        for (field, value) in [
            ("ranking.semantic_top_k", ranking.semantic_top_k),
            ("ranking.keyword_top_n", ranking.keyword_top_n),
            ("ranking.featured_count", ranking.featured_count),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Must be at least 1".to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_providers(&self) -> Result<(), ConfigError> {
        const LLM_PROVIDERS: [&str; 3] = ["none", "ollama", "openai"];
        const EMBEDDING_PROVIDERS: [&str; 4] = ["none", "hash", "ollama", "openai"];

        let llm = self.llm.provider.to_lowercase();
        if !LLM_PROVIDERS.contains(&llm.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "llm.provider".to_string(),
                message: format!("Unknown provider '{}'", self.llm.provider),
            });
        }

        let embedding = self.embedding.provider.to_lowercase();
        if !EMBEDDING_PROVIDERS.contains(&embedding.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "embedding.provider".to_string(),
                message: format!("Unknown provider '{}'", self.embedding.provider),
            });
        }

        if self.embedding.dimension == 0 {
            return Err(ConfigError::InvalidValue {
                field: "embedding.dimension".to_string(),
                message: "Dimension must be positive".to_string(),
            });
        }

        if llm == "openai" && self.llm.resolved_api_key().is_none() {
            tracing::warn!("llm.provider is openai but no API key is set; LLM classification disabled");
        }

        Ok(())
    }
}

/// Load settings from `config/` plus environment overrides
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from `{dir}/default.*`, `{dir}/{env}.*` and `STOREFRONT_CHAT__*`
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::from(dir.join("default")).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::from(dir.join(env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.llm.provider, "none");
        assert!(settings.workflow.enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_ranking_validation() {
        let mut settings = Settings::default();
        settings.ranking.min_similarity = 1.5;
        assert!(settings.validate().is_err());

        settings.ranking.min_similarity = 0.1;
        settings.ranking.keyword_top_n = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut settings = Settings::default();
        settings.embedding.provider = "word2vec".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_fallback_budget_validation() {
        let mut settings = Settings::default();
        settings.pipeline.fallback_budget_ms = 10;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_semantic_budget_must_fit_fallback_budget() {
        let mut settings = Settings::default();
        settings.pipeline.semantic_budget_ms = settings.pipeline.fallback_budget_ms;
        assert!(settings.validate().is_err());
        settings.pipeline.semantic_budget_ms = 2_000;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_directory_with_overlay() {
        let dir = tempfile::tempdir().unwrap();

        let mut default = std::fs::File::create(dir.path().join("default.toml")).unwrap();
        writeln!(
            default,
            "[server]\nport = 9001\n\n[ranking]\nkeyword_top_n = 4\nfeatured_count = 2"
        )
        .unwrap();

        let mut staging = std::fs::File::create(dir.path().join("staging.toml")).unwrap();
        writeln!(staging, "[server]\nport = 9002").unwrap();

        let settings = load_settings_from(dir.path(), Some("staging")).unwrap();
        assert_eq!(settings.server.port, 9002);
        assert_eq!(settings.ranking.keyword_top_n, 4);
        assert_eq!(settings.ranking.featured_count, 2);
        assert_eq!(settings.ranking.semantic_top_k, 6);
    }

    #[test]
    fn test_missing_directory_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("absent"), None).unwrap();
        assert_eq!(settings.pipeline.session_reuse_secs, 3600);
    }
}
