//! Configuration management for the storefront chat engine
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/` (`default` plus an environment overlay)
//! - Environment variables (`STOREFRONT_CHAT__SECTION__KEY`)
//!
//! Business constants live in [`constants`].

pub mod constants;
pub mod pipeline;
pub mod providers;
pub mod settings;

pub use pipeline::{PipelineConfig, RankingConfig, WorkflowConfig};
pub use providers::{EmbeddingConfig, LlmConfig};
pub use settings::{
    load_settings, load_settings_from, ObservabilityConfig, PersistenceConfig,
    RuntimeEnvironment, ServerConfig, Settings, ENV_PREFIX,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ConfigError::MissingField(key),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}
