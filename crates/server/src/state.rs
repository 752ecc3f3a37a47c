//! Application State
//!
//! Shared state across all handlers. Every external service is constructed
//! once here and handed to the assistant as a trait object.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use storefront_chat_agent::{AssistantServices, HttpWorkflowBackend, StorefrontAssistant};
use storefront_chat_config::Settings;
use storefront_chat_persistence::PersistenceLayer;

use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub assistant: Arc<StorefrontAssistant>,
    /// Prometheus handle; `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wrap an already wired assistant
    pub fn new(config: Settings, services: AssistantServices) -> Self {
        let assistant = StorefrontAssistant::new(&config, services);
        Self {
            config: Arc::new(config),
            assistant: Arc::new(assistant),
            metrics: None,
        }
    }

    /// In-memory stores, no LLM, no workflow backend
    pub fn in_memory(config: Settings) -> Self {
        Self::new(config, AssistantServices::new(PersistenceLayer::in_memory()))
    }

    /// Build every service described by the settings
    ///
    /// Unconfigured optional services (LLM, embeddings) are skipped and their
    /// tier is simply never tried. Unreachable storage is fatal.
    pub async fn from_settings(config: Settings) -> Result<Self, ServerError> {
        let persistence = storefront_chat_persistence::init(&config.persistence)
            .await
            .map_err(|e| ServerError::Startup(format!("persistence: {}", e)))?;

        let mut services = AssistantServices::new(persistence);

        match storefront_chat_llm::create_backend(&config.llm) {
            Ok(Some(llm)) => {
                tracing::info!(model = %llm.model_name(), "LLM classification enabled");
                services = services.with_llm(llm);
            },
            Ok(None) => tracing::info!("No LLM provider configured, using rule classification only"),
            Err(e) => tracing::warn!(error = %e, "LLM backend unavailable, using rule classification only"),
        }

        match storefront_chat_rag::create_embedder(&config.embedding) {
            Ok(Some(embedder)) => {
                tracing::info!(
                    provider = %config.embedding.provider,
                    dimension = embedder.dimension(),
                    "Semantic ranking enabled"
                );
                services = services.with_embedder(embedder);
            },
            Ok(None) => tracing::info!("Embeddings disabled, using keyword ranking"),
            Err(e) => tracing::warn!(error = %e, "Embedding provider unavailable, using keyword ranking"),
        }

        if config.workflow.enabled {
            let backend = HttpWorkflowBackend::new()
                .map_err(|e| ServerError::Startup(format!("workflow client: {}", e)))?;
            services = services.with_workflow(Arc::new(backend));
        }

        Ok(Self::new(config, services))
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
