//! Persistence layer for the storefront chat engine
//!
//! Provides storage for:
//! - Product embeddings, keyed by (shop, product)
//! - Shopper profiles with preference bags and browsing history
//! - Chat sessions and their messages
//! - Daily per-shop analytics counters
//! - Billed conversation events for monthly quotas
//! - Per-shop settings (plan, workflow routing, policies)
//!
//! Every store is a trait with a ScyllaDB implementation and a shared
//! in-memory implementation.

pub mod analytics;
pub mod chat;
pub mod client;
pub mod embeddings;
pub mod error;
pub mod memory;
pub mod profiles;
pub mod schema;
pub mod shops;
pub mod usage;

pub use analytics::{AnalyticsStore, DailyAnalytics, MessageMetrics, ScyllaAnalyticsStore};
pub use chat::{ChatMessage, ChatRole, ChatSession, ChatStore, ScyllaChatStore};
pub use client::{ScyllaClient, ScyllaConfig};
pub use embeddings::{EmbeddingStore, ProductEmbedding, ScyllaEmbeddingStore};
pub use error::PersistenceError;
pub use memory::InMemoryStore;
pub use profiles::{Interaction, InteractionKind, ProfileStore, ScyllaProfileStore, UserProfile};
pub use shops::{ScyllaShopSettingsStore, ShopSettings, ShopSettingsStore, WorkflowType};
pub use usage::{BillingPeriod, ConversationUsageRecord, ScyllaUsageStore, UsageStore};

use std::sync::Arc;

use storefront_chat_config::PersistenceConfig;

/// Every store the engine needs, behind trait objects
#[derive(Clone)]
pub struct PersistenceLayer {
    pub embeddings: Arc<dyn EmbeddingStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub chat: Arc<dyn ChatStore>,
    pub analytics: Arc<dyn AnalyticsStore>,
    pub usage: Arc<dyn UsageStore>,
    pub shops: Arc<dyn ShopSettingsStore>,
}

impl PersistenceLayer {
    /// All stores backed by one shared in-memory store
    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(InMemoryStore::new()))
    }

    pub fn from_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            embeddings: store.clone(),
            profiles: store.clone(),
            chat: store.clone(),
            analytics: store.clone(),
            usage: store.clone(),
            shops: store,
        }
    }

    pub fn from_scylla(client: ScyllaClient) -> Self {
        Self {
            embeddings: Arc::new(ScyllaEmbeddingStore::new(client.clone())),
            profiles: Arc::new(ScyllaProfileStore::new(client.clone())),
            chat: Arc::new(ScyllaChatStore::new(client.clone())),
            analytics: Arc::new(ScyllaAnalyticsStore::new(client.clone())),
            usage: Arc::new(ScyllaUsageStore::new(client.clone())),
            shops: Arc::new(ScyllaShopSettingsStore::new(client)),
        }
    }
}

/// Build the persistence layer described by settings
///
/// With persistence disabled the in-memory store is used.
pub async fn init(config: &PersistenceConfig) -> Result<PersistenceLayer, PersistenceError> {
    if !config.enabled {
        tracing::info!("Persistence disabled, using in-memory stores");
        return Ok(PersistenceLayer::in_memory());
    }

    let client = ScyllaClient::connect(ScyllaConfig::from(config)).await?;
    client.ensure_schema().await?;
    Ok(PersistenceLayer::from_scylla(client))
}
