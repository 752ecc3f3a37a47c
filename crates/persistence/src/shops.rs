//! Per-shop settings: plan tier, workflow routing, stored policy texts

use crate::{PersistenceError, ScyllaClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

use storefront_chat_core::{PlanTier, ShopPolicies};

/// How a shop's messages are routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    /// Built-in resolution pipeline only
    #[default]
    Default,
    /// Merchant webhook first, built-in pipeline as fallback
    Custom,
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for WorkflowType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "custom" => Self::Custom,
            _ => Self::Default,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSettings {
    pub shop_id: String,
    #[serde(default)]
    pub plan: PlanTier,
    #[serde(default)]
    pub workflow_type: WorkflowType,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub webhook_secret: Option<String>,
    #[serde(default)]
    pub policies: ShopPolicies,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl ShopSettings {
    pub fn new(shop_id: impl Into<String>) -> Self {
        Self {
            shop_id: shop_id.into(),
            plan: PlanTier::default(),
            workflow_type: WorkflowType::default(),
            webhook_url: None,
            webhook_secret: None,
            policies: ShopPolicies::default(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_plan(mut self, plan: PlanTier) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_webhook(mut self, url: impl Into<String>, secret: Option<String>) -> Self {
        self.workflow_type = WorkflowType::Custom;
        self.webhook_url = Some(url.into());
        self.webhook_secret = secret;
        self
    }

    pub fn with_policies(mut self, policies: ShopPolicies) -> Self {
        self.policies = policies;
        self
    }
}

#[async_trait]
pub trait ShopSettingsStore: Send + Sync {
    async fn get(&self, shop_id: &str) -> Result<Option<ShopSettings>, PersistenceError>;
    async fn upsert(&self, settings: &ShopSettings) -> Result<(), PersistenceError>;
}

#[derive(Clone)]
pub struct ScyllaShopSettingsStore {
    client: ScyllaClient,
}

impl ScyllaShopSettingsStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ShopSettingsStore for ScyllaShopSettingsStore {
    async fn get(&self, shop_id: &str) -> Result<Option<ShopSettings>, PersistenceError> {
        let query = format!(
            "SELECT shop_id, plan, workflow_type, webhook_url, webhook_secret, policies_json, updated_at
             FROM {}.shop_settings WHERE shop_id = ?",
            self.client.keyspace()
        );

        let result = self.client.session().query_unpaged(query, (shop_id,)).await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (shop_id, plan, workflow_type, webhook_url, webhook_secret, policies_json, updated_at): (
                    String,
                    Option<String>,
                    Option<String>,
                    Option<String>,
                    Option<String>,
                    Option<String>,
                    i64,
                ) = row.into_typed()?;

                let policies = policies_json
                    .as_deref()
                    .and_then(|json| serde_json::from_str(json).ok())
                    .unwrap_or_default();

                return Ok(Some(ShopSettings {
                    shop_id,
                    plan: plan.as_deref().and_then(|s| s.parse().ok()).unwrap_or_default(),
                    workflow_type: workflow_type.as_deref().and_then(|s| s.parse().ok()).unwrap_or_default(),
                    webhook_url,
                    webhook_secret,
                    policies,
                    updated_at: DateTime::from_timestamp_millis(updated_at).unwrap_or_else(Utc::now),
                }));
            }
        }
        Ok(None)
    }

    async fn upsert(&self, settings: &ShopSettings) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.shop_settings (
                shop_id, plan, workflow_type, webhook_url, webhook_secret, policies_json, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        let policies_json = serde_json::to_string(&settings.policies)?;
        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &settings.shop_id,
                    settings.plan.as_str(),
                    settings.workflow_type.as_str(),
                    &settings.webhook_url,
                    &settings.webhook_secret,
                    policies_json,
                    settings.updated_at.timestamp_millis(),
                ),
            )
            .await?;

        tracing::info!(shop = %settings.shop_id, plan = %settings.plan, workflow = settings.workflow_type.as_str(), "Shop settings saved");
        Ok(())
    }
}
