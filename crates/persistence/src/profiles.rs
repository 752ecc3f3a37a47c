//! Shopper profiles: preference bag, browsing history, interaction log

use crate::{PersistenceError, ScyllaClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_chat_config::constants::profile::{HISTORY_CAP, INTERACTIONS_CAP};
use storefront_chat_core::{Intent, UserPreferences};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Message,
    ProductView,
    ProductClick,
}

/// One entry of the interaction log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub kind: InteractionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    pub at: DateTime<Utc>,
}

impl Interaction {
    pub fn message(intent: Intent) -> Self {
        Self {
            kind: InteractionKind::Message,
            product_id: None,
            intent: Some(intent),
            at: Utc::now(),
        }
    }

    pub fn product(kind: InteractionKind, product_id: impl Into<String>) -> Self {
        Self {
            kind,
            product_id: Some(product_id.into()),
            intent: None,
            at: Utc::now(),
        }
    }
}

/// Rolling profile of one shopper session within a shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub profile_id: Uuid,
    pub shop_id: String,
    pub session_id: String,
    pub customer_id: Option<String>,
    pub preferences: UserPreferences,
    /// Most recent first
    pub browsing_history: Vec<String>,
    /// Oldest first
    pub interactions: Vec<Interaction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(shop_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            profile_id: Uuid::new_v4(),
            shop_id: shop_id.into(),
            session_id: session_id.into(),
            customer_id: None,
            preferences: UserPreferences::default(),
            browsing_history: Vec::new(),
            interactions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Move `product_id` to the front of the history, dropping the oldest past the cap
    pub fn record_view(&mut self, product_id: &str) {
        self.browsing_history.retain(|id| id != product_id);
        self.browsing_history.insert(0, product_id.to_string());
        self.browsing_history.truncate(HISTORY_CAP);
        self.updated_at = Utc::now();
    }

    pub fn record_interaction(&mut self, interaction: Interaction) {
        self.interactions.push(interaction);
        if self.interactions.len() > INTERACTIONS_CAP {
            let excess = self.interactions.len() - INTERACTIONS_CAP;
            self.interactions.drain(..excess);
        }
        self.updated_at = Utc::now();
    }

    /// Merge new preference signals into the stored bag
    pub fn merge_preferences(&mut self, incoming: &UserPreferences) {
        self.preferences.merge(incoming);
        self.updated_at = Utc::now();
    }

    /// Union of the stored history and ids the storefront reported this request
    pub fn recent_products(&self, reported: &[String]) -> Vec<String> {
        let mut ids: Vec<String> = reported.to_vec();
        for id in &self.browsing_history {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, shop_id: &str, session_id: &str) -> Result<Option<UserProfile>, PersistenceError>;
    async fn upsert(&self, profile: &UserProfile) -> Result<(), PersistenceError>;
}

#[derive(Clone)]
pub struct ScyllaProfileStore {
    client: ScyllaClient,
}

impl ScyllaProfileStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileStore for ScyllaProfileStore {
    async fn get(&self, shop_id: &str, session_id: &str) -> Result<Option<UserProfile>, PersistenceError> {
        let query = format!(
            "SELECT shop_id, session_id, profile_id, customer_id, preferences_json,
                    browsing_history, interactions_json, created_at, updated_at
             FROM {}.user_profiles WHERE shop_id = ? AND session_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (shop_id, session_id))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                return Ok(Some(row_to_profile(row)?));
            }
        }
        Ok(None)
    }

    async fn upsert(&self, profile: &UserProfile) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.user_profiles (
                shop_id, session_id, profile_id, customer_id, preferences_json,
                browsing_history, interactions_json, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        let preferences_json = serde_json::to_string(&profile.preferences)?;
        let interactions_json = serde_json::to_string(&profile.interactions)?;

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &profile.shop_id,
                    &profile.session_id,
                    profile.profile_id,
                    &profile.customer_id,
                    preferences_json,
                    &profile.browsing_history,
                    interactions_json,
                    profile.created_at.timestamp_millis(),
                    profile.updated_at.timestamp_millis(),
                ),
            )
            .await?;

        Ok(())
    }
}

fn row_to_profile(row: scylla::frame::response::result::Row) -> Result<UserProfile, PersistenceError> {
    let (
        shop_id,
        session_id,
        profile_id,
        customer_id,
        preferences_json,
        browsing_history,
        interactions_json,
        created_at,
        updated_at,
    ): (
        String,
        String,
        Uuid,
        Option<String>,
        Option<String>,
        Option<Vec<String>>,
        Option<String>,
        i64,
        i64,
    ) = row.into_typed()?;

    // A malformed preference bag reads as empty rather than failing the request
    let preferences = preferences_json
        .as_deref()
        .map(|json| {
            serde_json::from_str(json).unwrap_or_else(|e| {
                tracing::warn!(shop = %shop_id, session = %session_id, error = %e, "Discarding malformed preferences");
                UserPreferences::default()
            })
        })
        .unwrap_or_default();

    let interactions = interactions_json
        .as_deref()
        .and_then(|json| serde_json::from_str(json).ok())
        .unwrap_or_default();

    Ok(UserProfile {
        profile_id,
        shop_id,
        session_id,
        customer_id,
        preferences,
        browsing_history: browsing_history.unwrap_or_default(),
        interactions,
        created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
        updated_at: DateTime::from_timestamp_millis(updated_at).unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_most_recent_first_and_capped() {
        let mut profile = UserProfile::new("shop", "sess");
        for i in 0..60 {
            profile.record_view(&format!("p{}", i));
        }
        profile.record_view("p10");

        assert_eq!(profile.browsing_history.len(), HISTORY_CAP);
        assert_eq!(profile.browsing_history[0], "p10");
        assert_eq!(profile.browsing_history[1], "p59");
        assert_eq!(profile.browsing_history.iter().filter(|id| *id == "p10").count(), 1);
    }

    #[test]
    fn test_interactions_drop_oldest() {
        let mut profile = UserProfile::new("shop", "sess");
        for i in 0..105 {
            profile.record_interaction(Interaction::product(InteractionKind::ProductView, format!("p{}", i)));
        }
        assert_eq!(profile.interactions.len(), INTERACTIONS_CAP);
        assert_eq!(profile.interactions[0].product_id.as_deref(), Some("p5"));
    }

    #[test]
    fn test_recent_products_prefers_reported_order() {
        let mut profile = UserProfile::new("shop", "sess");
        profile.record_view("a");
        profile.record_view("b");
        let recent = profile.recent_products(&["c".to_string(), "a".to_string()]);
        assert_eq!(recent, vec!["c", "a", "b"]);
    }
}
