//! In-process store used when ScyllaDB is disabled and in tests
//!
//! Each map sits behind its own `parking_lot` lock; guards are never held
//! across an await point.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::analytics::{AnalyticsStore, DailyAnalytics, MessageMetrics};
use crate::chat::{ChatMessage, ChatSession, ChatStore};
use crate::embeddings::{EmbeddingStore, ProductEmbedding};
use crate::profiles::{ProfileStore, UserProfile};
use crate::shops::{ShopSettings, ShopSettingsStore};
use crate::usage::{BillingPeriod, ConversationUsageRecord, UsageStore};
use crate::PersistenceError;

type ShopKey = (String, String);

#[derive(Default)]
pub struct InMemoryStore {
    embeddings: RwLock<HashMap<ShopKey, ProductEmbedding>>,
    profiles: RwLock<HashMap<ShopKey, UserProfile>>,
    sessions: RwLock<HashMap<Uuid, ChatSession>>,
    messages: RwLock<HashMap<Uuid, Vec<ChatMessage>>>,
    analytics: RwLock<HashMap<(String, NaiveDate), DailyAnalytics>>,
    usage: RwLock<Vec<ConversationUsageRecord>>,
    shops: RwLock<HashMap<String, ShopSettings>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmbeddingStore for InMemoryStore {
    async fn get(&self, shop_id: &str, product_id: &str) -> Result<Option<ProductEmbedding>, PersistenceError> {
        Ok(self
            .embeddings
            .read()
            .get(&(shop_id.to_string(), product_id.to_string()))
            .cloned())
    }

    async fn upsert(&self, embedding: &ProductEmbedding) -> Result<(), PersistenceError> {
        let key = (embedding.shop_id.clone(), embedding.product_id.clone());
        let mut embeddings = self.embeddings.write();
        let mut row = embedding.clone();
        if let Some(existing) = embeddings.get(&key) {
            row.created_at = existing.created_at;
        }
        embeddings.insert(key, row);
        Ok(())
    }

    async fn clear_shop(&self, shop_id: &str) -> Result<u64, PersistenceError> {
        let mut embeddings = self.embeddings.write();
        let before = embeddings.len();
        embeddings.retain(|(shop, _), _| shop != shop_id);
        Ok((before - embeddings.len()) as u64)
    }

    async fn count(&self, shop_id: &str) -> Result<u64, PersistenceError> {
        Ok(self
            .embeddings
            .read()
            .keys()
            .filter(|(shop, _)| shop == shop_id)
            .count() as u64)
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get(&self, shop_id: &str, session_id: &str) -> Result<Option<UserProfile>, PersistenceError> {
        Ok(self
            .profiles
            .read()
            .get(&(shop_id.to_string(), session_id.to_string()))
            .cloned())
    }

    async fn upsert(&self, profile: &UserProfile) -> Result<(), PersistenceError> {
        self.profiles.write().insert(
            (profile.shop_id.clone(), profile.session_id.clone()),
            profile.clone(),
        );
        Ok(())
    }
}

#[async_trait]
impl ChatStore for InMemoryStore {
    async fn latest_session(&self, shop_id: &str, profile_id: Uuid) -> Result<Option<ChatSession>, PersistenceError> {
        Ok(self
            .sessions
            .read()
            .values()
            .filter(|s| s.shop_id == shop_id && s.profile_id == profile_id)
            .max_by_key(|s| s.last_activity)
            .cloned())
    }

    async fn save_session(&self, session: &ChatSession) -> Result<(), PersistenceError> {
        self.sessions.write().insert(session.chat_session_id, session.clone());
        Ok(())
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), PersistenceError> {
        self.messages
            .write()
            .entry(message.chat_session_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn messages(&self, chat_session_id: Uuid) -> Result<Vec<ChatMessage>, PersistenceError> {
        Ok(self
            .messages
            .read()
            .get(&chat_session_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl AnalyticsStore for InMemoryStore {
    async fn get(&self, shop_id: &str, date: NaiveDate) -> Result<Option<DailyAnalytics>, PersistenceError> {
        Ok(self.analytics.read().get(&(shop_id.to_string(), date)).cloned())
    }

    async fn record_message(
        &self,
        shop_id: &str,
        date: NaiveDate,
        metrics: &MessageMetrics,
    ) -> Result<(), PersistenceError> {
        self.analytics
            .write()
            .entry((shop_id.to_string(), date))
            .or_insert_with(|| DailyAnalytics::empty(shop_id, date))
            .apply_message(metrics);
        Ok(())
    }

    async fn record_click(&self, shop_id: &str, date: NaiveDate, product_id: &str) -> Result<(), PersistenceError> {
        self.analytics
            .write()
            .entry((shop_id.to_string(), date))
            .or_insert_with(|| DailyAnalytics::empty(shop_id, date))
            .apply_click(product_id);
        Ok(())
    }
}

#[async_trait]
impl UsageStore for InMemoryStore {
    async fn record(&self, record: &ConversationUsageRecord) -> Result<(), PersistenceError> {
        self.usage.write().push(record.clone());
        Ok(())
    }

    async fn count_in(&self, shop_id: &str, period: &BillingPeriod) -> Result<u64, PersistenceError> {
        Ok(self
            .usage
            .read()
            .iter()
            .filter(|r| r.shop_id == shop_id && period.contains(r.recorded_at))
            .count() as u64)
    }
}

#[async_trait]
impl ShopSettingsStore for InMemoryStore {
    async fn get(&self, shop_id: &str) -> Result<Option<ShopSettings>, PersistenceError> {
        Ok(self.shops.read().get(shop_id).cloned())
    }

    async fn upsert(&self, settings: &ShopSettings) -> Result<(), PersistenceError> {
        self.shops.write().insert(settings.shop_id.clone(), settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_embedding_upsert_keeps_created_at() {
        let store = InMemoryStore::new();
        let first = ProductEmbedding::new("shop", "p1", "m1", vec![1.0, 0.0]);
        EmbeddingStore::upsert(&store, &first).await.unwrap();

        let mut second = ProductEmbedding::new("shop", "p1", "m2", vec![0.0, 1.0]);
        second.created_at = first.created_at + chrono::Duration::seconds(30);
        EmbeddingStore::upsert(&store, &second).await.unwrap();

        let stored = EmbeddingStore::get(&store, "shop", "p1").await.unwrap().unwrap();
        assert_eq!(stored.model_id, "m2");
        assert_eq!(stored.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_clear_shop_only_touches_that_shop() {
        let store = InMemoryStore::new();
        for (shop, product) in [("a", "1"), ("a", "2"), ("b", "1")] {
            EmbeddingStore::upsert(&store, &ProductEmbedding::new(shop, product, "m", vec![1.0]))
                .await
                .unwrap();
        }
        assert_eq!(store.clear_shop("a").await.unwrap(), 2);
        assert_eq!(EmbeddingStore::count(&store, "a").await.unwrap(), 0);
        assert_eq!(EmbeddingStore::count(&store, "b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_usage_counted_per_month() {
        let store = InMemoryStore::new();
        let march = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 0).unwrap();
        let april = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        store.record(&ConversationUsageRecord::new("shop", None).at(march)).await.unwrap();
        store.record(&ConversationUsageRecord::new("shop", None).at(april)).await.unwrap();
        store.record(&ConversationUsageRecord::new("other", None).at(march)).await.unwrap();

        let period = BillingPeriod::containing(march);
        assert_eq!(store.count_in("shop", &period).await.unwrap(), 1);
        assert_eq!(store.count_in("shop", &BillingPeriod::containing(april)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_latest_session_by_activity() {
        let store = InMemoryStore::new();
        let profile_id = Uuid::new_v4();
        let old = ChatSession::new("shop", profile_id);
        let mut recent = ChatSession::new("shop", profile_id);
        recent.last_activity = old.last_activity + chrono::Duration::minutes(5);
        store.save_session(&old).await.unwrap();
        store.save_session(&recent).await.unwrap();

        let latest = store.latest_session("shop", profile_id).await.unwrap().unwrap();
        assert_eq!(latest.chat_session_id, recent.chat_session_id);
    }
}
