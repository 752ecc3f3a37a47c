//! Per-shop daily analytics

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

use storefront_chat_core::ChatResponse;
use storefront_chat_persistence::{AnalyticsStore, DailyAnalytics, MessageMetrics, PersistenceError};

/// Folds completed messages and product clicks into per-day counters
#[derive(Clone)]
pub struct UsageAggregator {
    store: Arc<dyn AnalyticsStore>,
}

impl UsageAggregator {
    pub fn new(store: Arc<dyn AnalyticsStore>) -> Self {
        Self { store }
    }

    /// Count one answered message on its UTC day
    pub async fn record_message(
        &self,
        shop_id: &str,
        response: &ChatResponse,
        workflow_type: &str,
        at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        let metrics = MessageMetrics {
            response_time_ms: response.analytics.response_time_ms,
            confidence: response.confidence,
            intent: response.analytics.intent_detected.as_str().to_string(),
            sentiment: response.sentiment.as_str().to_string(),
            products_shown: response.shown_product_ids(),
            workflow_type: workflow_type.to_string(),
        };
        self.store.record_message(shop_id, at.date_naive(), &metrics).await
    }

    pub async fn record_click(&self, shop_id: &str, product_id: &str, at: DateTime<Utc>) -> Result<(), PersistenceError> {
        self.store.record_click(shop_id, at.date_naive(), product_id).await
    }

    /// Counters for one day; an untouched day reads as all zeros
    pub async fn daily(&self, shop_id: &str, date: NaiveDate) -> Result<DailyAnalytics, PersistenceError> {
        Ok(self
            .store
            .get(shop_id, date)
            .await?
            .unwrap_or_else(|| DailyAnalytics::empty(shop_id, date)))
    }
}
