//! Per-shop, per-UTC-day analytics counters
//!
//! Rows are only ever incremented. The ScyllaDB store keeps one counter per
//! (dimension, key) so concurrent messages never overwrite each other.

use crate::{PersistenceError, ScyllaClient};
use async_trait::async_trait;
use chrono::NaiveDate;
use scylla::frame::value::Counter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Confidence is accumulated in thousandths so it fits an integer counter
const CONFIDENCE_SCALE: f64 = 1000.0;

const DIM_TOTALS: &str = "totals";
const KEY_MESSAGES: &str = "messages";
const KEY_RESPONSE_MS: &str = "response_ms";
const KEY_CONFIDENCE: &str = "confidence_milli";
const DIM_INTENT: &str = "intent";
const DIM_SENTIMENT: &str = "sentiment";
const DIM_PRODUCT_SHOWN: &str = "product_shown";
const DIM_PRODUCT_CLICK: &str = "product_click";
const DIM_WORKFLOW: &str = "workflow";

/// What one answered message contributes to the day's row
#[derive(Debug, Clone, PartialEq)]
pub struct MessageMetrics {
    pub response_time_ms: u64,
    pub confidence: f32,
    pub intent: String,
    pub sentiment: String,
    pub products_shown: Vec<String>,
    pub workflow_type: String,
}

/// Aggregated row for one shop and UTC date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnalytics {
    pub shop_id: String,
    pub date: Option<NaiveDate>,
    pub message_count: u64,
    pub total_response_time_ms: u64,
    pub total_confidence: f64,
    pub intents: HashMap<String, u64>,
    pub sentiments: HashMap<String, u64>,
    pub products_shown: HashMap<String, u64>,
    pub product_clicks: HashMap<String, u64>,
    pub workflow_types: HashMap<String, u64>,
}

impl DailyAnalytics {
    pub fn empty(shop_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            shop_id: shop_id.into(),
            date: Some(date),
            ..Default::default()
        }
    }

    pub fn apply_message(&mut self, metrics: &MessageMetrics) {
        self.message_count += 1;
        self.total_response_time_ms += metrics.response_time_ms;
        self.total_confidence += f64::from(metrics.confidence);
        *self.intents.entry(metrics.intent.clone()).or_default() += 1;
        *self.sentiments.entry(metrics.sentiment.clone()).or_default() += 1;
        for product_id in &metrics.products_shown {
            *self.products_shown.entry(product_id.clone()).or_default() += 1;
        }
        *self.workflow_types.entry(metrics.workflow_type.clone()).or_default() += 1;
    }

    pub fn apply_click(&mut self, product_id: &str) {
        *self.product_clicks.entry(product_id.to_string()).or_default() += 1;
    }

    pub fn average_response_time_ms(&self) -> f64 {
        if self.message_count == 0 {
            0.0
        } else {
            self.total_response_time_ms as f64 / self.message_count as f64
        }
    }

    pub fn average_confidence(&self) -> f64 {
        if self.message_count == 0 {
            0.0
        } else {
            self.total_confidence / self.message_count as f64
        }
    }
}

#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    async fn get(&self, shop_id: &str, date: NaiveDate) -> Result<Option<DailyAnalytics>, PersistenceError>;

    async fn record_message(
        &self,
        shop_id: &str,
        date: NaiveDate,
        metrics: &MessageMetrics,
    ) -> Result<(), PersistenceError>;

    async fn record_click(&self, shop_id: &str, date: NaiveDate, product_id: &str) -> Result<(), PersistenceError>;
}

#[derive(Clone)]
pub struct ScyllaAnalyticsStore {
    client: ScyllaClient,
}

impl ScyllaAnalyticsStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    async fn increment(
        &self,
        shop_id: &str,
        day: &str,
        dimension: &str,
        key: &str,
        by: i64,
    ) -> Result<(), PersistenceError> {
        let query = format!(
            "UPDATE {}.daily_counters SET value = value + ?
             WHERE shop_id = ? AND day = ? AND dimension = ? AND key = ?",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(query, (Counter(by), shop_id, day, dimension, key))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsStore for ScyllaAnalyticsStore {
    async fn get(&self, shop_id: &str, date: NaiveDate) -> Result<Option<DailyAnalytics>, PersistenceError> {
        let query = format!(
            "SELECT dimension, key, value FROM {}.daily_counters WHERE shop_id = ? AND day = ?",
            self.client.keyspace()
        );

        let day = date.to_string();
        let result = self
            .client
            .session()
            .query_unpaged(query, (shop_id, day.as_str()))
            .await?;

        let rows = match result.rows {
            Some(rows) if !rows.is_empty() => rows,
            _ => return Ok(None),
        };

        let mut analytics = DailyAnalytics::empty(shop_id, date);
        for row in rows {
            let (dimension, key, value): (String, String, Counter) = row.into_typed()?;
            let value = value.0.max(0) as u64;
            match (dimension.as_str(), key.as_str()) {
                (DIM_TOTALS, KEY_MESSAGES) => analytics.message_count = value,
                (DIM_TOTALS, KEY_RESPONSE_MS) => analytics.total_response_time_ms = value,
                (DIM_TOTALS, KEY_CONFIDENCE) => analytics.total_confidence = value as f64 / CONFIDENCE_SCALE,
                (DIM_INTENT, _) => {
                    analytics.intents.insert(key, value);
                }
                (DIM_SENTIMENT, _) => {
                    analytics.sentiments.insert(key, value);
                }
                (DIM_PRODUCT_SHOWN, _) => {
                    analytics.products_shown.insert(key, value);
                }
                (DIM_PRODUCT_CLICK, _) => {
                    analytics.product_clicks.insert(key, value);
                }
                (DIM_WORKFLOW, _) => {
                    analytics.workflow_types.insert(key, value);
                }
                _ => tracing::debug!(dimension = %dimension, key = %key, "Ignoring unknown analytics counter"),
            }
        }

        Ok(Some(analytics))
    }

    async fn record_message(
        &self,
        shop_id: &str,
        date: NaiveDate,
        metrics: &MessageMetrics,
    ) -> Result<(), PersistenceError> {
        let day = date.to_string();
        let confidence_milli = (f64::from(metrics.confidence) * CONFIDENCE_SCALE).round() as i64;

        self.increment(shop_id, &day, DIM_TOTALS, KEY_MESSAGES, 1).await?;
        self.increment(shop_id, &day, DIM_TOTALS, KEY_RESPONSE_MS, metrics.response_time_ms as i64)
            .await?;
        self.increment(shop_id, &day, DIM_TOTALS, KEY_CONFIDENCE, confidence_milli).await?;
        self.increment(shop_id, &day, DIM_INTENT, &metrics.intent, 1).await?;
        self.increment(shop_id, &day, DIM_SENTIMENT, &metrics.sentiment, 1).await?;
        for product_id in &metrics.products_shown {
            self.increment(shop_id, &day, DIM_PRODUCT_SHOWN, product_id, 1).await?;
        }
        self.increment(shop_id, &day, DIM_WORKFLOW, &metrics.workflow_type, 1).await?;
        Ok(())
    }

    async fn record_click(&self, shop_id: &str, date: NaiveDate, product_id: &str) -> Result<(), PersistenceError> {
        self.increment(shop_id, &date.to_string(), DIM_PRODUCT_CLICK, product_id, 1)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(intent: &str, confidence: f32, products: &[&str]) -> MessageMetrics {
        MessageMetrics {
            response_time_ms: 100,
            confidence,
            intent: intent.to_string(),
            sentiment: "neutral".to_string(),
            products_shown: products.iter().map(|p| p.to_string()).collect(),
            workflow_type: "default".to_string(),
        }
    }

    #[test]
    fn test_apply_message_accumulates() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let mut day = DailyAnalytics::empty("shop", date);
        day.apply_message(&metrics("PRODUCT_SEARCH", 0.85, &["p1", "p2"]));
        day.apply_message(&metrics("SHIPPING", 0.8, &["p1"]));

        assert_eq!(day.message_count, 2);
        assert_eq!(day.total_response_time_ms, 200);
        assert_eq!(day.intents["PRODUCT_SEARCH"], 1);
        assert_eq!(day.products_shown["p1"], 2);
        assert_eq!(day.workflow_types["default"], 2);
        assert!((day.average_confidence() - 0.825).abs() < 1e-6);
        assert_eq!(day.average_response_time_ms(), 100.0);
    }

    #[test]
    fn test_empty_averages_are_zero() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let day = DailyAnalytics::empty("shop", date);
        assert_eq!(day.average_confidence(), 0.0);
        assert_eq!(day.average_response_time_ms(), 0.0);
    }
}
