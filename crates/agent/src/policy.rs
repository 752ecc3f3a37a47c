//! Shop policy resolution
//!
//! Policy texts supplied with the request win. Missing fields come from a
//! [`PolicySource`] through a per-shop cache with a freshness window; when a
//! refresh fails the last known texts are served instead.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use storefront_chat_config::constants::policy::{MIN_MEANINGFUL_CHARS, PREVIEW_CHARS};
use storefront_chat_core::{Intent, ShopPolicies};
use storefront_chat_persistence::ShopSettingsStore;
use storefront_chat_text_processing::{collapse_whitespace, preview, strip_html};

use crate::AgentError;

/// Provider of a shop's policy texts
#[async_trait]
pub trait PolicySource: Send + Sync {
    /// Fetch current policies for a shop
    ///
    /// # Arguments
    /// * `shop_id` - Shop whose policies are requested
    async fn fetch(&self, shop_id: &str) -> Result<ShopPolicies, AgentError>;
}

/// Policies stored alongside the shop settings
pub struct StoredPolicySource {
    store: Arc<dyn ShopSettingsStore>,
}

impl StoredPolicySource {
    pub fn new(store: Arc<dyn ShopSettingsStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PolicySource for StoredPolicySource {
    async fn fetch(&self, shop_id: &str) -> Result<ShopPolicies, AgentError> {
        Ok(self
            .store
            .get(shop_id)
            .await?
            .map(|settings| settings.policies)
            .unwrap_or_default())
    }
}

struct CachedPolicies {
    policies: ShopPolicies,
    fetched_at: Instant,
}

pub struct PolicyCache {
    source: Arc<dyn PolicySource>,
    freshness: Duration,
    entries: RwLock<HashMap<String, CachedPolicies>>,
}

impl PolicyCache {
    pub fn new(source: Arc<dyn PolicySource>, freshness: Duration) -> Self {
        Self {
            source,
            freshness,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Policies for a shop, request-supplied fields first
    pub async fn resolve(&self, shop_id: &str, supplied: Option<&ShopPolicies>) -> ShopPolicies {
        let mut resolved = supplied.cloned().unwrap_or_default();
        if resolved.returns.is_some() && resolved.shipping.is_some() {
            return resolved;
        }

        let known = self.cached(shop_id).await;
        resolved.returns = resolved.returns.or(known.returns);
        resolved.shipping = resolved.shipping.or(known.shipping);
        resolved.privacy = resolved.privacy.or(known.privacy);
        resolved
    }

    async fn cached(&self, shop_id: &str) -> ShopPolicies {
        let stale = {
            let entries = self.entries.read();
            match entries.get(shop_id) {
                Some(entry) if entry.fetched_at.elapsed() < self.freshness => return entry.policies.clone(),
                Some(entry) => Some(entry.policies.clone()),
                None => None,
            }
        };

        match self.source.fetch(shop_id).await {
            Ok(policies) => {
                self.entries.write().insert(
                    shop_id.to_string(),
                    CachedPolicies {
                        policies: policies.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                policies
            }
            Err(e) => {
                tracing::warn!(shop = %shop_id, error = %e, has_stale = stale.is_some(), "Policy refresh failed");
                stale.unwrap_or_default()
            }
        }
    }

    /// Drop the cached entry so the next lookup refetches
    pub fn invalidate(&self, shop_id: &str) {
        self.entries.write().remove(shop_id);
    }
}

/// Quotable preview of the policy answering `intent`
///
/// `None` unless the policy has enough text to be worth quoting.
pub fn policy_preview(intent: Intent, policies: &ShopPolicies) -> Option<String> {
    let raw = match intent {
        Intent::Shipping => policies.shipping.as_deref(),
        Intent::Returns => policies.returns.as_deref(),
        _ => None,
    }?;

    let text = collapse_whitespace(&strip_html(raw));
    if text.chars().count() <= MIN_MEANINGFUL_CHARS {
        return None;
    }
    Some(preview(&text, PREVIEW_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FlakySource {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait]
    impl PolicySource for FlakySource {
        async fn fetch(&self, _shop_id: &str) -> Result<ShopPolicies, AgentError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(AgentError::Upstream("policy service down".to_string()));
            }
            Ok(ShopPolicies {
                shipping: Some(format!("Shipping text version {}", n)),
                ..Default::default()
            })
        }
    }

    fn cache() -> (PolicyCache, Arc<FlakySource>) {
        let source = Arc::new(FlakySource {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        });
        (PolicyCache::new(source.clone(), Duration::from_secs(3600)), source)
    }

    #[tokio::test]
    async fn test_request_policies_win() {
        let (cache, source) = cache();
        let supplied = ShopPolicies {
            returns: Some("Returns from request".into()),
            shipping: Some("Shipping from request".into()),
            privacy: None,
        };
        let resolved = cache.resolve("shop", Some(&supplied)).await;
        assert_eq!(resolved.shipping.as_deref(), Some("Shipping from request"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_then_refetch_after_window() {
        let (cache, source) = cache();
        cache.resolve("shop", None).await;
        cache.resolve("shop", None).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(3601)).await;
        let resolved = cache.resolve("shop", None).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolved.shipping.as_deref(), Some("Shipping text version 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_served_when_refresh_fails() {
        let (cache, source) = cache();
        cache.resolve("shop", None).await;
        source.failing.store(true, Ordering::SeqCst);

        tokio::time::advance(Duration::from_secs(7200)).await;
        let resolved = cache.resolve("shop", None).await;
        assert_eq!(resolved.shipping.as_deref(), Some("Shipping text version 0"));

        let unknown = cache.resolve("other-shop", None).await;
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_preview_threshold() {
        let short = ShopPolicies {
            shipping: Some("Ships fast.".into()),
            ..Default::default()
        };
        assert!(policy_preview(Intent::Shipping, &short).is_none());

        let long = ShopPolicies {
            returns: Some(format!("<p>{}</p>", "Returns accepted within 30 days of delivery. ".repeat(20))),
            ..Default::default()
        };
        let quoted = policy_preview(Intent::Returns, &long).unwrap();
        assert!(quoted.chars().count() <= PREVIEW_CHARS);
        assert!(!quoted.contains("<p>"));
        assert!(policy_preview(Intent::Shipping, &long).is_none());
    }
}
