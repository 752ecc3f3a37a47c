//! Top-level resolver: one shopper message in, one response out

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

use storefront_chat_config::Settings;
use storefront_chat_core::{ChatRequest, ChatResponse, Locale, Product};
use storefront_chat_llm::LlmBackend;
use storefront_chat_persistence::{DailyAnalytics, PersistenceLayer, ShopSettings, ShopSettingsStore};
use storefront_chat_rag::{
    BatchSummary, CacheOptions, EmbeddingCache, EmbeddingProvider, KeywordRanker, PersonalizationSignals,
    SemanticRanker,
};
use storefront_chat_text_processing::{detect_locale, IntentClassifier};

use crate::analytics::UsageAggregator;
use crate::composer::ResponseComposer;
use crate::pipeline::{FallbackPipeline, PipelineInput};
use crate::policy::{PolicyCache, PolicySource, StoredPolicySource};
use crate::quota::{QuotaChecker, QuotaStatus};
use crate::session::{Conversation, ConversationTracker};
use crate::workflow::{DispatchRoute, WorkflowBackend, WorkflowDispatcher};
use crate::AgentError;

/// External services the assistant is wired with
#[derive(Clone)]
pub struct AssistantServices {
    pub persistence: PersistenceLayer,
    pub llm: Option<Arc<dyn LlmBackend>>,
    pub embedder: Option<Arc<dyn EmbeddingProvider>>,
    pub workflow: Option<Arc<dyn WorkflowBackend>>,
    pub policy_source: Option<Arc<dyn PolicySource>>,
}

impl AssistantServices {
    /// Stores only; every optional service off
    pub fn new(persistence: PersistenceLayer) -> Self {
        Self {
            persistence,
            llm: None,
            embedder: None,
            workflow: None,
            policy_source: None,
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmBackend>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_workflow(mut self, workflow: Arc<dyn WorkflowBackend>) -> Self {
        self.workflow = Some(workflow);
        self
    }

    pub fn with_policy_source(mut self, source: Arc<dyn PolicySource>) -> Self {
        self.policy_source = Some(source);
        self
    }
}

pub struct StorefrontAssistant {
    pipeline: FallbackPipeline,
    dispatcher: WorkflowDispatcher,
    policies: PolicyCache,
    tracker: ConversationTracker,
    aggregator: UsageAggregator,
    quota: QuotaChecker,
    shops: Arc<dyn ShopSettingsStore>,
    embeddings: Option<EmbeddingCache>,
    detect_locale: bool,
    enforce_quota: bool,
}

impl StorefrontAssistant {
    pub fn new(settings: &Settings, services: AssistantServices) -> Self {
        let store = services.persistence;

        let embeddings = services
            .embedder
            .map(|provider| EmbeddingCache::new(store.embeddings.clone(), provider, CacheOptions::from(&settings.embedding)));
        let semantic = embeddings
            .clone()
            .filter(|_| settings.ranking.semantic_enabled)
            .map(|cache| SemanticRanker::new(cache, &settings.ranking));

        let classifier = IntentClassifier::new(services.llm, Duration::from_millis(settings.llm.timeout_ms));
        let pipeline = FallbackPipeline::new(
            classifier,
            semantic,
            KeywordRanker::new(&settings.ranking),
            ResponseComposer::new(&settings.ranking),
        )
        .with_semantic_budget(Duration::from_millis(settings.pipeline.semantic_budget_ms));

        let policy_source = services
            .policy_source
            .unwrap_or_else(|| Arc::new(StoredPolicySource::new(store.shops.clone())));

        Self {
            pipeline,
            dispatcher: WorkflowDispatcher::new(services.workflow, &settings.workflow, &settings.pipeline),
            policies: PolicyCache::new(policy_source, Duration::from_secs(settings.pipeline.policy_freshness_secs)),
            tracker: ConversationTracker::new(
                store.profiles.clone(),
                store.chat.clone(),
                Duration::from_secs(settings.pipeline.session_reuse_secs),
            ),
            aggregator: UsageAggregator::new(store.analytics.clone()),
            quota: QuotaChecker::new(store.usage.clone()),
            shops: store.shops,
            embeddings,
            detect_locale: settings.pipeline.detect_locale,
            enforce_quota: settings.pipeline.enforce_quota,
        }
    }

    /// Resolve a shopper message
    pub async fn respond(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        self.respond_at(request, Utc::now()).await
    }

    /// Resolve a shopper message as of `now` (billing period and analytics day)
    pub async fn respond_at(&self, request: ChatRequest, now: DateTime<Utc>) -> Result<ChatResponse, AgentError> {
        validate(&request)?;
        let started = Instant::now();
        let shop_id = request.context.shop_id.clone();
        metrics::counter!("storefront_chat_requests_total").increment(1);

        let locale = self.locale_for(&request);
        let settings = self.shop_settings(&shop_id).await;

        if self.enforce_quota && !self.quota_allows(&settings, now).await {
            let response = ResponseComposer::quota_exceeded(locale);
            metrics::counter!("storefront_chat_tier_total", "tier" => response.message_type.clone()).increment(1);
            return Ok(response);
        }

        let mut conversation = match self.tracker.begin(&request.context).await {
            Ok(conversation) => Some(conversation),
            Err(e) => {
                tracing::warn!(shop = %shop_id, error = %e, "Could not load conversation, continuing untracked");
                None
            }
        };
        let signals = match &conversation {
            Some(c) => c.signals(&request.context.recent_products),
            None => PersonalizationSignals::from_profile(
                &request.context.user_preferences.clone().unwrap_or_default(),
                request.context.recent_products.clone(),
            ),
        };
        let policies = self
            .policies
            .resolve(&shop_id, request.context.shop_policies.as_ref())
            .await;

        let outcome = self
            .dispatcher
            .dispatch(&settings, &request, locale, || {
                self.pipeline.run(PipelineInput {
                    shop_id: &shop_id,
                    utterance: &request.utterance,
                    products: &request.products,
                    locale,
                    policies: &policies,
                    signals: &signals,
                })
            })
            .await;

        let mut response = outcome.response;
        response.analytics.response_time_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            shop = %shop_id,
            route = ?outcome.route,
            message_type = %response.message_type,
            intent = %response.analytics.intent_detected,
            confidence = response.confidence,
            products = response.recommendations.len(),
            elapsed_ms = response.analytics.response_time_ms,
            "Resolved message"
        );
        metrics::counter!("storefront_chat_tier_total", "tier" => response.message_type.clone()).increment(1);
        metrics::histogram!("storefront_chat_response_ms").record(response.analytics.response_time_ms as f64);

        self.record(&request, conversation.as_mut(), &response, outcome.route, now)
            .await;
        Ok(response)
    }

    /// Persist the exchange, analytics and billing; failures are logged only
    async fn record(
        &self,
        request: &ChatRequest,
        conversation: Option<&mut Conversation>,
        response: &ChatResponse,
        route: DispatchRoute,
        now: DateTime<Utc>,
    ) {
        let shop_id = &request.context.shop_id;

        if let Some(conversation) = conversation {
            if let Err(e) = self.tracker.record_exchange(conversation, &request.utterance, response).await {
                tracing::warn!(shop = %shop_id, error = %e, "Failed to persist chat exchange");
            }
        }

        if let Err(e) = self
            .aggregator
            .record_message(shop_id, response, route.answered_by().as_str(), now)
            .await
        {
            tracing::warn!(shop = %shop_id, error = %e, "Failed to record analytics");
        }

        if route == DispatchRoute::Exhausted {
            return;
        }
        if let Err(e) = self.quota.record(shop_id, Some(&request.context.session_id), now).await {
            tracing::warn!(shop = %shop_id, error = %e, "Failed to record conversation usage");
        }
    }

    fn locale_for(&self, request: &ChatRequest) -> Locale {
        if self.detect_locale && request.context.wants_locale_detection() {
            return detect_locale(&request.utterance).unwrap_or_default();
        }
        request.context.resolved_locale()
    }

    async fn quota_allows(&self, settings: &ShopSettings, now: DateTime<Utc>) -> bool {
        match self.quota.allows(&settings.shop_id, settings.plan, now).await {
            Ok(allowed) => allowed,
            Err(e) => {
                // Usage store down: answer rather than block the shopper
                tracing::warn!(shop = %settings.shop_id, error = %e, "Quota check failed");
                true
            }
        }
    }

    /// Settings of a shop; unknown shops get the defaults
    pub async fn shop_settings(&self, shop_id: &str) -> ShopSettings {
        match self.shops.get(shop_id).await {
            Ok(Some(settings)) => settings,
            Ok(None) => ShopSettings::new(shop_id),
            Err(e) => {
                tracing::warn!(shop = %shop_id, error = %e, "Failed to load shop settings, using defaults");
                ShopSettings::new(shop_id)
            }
        }
    }

    pub async fn update_shop_settings(&self, settings: &ShopSettings) -> Result<(), AgentError> {
        self.shops.upsert(settings).await?;
        self.policies.invalidate(&settings.shop_id);
        Ok(())
    }

    /// Record a product click from the widget
    pub async fn record_click(
        &self,
        shop_id: &str,
        session_id: Option<&str>,
        product_id: &str,
    ) -> Result<(), AgentError> {
        if product_id.trim().is_empty() {
            return Err(AgentError::Validation("productId is required".to_string()));
        }
        let now = Utc::now();
        self.aggregator.record_click(shop_id, product_id, now).await?;
        if let Some(session_id) = session_id.filter(|s| !s.is_empty()) {
            self.tracker.record_click(shop_id, session_id, product_id).await?;
        }
        Ok(())
    }

    pub async fn daily_analytics(&self, shop_id: &str, date: NaiveDate) -> Result<DailyAnalytics, AgentError> {
        Ok(self.aggregator.daily(shop_id, date).await?)
    }

    /// Quota usage in the current billing period
    pub async fn usage(&self, shop_id: &str) -> Result<QuotaStatus, AgentError> {
        let settings = self.shop_settings(shop_id).await;
        Ok(self.quota.status(shop_id, settings.plan, Utc::now()).await?)
    }

    /// Pre-compute product embeddings for a shop
    pub async fn generate_embeddings(&self, shop_id: &str, products: &[Product]) -> Result<BatchSummary, AgentError> {
        let cache = self.embedding_cache()?;
        Ok(cache.ensure_batch(shop_id, products).await)
    }

    /// Delete all product embeddings of a shop
    pub async fn clear_embeddings(&self, shop_id: &str) -> Result<u64, AgentError> {
        let cache = self.embedding_cache()?;
        Ok(cache.clear(shop_id).await?)
    }

    fn embedding_cache(&self) -> Result<&EmbeddingCache, AgentError> {
        self.embeddings
            .as_ref()
            .ok_or_else(|| AgentError::Configuration("no embedding provider configured".to_string()))
    }

    pub fn has_semantic_ranking(&self) -> bool {
        self.embeddings.is_some()
    }

    pub fn has_llm(&self) -> bool {
        self.pipeline.classifier().has_llm()
    }
}

fn validate(request: &ChatRequest) -> Result<(), AgentError> {
    if request.utterance.trim().is_empty() {
        return Err(AgentError::Validation("utterance is required".to_string()));
    }
    if request.context.shop_id.trim().is_empty() {
        return Err(AgentError::Validation("context.shopId is required".to_string()));
    }
    if request.context.session_id.trim().is_empty() {
        return Err(AgentError::Validation("context.sessionId is required".to_string()));
    }
    Ok(())
}
