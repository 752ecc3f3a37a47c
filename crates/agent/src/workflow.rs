//! External workflow dispatch
//!
//! A shop may route messages to its own workflow backend. The dispatcher
//! tries that backend first and falls through to the built-in ranking
//! pipeline on any failure. The sequence is an explicit state machine that
//! ends in exactly one [`DispatchOutcome`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use storefront_chat_config::constants::timeouts::HTTP_REQUEST_SECS;
use storefront_chat_config::{PipelineConfig, WorkflowConfig};
use storefront_chat_core::{
    mask_url, ChatRequest, ChatResponse, Intent, Locale, RankedProduct, ResponseTier, Sentiment,
    SuggestedAction, TierFailure,
};
use storefront_chat_persistence::{ShopSettings, WorkflowType};
use storefront_chat_text_processing::{match_intent, match_sentiment};

use crate::composer::ResponseComposer;
use crate::AgentError;

/// Where a shop's custom workflow lives
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowTarget {
    pub url: reqwest::Url,
    pub secret: Option<String>,
}

impl WorkflowTarget {
    /// Validate a shop's workflow configuration
    ///
    /// Shops on the default workflow, or with a missing or unusable webhook
    /// URL, are `NotConfigured`.
    pub fn from_settings(settings: &ShopSettings, allow_insecure_http: bool) -> Result<Self, TierFailure> {
        if settings.workflow_type != WorkflowType::Custom {
            return Err(TierFailure::NotConfigured("shop uses the default workflow".to_string()));
        }

        let raw = settings
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| TierFailure::NotConfigured("custom workflow without webhook URL".to_string()))?;

        let url = reqwest::Url::parse(raw)
            .map_err(|e| TierFailure::NotConfigured(format!("invalid webhook URL: {}", e)))?;

        match url.scheme() {
            "https" => {}
            "http" if allow_insecure_http => {}
            other => {
                return Err(TierFailure::NotConfigured(format!("webhook scheme '{}' not allowed", other)));
            }
        }

        Ok(Self {
            url,
            secret: settings.webhook_secret.clone().filter(|s| !s.is_empty()),
        })
    }
}

/// Payload an external workflow answers with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowReply {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub recommendations: Vec<RankedProduct>,
    #[serde(default)]
    pub quick_replies: Vec<String>,
    #[serde(default)]
    pub suggested_actions: Vec<SuggestedAction>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub requires_human_escalation: bool,
}

impl WorkflowReply {
    /// Reject replies without a usable message
    pub fn validate(self) -> Result<Self, TierFailure> {
        if self.message.trim().is_empty() {
            return Err(TierFailure::Malformed("workflow reply has no message".to_string()));
        }
        Ok(self)
    }

    /// Convert into a shopper response; the fallback labels are used when
    /// the backend did not label the message
    pub fn into_response(self, fallback_intent: Intent, fallback_sentiment: Sentiment) -> ChatResponse {
        let intent = self
            .intent
            .as_deref()
            .and_then(Intent::from_label)
            .unwrap_or(fallback_intent);

        let mut response = ChatResponse::for_tier(ResponseTier::Workflow, self.message, intent);
        response.recommendations = self.recommendations;
        response.quick_replies = self.quick_replies;
        response.suggested_actions = self.suggested_actions;
        if let Some(confidence) = self.confidence.filter(|c| c.is_finite()) {
            response.confidence = confidence.clamp(0.0, 1.0);
        }
        response.sentiment = self
            .sentiment
            .as_deref()
            .and_then(Sentiment::from_label)
            .unwrap_or(fallback_sentiment);
        response.requires_human_escalation = self.requires_human_escalation;
        response
    }
}

/// External workflow backend
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    /// Forward a shopper message to a workflow
    ///
    /// # Arguments
    /// * `target` - Validated webhook of the shop
    /// * `request` - The inbound request, forwarded as-is
    async fn invoke(&self, target: &WorkflowTarget, request: &ChatRequest) -> Result<WorkflowReply, TierFailure>;
}

/// Posts the request JSON to the shop's webhook
pub struct HttpWorkflowBackend {
    client: reqwest::Client,
}

impl HttpWorkflowBackend {
    pub fn new() -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_REQUEST_SECS))
            .build()
            .map_err(|e| AgentError::Configuration(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WorkflowBackend for HttpWorkflowBackend {
    async fn invoke(&self, target: &WorkflowTarget, request: &ChatRequest) -> Result<WorkflowReply, TierFailure> {
        let mut call = self.client.post(target.url.clone()).json(request);
        if let Some(secret) = &target.secret {
            call = call.bearer_auth(secret);
        }

        let response = call.send().await.map_err(|e| {
            if e.is_timeout() {
                TierFailure::Timeout(Duration::from_secs(HTTP_REQUEST_SECS))
            } else {
                TierFailure::Upstream(format!("request to {} failed: {}", mask_url(target.url.as_str()), e.without_url()))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TierFailure::Upstream(format!("workflow returned HTTP {}", status)));
        }

        response
            .json::<WorkflowReply>()
            .await
            .map_err(|e| TierFailure::Malformed(e.without_url().to_string()))?
            .validate()
    }
}

/// How a dispatch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchRoute {
    External,
    Fallback,
    Exhausted,
}

impl DispatchRoute {
    /// Workflow that produced the answer, as counted in analytics
    pub fn answered_by(&self) -> WorkflowType {
        match self {
            DispatchRoute::External => WorkflowType::Custom,
            DispatchRoute::Fallback | DispatchRoute::Exhausted => WorkflowType::Default,
        }
    }
}

/// Single result of one dispatch
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub route: DispatchRoute,
    pub response: ChatResponse,
    /// Why the external workflow was skipped, if it was
    pub external_failure: Option<TierFailure>,
}

/// Dispatcher states
#[derive(Debug, Clone)]
pub enum DispatchState {
    TryExternal,
    FallbackPipeline { reason: Option<TierFailure> },
    Done(DispatchOutcome),
}

impl DispatchState {
    pub fn display_name(&self) -> &'static str {
        match self {
            DispatchState::TryExternal => "try_external",
            DispatchState::FallbackPipeline { .. } => "fallback_pipeline",
            DispatchState::Done(_) => "done",
        }
    }
}

pub struct WorkflowDispatcher {
    backend: Option<Arc<dyn WorkflowBackend>>,
    enabled: bool,
    allow_insecure_http: bool,
    workflow_timeout: Duration,
    fallback_budget: Duration,
}

impl WorkflowDispatcher {
    pub fn new(backend: Option<Arc<dyn WorkflowBackend>>, workflow: &WorkflowConfig, pipeline: &PipelineConfig) -> Self {
        Self {
            backend,
            enabled: workflow.enabled,
            allow_insecure_http: workflow.allow_insecure_http,
            workflow_timeout: Duration::from_millis(workflow.timeout_ms),
            fallback_budget: Duration::from_millis(pipeline.fallback_budget_ms),
        }
    }

    /// Resolve one request
    ///
    /// `fallback` runs the built-in pipeline and is polled at most once.
    /// Workflow replies without labels, and the apology, are labelled by the
    /// pattern rules alone.
    pub async fn dispatch<F, Fut>(
        &self,
        settings: &ShopSettings,
        request: &ChatRequest,
        locale: Locale,
        fallback: F,
    ) -> DispatchOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ChatResponse>,
    {
        let label_intent = match_intent(&request.utterance).unwrap_or_default();
        let mut fallback = Some(fallback);
        let mut state = DispatchState::TryExternal;

        loop {
            tracing::trace!(shop = %settings.shop_id, state = state.display_name(), "Dispatch step");
            state = match state {
                DispatchState::TryExternal => match self.try_external(settings, request).await {
                    Ok(reply) => DispatchState::Done(DispatchOutcome {
                        route: DispatchRoute::External,
                        response: reply.into_response(
                            label_intent,
                            match_sentiment(&request.utterance).unwrap_or_default(),
                        ),
                        external_failure: None,
                    }),
                    Err(failure) => DispatchState::FallbackPipeline { reason: Some(failure) },
                },
                DispatchState::FallbackPipeline { reason } => {
                    let run = match fallback.take() {
                        Some(run) => run,
                        None => {
                            return DispatchOutcome {
                                route: DispatchRoute::Exhausted,
                                response: ResponseComposer::apology(locale, label_intent),
                                external_failure: reason,
                            }
                        }
                    };

                    match tokio::time::timeout(self.fallback_budget, run()).await {
                        Ok(response) => DispatchState::Done(DispatchOutcome {
                            route: DispatchRoute::Fallback,
                            response,
                            external_failure: reason,
                        }),
                        Err(_) => {
                            tracing::error!(
                                shop = %settings.shop_id,
                                budget_ms = self.fallback_budget.as_millis() as u64,
                                "Fallback pipeline exceeded its budget"
                            );
                            DispatchState::Done(DispatchOutcome {
                                route: DispatchRoute::Exhausted,
                                response: ResponseComposer::apology(locale, label_intent),
                                external_failure: reason,
                            })
                        }
                    }
                }
                DispatchState::Done(outcome) => return outcome,
            };
        }
    }

    async fn try_external(&self, settings: &ShopSettings, request: &ChatRequest) -> Result<WorkflowReply, TierFailure> {
        if !self.enabled {
            return Err(TierFailure::NotConfigured("workflow dispatch disabled".to_string()));
        }
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| TierFailure::NotConfigured("no workflow backend".to_string()))?;
        let target = WorkflowTarget::from_settings(settings, self.allow_insecure_http)?;

        let result = tokio::time::timeout(self.workflow_timeout, backend.invoke(&target, request))
            .await
            .map_err(|_| TierFailure::Timeout(self.workflow_timeout))
            .and_then(|r| r);

        match &result {
            Ok(_) => tracing::debug!(shop = %settings.shop_id, "External workflow answered"),
            Err(TierFailure::NotConfigured(_)) => {}
            Err(failure) => tracing::warn!(
                shop = %settings.shop_id,
                webhook = %mask_url(target.url.as_str()),
                reason = failure.label(),
                error = %failure,
                "External workflow failed, using fallback pipeline"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_chat_core::RequestContext;

    struct ScriptedWorkflow {
        reply: Result<WorkflowReply, TierFailure>,
        delay: Duration,
    }

    #[async_trait]
    impl WorkflowBackend for ScriptedWorkflow {
        async fn invoke(&self, _target: &WorkflowTarget, _request: &ChatRequest) -> Result<WorkflowReply, TierFailure> {
            tokio::time::sleep(self.delay).await;
            self.reply.clone()
        }
    }

    fn custom_shop() -> ShopSettings {
        ShopSettings::new("shop").with_webhook("https://hooks.example.com/flow", Some("s3cret".to_string()))
    }

    fn dispatcher(reply: Result<WorkflowReply, TierFailure>, delay: Duration) -> WorkflowDispatcher {
        WorkflowDispatcher::new(
            Some(Arc::new(ScriptedWorkflow { reply, delay })),
            &WorkflowConfig::default(),
            &PipelineConfig::default(),
        )
    }

    fn request() -> ChatRequest {
        ChatRequest::new("hello", RequestContext::new("shop", "s1"))
    }

    fn fallback_response() -> ChatResponse {
        ChatResponse::for_tier(ResponseTier::Keyword, "from pipeline", Intent::ProductSearch)
    }

    fn reply(message: &str) -> WorkflowReply {
        WorkflowReply {
            message: message.to_string(),
            confidence: Some(1.7),
            ..Default::default()
        }
    }

    #[test]
    fn test_target_validation() {
        assert!(WorkflowTarget::from_settings(&ShopSettings::new("shop"), false).is_err());

        let plain = ShopSettings::new("shop").with_webhook("http://localhost:9000/hook", None);
        assert!(matches!(WorkflowTarget::from_settings(&plain, false), Err(TierFailure::NotConfigured(_))));
        assert!(WorkflowTarget::from_settings(&plain, true).is_ok());

        let garbage = ShopSettings::new("shop").with_webhook("not a url", None);
        assert!(WorkflowTarget::from_settings(&garbage, true).is_err());

        let target = WorkflowTarget::from_settings(&custom_shop(), false).unwrap();
        assert_eq!(target.secret.as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn test_external_success_clamps_confidence() {
        let d = dispatcher(Ok(reply("Custom answer")), Duration::ZERO);
        let outcome = d
            .dispatch(&custom_shop(), &request(), Locale::En, || async { fallback_response() })
            .await;

        assert_eq!(outcome.route, DispatchRoute::External);
        assert_eq!(outcome.response.message_type, "workflow");
        assert_eq!(outcome.response.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_partial_recommendations_are_accepted() {
        let body = r#"{"message":"Here you go","recommendations":[{"id":"1","title":"Red Dress","price":49.0}]}"#;
        let parsed = serde_json::from_str::<WorkflowReply>(body).unwrap();
        let d = dispatcher(parsed.validate(), Duration::ZERO);
        let outcome = d
            .dispatch(&custom_shop(), &request(), Locale::En, || async { fallback_response() })
            .await;

        assert_eq!(outcome.route, DispatchRoute::External);
        assert_eq!(outcome.response.message, "Here you go");
        let card = &outcome.response.recommendations[0];
        assert_eq!(card.title, "Red Dress");
        assert_eq!(card.handle, "");
        assert_eq!(card.relevance_score, 0);
        assert!(card.available);
    }

    #[tokio::test]
    async fn test_blank_reply_falls_back() {
        let d = dispatcher(reply("  ").validate(), Duration::ZERO);
        let outcome = d
            .dispatch(&custom_shop(), &request(), Locale::En, || async { fallback_response() })
            .await;

        assert_eq!(outcome.route, DispatchRoute::Fallback);
        assert!(matches!(outcome.external_failure, Some(TierFailure::Malformed(_))));
        assert!(outcome.response.message_type.starts_with("fallback"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let d = dispatcher(Ok(reply("too late")), Duration::from_secs(60));
        let outcome = d
            .dispatch(&custom_shop(), &request(), Locale::En, || async { fallback_response() })
            .await;

        assert_eq!(outcome.route, DispatchRoute::Fallback);
        assert!(matches!(outcome.external_failure, Some(TierFailure::Timeout(_))));
        assert_eq!(outcome.response.message, "from pipeline");
    }

    #[tokio::test]
    async fn test_default_workflow_skips_backend() {
        let d = dispatcher(Ok(reply("never used")), Duration::ZERO);
        let outcome = d
            .dispatch(&ShopSettings::new("shop"), &request(), Locale::En, || async {
                fallback_response()
            })
            .await;
        assert_eq!(outcome.route, DispatchRoute::Fallback);
        assert!(matches!(outcome.external_failure, Some(TierFailure::NotConfigured(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_pipeline_yields_apology() {
        let d = dispatcher(Err(TierFailure::Upstream("500".into())), Duration::ZERO);
        let outcome = d
            .dispatch(&custom_shop(), &request(), Locale::Fr, || async {
                tokio::time::sleep(Duration::from_secs(600)).await;
                fallback_response()
            })
            .await;

        assert_eq!(outcome.route, DispatchRoute::Exhausted);
        assert_eq!(outcome.response.message_type, "fallback_apology");
        assert_eq!(outcome.response.message, crate::messages::table(Locale::Fr).apology);
    }
}
