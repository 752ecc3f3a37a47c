//! Integration tests for the storefront assistant
//!
//! These run the full resolution path against in-memory stores with fake
//! LLM and workflow backends and the offline hash embedder.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use storefront_chat_agent::{
    message_table, AssistantServices, QuotaChecker, StorefrontAssistant, WorkflowBackend, WorkflowReply,
    WorkflowTarget,
};
use storefront_chat_config::Settings;
use storefront_chat_core::{
    Badge, ChatRequest, Intent, Locale, PlanTier, Product, RequestContext, Sentiment, ShopPolicies,
    TierFailure,
};
use storefront_chat_llm::{GenerationResult, LlmBackend, LlmError, Message, SamplingParams};
use storefront_chat_persistence::{InMemoryStore, PersistenceLayer, ShopSettings, ShopSettingsStore};
use storefront_chat_rag::{EmbeddingProvider, HashEmbedder, RagError};

struct SlowWorkflow {
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl WorkflowBackend for SlowWorkflow {
    async fn invoke(&self, _target: &WorkflowTarget, request: &ChatRequest) -> Result<WorkflowReply, TierFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(WorkflowReply {
            message: format!("Workflow saw: {}", request.utterance),
            confidence: Some(0.9),
            ..Default::default()
        })
    }
}

struct BrokenWorkflow;

#[async_trait]
impl WorkflowBackend for BrokenWorkflow {
    async fn invoke(&self, _target: &WorkflowTarget, _request: &ChatRequest) -> Result<WorkflowReply, TierFailure> {
        Err(TierFailure::Upstream("workflow returned HTTP 502".to_string()))
    }
}

/// Correct vectors, half a second per call
struct SluggishEmbedder(HashEmbedder);

#[async_trait]
impl EmbeddingProvider for SluggishEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(self.0.embed_sync(text))
    }

    fn model_id(&self) -> &str {
        self.0.model_id()
    }

    fn dimension(&self) -> usize {
        self.0.dimension()
    }
}

struct FixedLlm(&'static str);

#[async_trait]
impl LlmBackend for FixedLlm {
    async fn generate(&self, _messages: &[Message], _params: &SamplingParams) -> Result<GenerationResult, LlmError> {
        Ok(GenerationResult {
            text: self.0.to_string(),
            tokens: 1,
            total_time_ms: 1,
        })
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.workflow.timeout_ms = 200;
    settings
}

fn assistant_with(store: &Arc<InMemoryStore>, services: impl FnOnce(AssistantServices) -> AssistantServices) -> StorefrontAssistant {
    let base = AssistantServices::new(PersistenceLayer::from_memory(store.clone()));
    StorefrontAssistant::new(&settings(), services(base))
}

fn request(utterance: &str, products: Vec<Product>) -> ChatRequest {
    ChatRequest::new(utterance, RequestContext::new("demo.myshop", "visitor-1")).with_products(products)
}

/// 50 products: three red dresses under $100 spread through the catalog,
/// one red dress over $100 and red or coloured fillers
fn catalog() -> Vec<Product> {
    let colors = ["Red", "Blue", "Green", "Black", "White", "Navy"];
    let items = ["Jeans", "Sweater", "Scarf", "Boots", "Jacket", "Blouse", "Skirt", "Hat"];
    let mut fillers = colors
        .iter()
        .flat_map(|c| items.iter().map(move |i| (c.to_string(), i.to_string())));

    (0..50)
        .map(|i| match i {
            7 => Product::new("dress-7", "Red Midi Dress", 59.0).with_description("Flowy red dress for summer"),
            23 => Product::new("dress-23", "Red Wrap Dress", 79.0).with_description("Red dress with a tie waist"),
            41 => Product::new("dress-41", "Red Slip Dress", 89.0).with_description("Silky red dress"),
            30 => Product::new("gown", "Red Evening Dress", 180.0).with_description("Long red dress for galas"),
            _ => {
                let (color, item) = fillers.next().unwrap_or_default();
                Product::new(format!("p{}", i), format!("{} {}", color, item), 20.0 + ((i * 7) % 70) as f64)
                    .with_description(format!("{} {} in soft fabric", color, item.to_lowercase()))
            }
        })
        .collect()
}

/// Test that semantic ranking puts the three affordable red dresses first
#[tokio::test]
async fn test_red_dresses_under_100_ranked_first() {
    let store = Arc::new(InMemoryStore::new());
    let assistant = assistant_with(&store, |s| s.with_embedder(Arc::new(HashEmbedder::new(1024))));

    let response = assistant
        .respond(request("Show me red dresses under $100", catalog()))
        .await
        .unwrap();

    assert_eq!(response.message_type, "fallback_semantic");
    assert!(response.confidence > 0.6);
    let mut top: Vec<&str> = response.recommendations.iter().take(3).map(|r| r.id.as_str()).collect();
    top.sort();
    assert_eq!(top, vec!["dress-23", "dress-41", "dress-7"]);
    assert!(response.recommendations.iter().all(|r| r.id != "gown"));
    assert_eq!(response.recommendations[0].badge, Some(Badge::BestMatch));
    assert_eq!(response.analytics.intent_detected, Intent::ProductSearch);
    assert_eq!(response.analytics.sub_intent.as_deref(), Some("price_max_100"));
    assert_eq!(response.message, message_table(Locale::En).matches);
}

/// Test that without an embedder the keyword tier still finds the dresses
#[tokio::test]
async fn test_keyword_fallback_without_embedder() {
    let store = Arc::new(InMemoryStore::new());
    let assistant = assistant_with(&store, |s| s);

    let response = assistant
        .respond(request("Show me red dresses under $100", catalog()))
        .await
        .unwrap();

    assert_eq!(response.message_type, "fallback_keyword");
    let top: Vec<&str> = response.recommendations.iter().take(3).map(|r| r.id.as_str()).collect();
    assert!(top.iter().all(|id| id.starts_with("dress-")));
    assert!(response.confidence > 0.6);
}

/// Test that a workflow timeout yields a valid fallback response
#[tokio::test(start_paused = true)]
async fn test_workflow_timeout_falls_back() {
    let store = Arc::new(InMemoryStore::new());
    let workflow = Arc::new(SlowWorkflow {
        delay: Duration::from_secs(30),
        calls: AtomicUsize::new(0),
    });
    let shop = ShopSettings::new("demo.myshop").with_webhook("https://flows.example.com/chat", None);
    ShopSettingsStore::upsert(store.as_ref(), &shop).await.unwrap();

    let assistant = assistant_with(&store, |s| s.with_workflow(workflow.clone()));
    let response = assistant
        .respond(request("Do you have red dresses?", catalog()))
        .await
        .unwrap();

    assert_eq!(workflow.calls.load(Ordering::SeqCst), 1);
    assert!(response.message_type.starts_with("fallback"));
    assert!(!response.message.is_empty());
}

/// Test that a responsive workflow answers and is counted under its type
#[tokio::test]
async fn test_workflow_answers_when_healthy() {
    let store = Arc::new(InMemoryStore::new());
    let workflow = Arc::new(SlowWorkflow {
        delay: Duration::ZERO,
        calls: AtomicUsize::new(0),
    });
    let shop = ShopSettings::new("demo.myshop").with_webhook("https://flows.example.com/chat", Some("secret".into()));
    ShopSettingsStore::upsert(store.as_ref(), &shop).await.unwrap();

    let assistant = assistant_with(&store, |s| s.with_workflow(workflow));
    let response = assistant.respond(request("I love this shop", Vec::new())).await.unwrap();

    assert_eq!(response.message_type, "workflow");
    assert_eq!(response.message, "Workflow saw: I love this shop");
    assert_eq!(response.confidence, 0.9);
    assert_eq!(response.sentiment, Sentiment::Positive);

    let day = assistant.daily_analytics("demo.myshop", Utc::now().date_naive()).await.unwrap();
    assert_eq!(day.workflow_types.get("custom"), Some(&1));
}

/// Test that analytics count the pipeline when a custom workflow fails
#[tokio::test]
async fn test_failed_workflow_is_counted_as_default() {
    let store = Arc::new(InMemoryStore::new());
    let shop = ShopSettings::new("demo.myshop").with_webhook("https://flows.example.com/chat", None);
    ShopSettingsStore::upsert(store.as_ref(), &shop).await.unwrap();

    let assistant = assistant_with(&store, |s| s.with_workflow(Arc::new(BrokenWorkflow)));
    let response = assistant
        .respond(request("Do you have red dresses?", catalog()))
        .await
        .unwrap();
    assert_eq!(response.message_type, "fallback_keyword");

    let day = assistant.daily_analytics("demo.myshop", Utc::now().date_naive()).await.unwrap();
    assert_eq!(day.workflow_types.get("default"), Some(&1));
    assert_eq!(day.workflow_types.get("custom"), None);
}

/// Test that a slow embedding provider degrades to keyword ranking
#[tokio::test(start_paused = true)]
async fn test_slow_embedder_falls_through_to_keywords() {
    let store = Arc::new(InMemoryStore::new());
    let assistant = assistant_with(&store, |s| {
        s.with_embedder(Arc::new(SluggishEmbedder(HashEmbedder::default())))
    });
    let products: Vec<Product> = (0..40)
        .map(|i| Product::new(format!("red-{}", i), format!("Red Dress {}", i), 49.0))
        .collect();

    let response = assistant.respond(request("Show me red dresses", products)).await.unwrap();

    assert_eq!(response.message_type, "fallback_keyword");
    assert!(!response.recommendations.is_empty());
    assert_ne!(response.message, message_table(Locale::En).apology);
}

/// Test that a product question against an empty catalog says so
#[tokio::test]
async fn test_zero_products_gives_no_product_data() {
    let store = Arc::new(InMemoryStore::new());
    let assistant = assistant_with(&store, |s| s.with_embedder(Arc::new(HashEmbedder::default())));

    let response = assistant.respond(request("I'm looking for a red dress", Vec::new())).await.unwrap();

    assert_eq!(response.analytics.intent_detected, Intent::ProductSearch);
    assert_eq!(response.message, message_table(Locale::En).no_product_data);
    assert!(response.recommendations.is_empty());
    assert!(response.message_type.starts_with("fallback"));
}

/// Test that support questions never claim products are missing, in any locale
#[tokio::test]
async fn test_support_never_says_no_products() {
    let store = Arc::new(InMemoryStore::new());
    let assistant = assistant_with(&store, |s| s);

    for (locale, utterance) in [
        (Locale::En, "I need help with my order, it arrived damaged"),
        (Locale::Fr, "J'ai une réclamation pour le service client"),
        (Locale::De, "Ich brauche den Kundenservice"),
        (Locale::Ja, "問い合わせをしたいです"),
    ] {
        let mut req = request(utterance, Vec::new());
        req.context.locale = locale.code().to_string();
        let response = assistant.respond(req).await.unwrap();

        assert_eq!(response.analytics.intent_detected, Intent::Support, "{}", utterance);
        assert_ne!(response.message, message_table(locale).no_product_data);
        assert!(!response.message.to_lowercase().contains("no products"));
        assert!(response.recommendations.is_empty());
    }
}

/// Test that a shipping question quotes the shop policy supplied with the request
#[tokio::test]
async fn test_shipping_question_quotes_policy() {
    let store = Arc::new(InMemoryStore::new());
    let assistant = assistant_with(&store, |s| s);

    let mut req = request("How long does shipping take?", catalog());
    req.context.shop_policies = Some(ShopPolicies {
        shipping: Some("Orders ship within 2 business days and arrive in 3-7 days. Free over $75.".into()),
        ..Default::default()
    });
    let response = assistant.respond(req).await.unwrap();

    assert_eq!(response.message_type, "fallback_policy");
    assert!(response.message.contains("Orders ship within 2 business days"));
    assert!(response.recommendations.is_empty());
}

/// Test that two messages in one month share analytics and quota, and the next month starts fresh
#[tokio::test]
async fn test_starter_shop_usage_across_months() {
    let store = Arc::new(InMemoryStore::new());
    let shop = ShopSettings::new("demo.myshop").with_plan(PlanTier::Starter);
    ShopSettingsStore::upsert(store.as_ref(), &shop).await.unwrap();
    let assistant = assistant_with(&store, |s| s);
    let quota = QuotaChecker::new(store.clone());

    let morning = Utc.with_ymd_and_hms(2026, 5, 20, 9, 0, 0).unwrap();
    let evening = Utc.with_ymd_and_hms(2026, 5, 20, 18, 30, 0).unwrap();
    let june = Utc.with_ymd_and_hms(2026, 6, 1, 0, 5, 0).unwrap();

    assistant.respond_at(request("Hello", Vec::new()), morning).await.unwrap();
    assistant.respond_at(request("Show me jeans", catalog()), evening).await.unwrap();

    let day = assistant.daily_analytics("demo.myshop", morning.date_naive()).await.unwrap();
    assert_eq!(day.message_count, 2);
    assert_eq!(day.intents.get("GREETING"), Some(&1));
    assert_eq!(day.intents.get("PRODUCT_SEARCH"), Some(&1));

    let may = quota.status("demo.myshop", PlanTier::Starter, evening).await.unwrap();
    assert_eq!(may.used, 2);
    assert_eq!(may.remaining, Some(498));

    assistant.respond_at(request("Thanks!", Vec::new()), june).await.unwrap();
    let june_status = quota.status("demo.myshop", PlanTier::Starter, june).await.unwrap();
    assert_eq!(june_status.used, 1);
    let june_day = assistant.daily_analytics("demo.myshop", june.date_naive()).await.unwrap();
    assert_eq!(june_day.message_count, 1);
}

/// Test that an exhausted free plan gets the quota message and is not billed again
#[tokio::test]
async fn test_quota_exceeded_response() {
    let store = Arc::new(InMemoryStore::new());
    let quota = QuotaChecker::new(store.clone());
    let now = Utc::now();
    for _ in 0..50 {
        quota.record("demo.myshop", None, now).await.unwrap();
    }

    let assistant = assistant_with(&store, |s| s);
    let response = assistant.respond_at(request("Show me jeans", catalog()), now).await.unwrap();

    assert_eq!(response.message_type, "quota_exceeded");
    assert_eq!(quota.status("demo.myshop", PlanTier::Free, now).await.unwrap().used, 50);
}

/// Test that recently viewed products are boosted above equally relevant ones
#[tokio::test]
async fn test_recently_viewed_product_is_boosted() {
    let store = Arc::new(InMemoryStore::new());
    let assistant = assistant_with(&store, |s| s);
    let products = vec![
        Product::new("a", "Denim", 60.0).with_description("Blue jeans, slim fit"),
        Product::new("b", "Denim", 65.0).with_description("Blue jeans, slim fit"),
    ];

    let mut req = request("Show me blue jeans", products);
    req.context.recent_products = vec!["b".to_string()];
    let response = assistant.respond(req).await.unwrap();

    assert_eq!(response.message_type, "fallback_keyword");
    assert_eq!(response.recommendations[0].id, "b");
    assert_eq!(response.recommendations[0].relevance_score, 50);
    assert_eq!(response.recommendations[1].relevance_score, 40);
}

/// Test that the LLM labels messages the pattern rules cannot
#[tokio::test]
async fn test_llm_classifies_unmatched_message() {
    let store = Arc::new(InMemoryStore::new());
    let assistant = assistant_with(&store, |s| s.with_llm(Arc::new(FixedLlm("COMPARISON"))));

    let response = assistant
        .respond(request("Jeans or skirt for a picnic", catalog()))
        .await
        .unwrap();

    assert_eq!(response.analytics.intent_detected, Intent::Comparison);
    assert!(!response.recommendations.is_empty());
}

/// Test that messages in one session land in the same chat session
#[tokio::test]
async fn test_messages_are_persisted_in_one_session() {
    let store = Arc::new(InMemoryStore::new());
    let assistant = assistant_with(&store, |s| s);

    assistant.respond(request("Hello", Vec::new())).await.unwrap();
    assistant.respond(request("Show me jeans", catalog())).await.unwrap();

    let profile = storefront_chat_persistence::ProfileStore::get(store.as_ref(), "demo.myshop", "visitor-1")
        .await
        .unwrap()
        .unwrap();
    let session = storefront_chat_persistence::ChatStore::latest_session(store.as_ref(), "demo.myshop", profile.profile_id)
        .await
        .unwrap()
        .unwrap();
    let messages = storefront_chat_persistence::ChatStore::messages(store.as_ref(), session.chat_session_id)
        .await
        .unwrap();

    assert_eq!(messages.len(), 4);
    assert_eq!(profile.interactions.len(), 2);
    assert!(!messages[3].products_shown.is_empty());
}
