//! HTTP Endpoints
//!
//! Chat resolution for the storefront widget plus per-shop administration.

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use storefront_chat_core::{mask_secret, ChatRequest, ChatResponse, Product};
use storefront_chat_persistence::{DailyAnalytics, ShopSettings};
use storefront_chat_rag::BatchSummary;

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::ServerError;

/// Suffix of a secret masked by `mask_secret`
const MASK_SUFFIX: &str = "****";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.config.server.cors_origins, state.config.server.cors_enabled);
    let timeout = Duration::from_secs(state.config.server.timeout_seconds);

    Router::new()
        // Widget
        .route("/api/chat", post(chat))
        // Shop administration
        .route(
            "/api/shops/:shop/embeddings",
            post(generate_embeddings).delete(clear_embeddings),
        )
        .route("/api/shops/:shop/analytics/:date", get(daily_analytics))
        .route("/api/shops/:shop/clicks", post(record_click))
        .route("/api/shops/:shop/usage", get(usage))
        .route("/api/shops/:shop/settings", get(get_settings).put(put_settings))
        // Health check
        .route("/health", get(health_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If no valid origin is configured, any origin may call (the widget is
///   embedded on arbitrary storefront domains)
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if parsed_origins.is_empty() {
        tracing::info!("No CORS origins configured, allowing any storefront origin");
        return layer.allow_origin(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    layer.allow_origin(parsed_origins)
}

/// POST /api/chat
async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Result<Json<ChatResponse>, ServerError> {
    let response = state.assistant.respond(request).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct EmbeddingRequest {
    products: Vec<Product>,
}

/// POST /api/shops/:shop/embeddings
async fn generate_embeddings(
    State(state): State<AppState>,
    Path(shop): Path<String>,
    Json(request): Json<EmbeddingRequest>,
) -> Result<Json<BatchSummary>, ServerError> {
    let summary = state.assistant.generate_embeddings(&shop, &request.products).await?;
    tracing::info!(
        shop = %shop,
        cached = summary.cached,
        generated = summary.generated,
        failed = summary.failed,
        "Embedding batch finished"
    );
    Ok(Json(summary))
}

/// DELETE /api/shops/:shop/embeddings
async fn clear_embeddings(
    State(state): State<AppState>,
    Path(shop): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let deleted = state.assistant.clear_embeddings(&shop).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

/// Daily row plus derived averages
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyticsView {
    #[serde(flatten)]
    row: DailyAnalytics,
    average_response_time_ms: f64,
    average_confidence: f64,
}

/// GET /api/shops/:shop/analytics/:date
async fn daily_analytics(
    State(state): State<AppState>,
    Path((shop, date)): Path<(String, String)>,
) -> Result<Json<AnalyticsView>, ServerError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| ServerError::InvalidRequest(format!("date must be YYYY-MM-DD, got '{}'", date)))?;
    let row = state.assistant.daily_analytics(&shop, date).await?;
    Ok(Json(AnalyticsView {
        average_response_time_ms: row.average_response_time_ms(),
        average_confidence: row.average_confidence(),
        row,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClickRequest {
    product_id: String,
    #[serde(default)]
    session_id: Option<String>,
}

/// POST /api/shops/:shop/clicks
async fn record_click(
    State(state): State<AppState>,
    Path(shop): Path<String>,
    Json(request): Json<ClickRequest>,
) -> Result<StatusCode, ServerError> {
    state
        .assistant
        .record_click(&shop, request.session_id.as_deref(), &request.product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/shops/:shop/usage
async fn usage(
    State(state): State<AppState>,
    Path(shop): Path<String>,
) -> Result<Json<storefront_chat_agent::QuotaStatus>, ServerError> {
    Ok(Json(state.assistant.usage(&shop).await?))
}

/// Settings as returned to the admin UI
///
/// `ShopSettings` never serializes its secret; the view carries it masked.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsView {
    #[serde(flatten)]
    settings: ShopSettings,
    webhook_secret: Option<String>,
}

/// GET /api/shops/:shop/settings
async fn get_settings(State(state): State<AppState>, Path(shop): Path<String>) -> Json<SettingsView> {
    let settings = state.assistant.shop_settings(&shop).await;
    Json(SettingsView {
        webhook_secret: settings.webhook_secret.as_deref().map(mask_secret),
        settings,
    })
}

/// PUT /api/shops/:shop/settings
async fn put_settings(
    State(state): State<AppState>,
    Path(shop): Path<String>,
    Json(mut settings): Json<ShopSettings>,
) -> Result<StatusCode, ServerError> {
    if !settings.shop_id.is_empty() && settings.shop_id != shop {
        return Err(ServerError::InvalidRequest(format!(
            "shopId '{}' does not match path '{}'",
            settings.shop_id, shop
        )));
    }
    settings.shop_id = shop;

    // Omitted or masked (echoed from GET) keeps the stored secret; blank clears it
    let incoming = settings.webhook_secret.as_deref().map(str::trim);
    let keep_stored = incoming.map_or(true, |secret| secret.ends_with(MASK_SUFFIX));
    let clear = incoming == Some("");
    if keep_stored {
        settings.webhook_secret = state.assistant.shop_settings(&settings.shop_id).await.webhook_secret;
    } else if clear {
        settings.webhook_secret = None;
    }
    settings.updated_at = Utc::now();

    state.assistant.update_shop_settings(&settings).await?;
    tracing::info!(
        shop = %settings.shop_id,
        plan = %settings.plan,
        workflow = settings.workflow_type.as_str(),
        "Shop settings updated"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Health check with the state of each optional tier
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let config = &state.config;

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "checks": {
                "llm": {
                    "status": if state.assistant.has_llm() { "ok" } else { "disabled" },
                    "provider": config.llm.provider.clone(),
                },
                "semantic_ranking": {
                    "status": if state.assistant.has_semantic_ranking() { "ok" } else { "disabled" },
                    "provider": config.embedding.provider.clone(),
                },
                "workflow": {
                    "status": if config.workflow.enabled { "ok" } else { "disabled" },
                },
                "persistence": {
                    "status": if config.persistence.enabled { "scylla" } else { "in_memory" },
                },
            }
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use storefront_chat_config::Settings;
    use tower::ServiceExt;

    fn router() -> Router {
        create_router(AppState::in_memory(Settings::default()))
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[test]
    fn test_router_creation() {
        let _ = router();
    }

    #[tokio::test]
    async fn test_chat_rejects_missing_utterance() {
        let body = serde_json::json!({ "context": { "shopId": "demo", "sessionId": "s1" } });
        let (status, json) = send(router(), Method::POST, "/api/chat", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("utterance"));
    }

    #[tokio::test]
    async fn test_chat_accepts_message_alias() {
        let body = serde_json::json!({
            "message": "Hello!",
            "products": [],
            "context": { "shopId": "demo", "sessionId": "s1" }
        });
        let (status, json) = send(router(), Method::POST, "/api/chat", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["messageType"], "fallback_small_talk");
        assert_eq!(json["analytics"]["intentDetected"], "GREETING");
    }

    #[tokio::test]
    async fn test_settings_secret_is_masked_and_preserved() {
        let app = router();
        let body = serde_json::json!({
            "shopId": "demo",
            "plan": "STARTER",
            "workflowType": "custom",
            "webhookUrl": "https://flows.example.com/chat",
            "webhookSecret": "whsec_0123456789",
            "policies": {},
            "updatedAt": "2026-01-01T00:00:00Z"
        });
        let (status, _) = send(app.clone(), Method::PUT, "/api/shops/demo/settings", Some(body)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, json) = send(app.clone(), Method::GET, "/api/shops/demo/settings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["webhookSecret"], "whse****");

        // Echo the masked value back; the real secret must survive
        let mut echoed = json.clone();
        echoed["plan"] = serde_json::json!("GROWTH");
        let (status, _) = send(app.clone(), Method::PUT, "/api/shops/demo/settings", Some(echoed)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, json) = send(app, Method::GET, "/api/shops/demo/settings", None).await;
        assert_eq!(json["plan"], "GROWTH");
        assert_eq!(json["webhookSecret"], "whse****");
    }

    #[tokio::test]
    async fn test_analytics_rejects_bad_date() {
        let (status, _) = send(router(), Method::GET, "/api/shops/demo/analytics/yesterday", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(router(), Method::GET, "/api/shops/demo/analytics/2026-03-01", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["messageCount"], 0);
    }

    #[tokio::test]
    async fn test_embeddings_need_a_provider() {
        let body = serde_json::json!({ "products": [] });
        let (status, _) = send(router(), Method::POST, "/api/shops/demo/embeddings", Some(body)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_usage_of_new_shop() {
        let (status, json) = send(router(), Method::GET, "/api/shops/demo/usage", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["used"], 0);
        assert_eq!(json["plan"], "FREE");
    }
}
