//! HTTP surface: LINE webhook, admin push, debug status, health.

pub mod admin;
pub mod webhook;

use std::sync::Arc;

use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tower_http::trace::TraceLayer;

use crate::config::BrandConfig;
use crate::feed::NewsFeed;
use crate::pipeline::{MessageProcessor, MessageSender};
use crate::safety::RateLimiter;
use crate::store::{PushHistory, UserTracker};

/// Webhook authentication settings.
#[derive(Clone)]
pub struct WebhookAuth {
    pub channel_secret: Option<SecretString>,
    /// Accept unsigned bodies (local testing only).
    pub skip_signature: bool,
}

/// What the debug endpoint reports about the running process.
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub llm_backend: &'static str,
    pub llm_model: String,
    pub feed_configured: bool,
    pub started_at: DateTime<Utc>,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<MessageProcessor>,
    /// Proactive delivery for admin push.
    pub sender: Arc<dyn MessageSender>,
    pub feed: Arc<dyn NewsFeed>,
    pub rate_limiter: RateLimiter,
    pub users: Arc<dyn UserTracker>,
    pub history: Arc<dyn PushHistory>,
    pub brand: BrandConfig,
    pub webhook: WebhookAuth,
    /// `None` rejects every admin request.
    pub admin_token: Option<SecretString>,
    pub news_limit: usize,
    pub runtime: RuntimeInfo,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/admin/push", post(admin::push))
        .route("/api/admin/push/preview", post(admin::preview))
        .route("/api/admin/push/history", get(admin::history))
        .route("/api/admin/rate-limit/reset", post(admin::reset_rate_limit))
        .route("/api/debug/status", get(admin::status))
        .route("/api/debug/users", get(admin::users))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin::require_admin,
        ));

    let public = Router::new()
        .route("/health", get(health))
        .route(
            "/api/line/webhook",
            get(webhook::hint).post(webhook::receive),
        );

    protected
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the listener fails.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, build_router(state)).await
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "line-concierge"
    }))
}
