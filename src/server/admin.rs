//! Admin push, push history, rate-limit override and debug status.
//!
//! All routes here sit behind [`require_admin`].

use axum::{
    Json,
    extract::{Query, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use futures::StreamExt;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use super::AppState;
use crate::channels::flex;
use crate::knowledge::broadcasts::{find_template, render_broadcast};
use crate::pipeline::OutboundMessage;
use crate::store::{MAX_PUSH_HISTORY, PushRecord};

/// Concurrent LINE push calls during a broadcast.
const PUSH_CONCURRENCY: usize = 8;

/// Stored preview of a pushed message.
const HISTORY_PREVIEW_CHARS: usize = 200;

const DEFAULT_HISTORY_LIMIT: usize = 50;

const NO_NEWS_TEXT: &str = "ยังไม่พบข่าวเลขเด็ดล่าสุดในขณะนี้ค่ะ 🗞️ ลองอีกครั้งภายหลังนะคะ";

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "ok": false, "error": message.into() })))
}

// ── Auth ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn presented_token(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let v = v.trim();
            match v.get(..6) {
                Some(prefix) if prefix.eq_ignore_ascii_case("bearer") => v[6..].trim(),
                _ => v,
            }
        })
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    from_header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(req.uri())
            .ok()
            .and_then(|Query(q)| q.token)
    })
}

/// Bearer header or `?token=` must equal the admin token.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.admin_token.as_ref() else {
        warn!("Admin token not configured, rejecting admin request");
        return unauthorized();
    };

    match presented_token(&req) {
        Some(token) if token == expected.expose_secret() => next.run(req).await,
        _ => {
            warn!(path = %req.uri().path(), "Admin request with invalid token");
            unauthorized()
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::CACHE_CONTROL, "no-store")],
        Json(json!({
            "ok": false,
            "error": "Unauthorized - Invalid or missing admin token",
            "hint": "Add Authorization: Bearer YOUR_TOKEN header or ?token=YOUR_TOKEN query param",
        })),
    )
        .into_response()
}

// ── Push ────────────────────────────────────────────────────────────

/// What to send. At least one of `message`, `template`, `promo`, `lucky_news`.
#[derive(Debug, Default, Deserialize)]
pub struct PushContent {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "templateKey")]
    pub template: Option<String>,
    #[serde(default)]
    pub promo: bool,
    #[serde(default, alias = "luckyNews")]
    pub lucky_news: bool,
}

#[derive(Debug, Deserialize)]
pub struct PushRequest {
    /// Explicit recipients; every tracked user when absent or empty.
    #[serde(default, alias = "userIds")]
    pub to: Option<Vec<String>>,
    #[serde(flatten)]
    pub content: PushContent,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(alias = "userId")]
    pub to: String,
    #[serde(flatten)]
    pub content: PushContent,
}

/// Build the message list and the text kept in history.
async fn compose(state: &AppState, content: &PushContent) -> Result<(Vec<OutboundMessage>, String), ApiError> {
    let mut messages = Vec::new();
    let mut preview = Vec::new();

    let text = content
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    if let Some(text) = text {
        messages.push(OutboundMessage::text(text));
        preview.push(text.to_string());
    } else if let Some(key) = content.template.as_deref() {
        let template = find_template(key).ok_or_else(|| {
            api_error(StatusCode::BAD_REQUEST, format!("Unknown template '{key}'"))
        })?;
        let rendered = render_broadcast(template, &state.brand);
        preview.push(rendered.clone());
        messages.push(OutboundMessage::text(rendered));
    }

    if content.promo {
        messages.push(flex::promo_card(&state.brand));
        preview.push("[promo card]".to_string());
    }

    if content.lucky_news {
        let items = match state.feed.fetch(state.news_limit).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "News feed unavailable for push");
                Vec::new()
            }
        };
        match flex::news_carousel(&items, &state.brand) {
            Some(card) => {
                messages.push(card);
                preview.push(format!("[news carousel: {} items]", items.len()));
            }
            None => {
                messages.push(OutboundMessage::text(NO_NEWS_TEXT));
                preview.push(NO_NEWS_TEXT.to_string());
            }
        }
    }

    if messages.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "No message to send. Provide 'message', 'template', 'promo' or 'lucky_news'.",
        ));
    }

    Ok((messages, preview.join("\n")))
}

fn mask(user_id: &str) -> String {
    format!("{}...", user_id.chars().take(12).collect::<String>())
}

pub async fn push(State(state): State<AppState>, Json(body): Json<PushRequest>) -> impl IntoResponse {
    let (messages, preview) = match compose(&state, &body.content).await {
        Ok(composed) => composed,
        Err(e) => return e,
    };

    let recipients: Vec<String> = match body.to.filter(|to| !to.is_empty()) {
        Some(to) => to,
        None => state
            .users
            .list()
            .await
            .into_iter()
            .map(|u| u.user_id)
            .collect(),
    };
    if recipients.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "No recipients");
    }

    let total = recipients.len();
    let results: Vec<bool> = futures::stream::iter(recipients)
        .map(|to| {
            let sender = state.sender.clone();
            let messages = messages.clone();
            async move {
                match sender.push(&to, messages).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(to = %mask(&to), error = %e, "Push failed");
                        false
                    }
                }
            }
        })
        .buffer_unordered(PUSH_CONCURRENCY)
        .collect()
        .await;
    let succeeded = results.iter().filter(|ok| **ok).count();
    let failed = total - succeeded;

    let record = PushRecord {
        id: Uuid::new_v4(),
        sent_at: Utc::now(),
        total,
        succeeded,
        failed,
        message: flex::truncate(&preview, HISTORY_PREVIEW_CHARS),
        template: body.content.template.clone(),
    };
    let id = record.id;
    state.history.record(record).await;

    info!(%id, total, succeeded, failed, "Push completed");

    (
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "id": id,
            "total": total,
            "succeeded": succeeded,
            "failed": failed,
            "message": format!("Sent to {succeeded}/{total} users"),
        })),
    )
}

/// Send the composed push to one recipient, marked as a preview. Not recorded.
pub async fn preview(
    State(state): State<AppState>,
    Json(body): Json<PreviewRequest>,
) -> impl IntoResponse {
    let to = body.to.trim();
    if to.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "'to' is required");
    }

    let (mut messages, _) = match compose(&state, &body.content).await {
        Ok(composed) => composed,
        Err(e) => return e,
    };
    messages.insert(0, OutboundMessage::text("🔍 [PREVIEW]"));

    if let Err(e) = state.sender.push(to, messages).await {
        warn!(to = %mask(to), error = %e, "Preview push failed");
        return api_error(StatusCode::BAD_GATEWAY, "Failed to send preview");
    }

    info!(to = %mask(to), "Preview sent");
    (
        StatusCode::OK,
        Json(json!({ "ok": true, "message": "Preview sent successfully", "to": mask(to) })),
    )
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    limit: Option<usize>,
}

pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_PUSH_HISTORY);
    let history = state.history.recent(limit).await;
    Json(json!({ "ok": true, "count": history.len(), "history": history }))
}

// ── Rate limit & debug ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResetRequest {
    #[serde(alias = "userId")]
    user_id: String,
}

pub async fn reset_rate_limit(
    State(state): State<AppState>,
    Json(body): Json<ResetRequest>,
) -> impl IntoResponse {
    let removed = state.rate_limiter.reset(body.user_id.trim());
    info!(user = %mask(&body.user_id), removed, "Rate limit reset");
    Json(json!({ "ok": true, "removed": removed }))
}

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();
    let runtime = &state.runtime;
    Json(json!({
        "ok": true,
        "ts": now,
        "uptime_secs": (now - runtime.started_at).num_seconds(),
        "brand": {
            "name": state.brand.brand_name,
            "handle": state.brand.line_handle,
        },
        "checks": {
            "llm": { "configured": true, "backend": runtime.llm_backend, "model": runtime.llm_model },
            "lucky_feed": { "configured": runtime.feed_configured },
            "line_webhook": {
                "configured": state.webhook.channel_secret.is_some(),
                "signature_check": !state.webhook.skip_signature,
            },
        },
        "rate_limit": state.rate_limiter.stats_at(now),
        "users": state.users.stats().await,
    }))
}

pub async fn users(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "stats": state.users.stats().await,
        "users": state.users.list().await,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;

    fn request(uri: &str, auth: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn token_from_bearer_header() {
        let req = request("/api/debug/status", Some("Bearer s3cret"));
        assert_eq!(presented_token(&req).as_deref(), Some("s3cret"));

        let req = request("/api/debug/status", Some("bearer   s3cret "));
        assert_eq!(presented_token(&req).as_deref(), Some("s3cret"));
    }

    #[test]
    fn token_from_query() {
        let req = request("/api/debug/status?token=abc%20def", None);
        assert_eq!(presented_token(&req).as_deref(), Some("abc def"));
    }

    #[test]
    fn no_token_presented() {
        assert!(presented_token(&request("/api/debug/status", None)).is_none());
        assert!(presented_token(&request("/api/debug/status", Some("Bearer "))).is_none());
    }

    #[test]
    fn push_request_accepts_aliases() {
        let body: PushRequest = serde_json::from_value(json!({
            "userIds": ["U1", "U2"],
            "templateKey": "bc_checkin_7d",
            "luckyNews": true
        }))
        .unwrap();
        assert_eq!(body.to.unwrap().len(), 2);
        assert_eq!(body.content.template.as_deref(), Some("bc_checkin_7d"));
        assert!(body.content.lucky_news);
        assert!(!body.content.promo);
    }

    #[test]
    fn mask_keeps_twelve_chars() {
        assert_eq!(mask("U1234567890abcdef"), "U1234567890a...");
    }
}
