//! `POST /api/line/webhook`: signature check, parse, run the batch.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{info, warn};

use super::AppState;
use crate::channels::line::{SIGNATURE_HEADER, check_signature, parse_webhook};

pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if !state.webhook.skip_signature {
        let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        let secret = state.webhook.channel_secret.as_ref().map(|s| s.expose_secret());
        if let Err(e) = check_signature(secret, &body, signature) {
            warn!(error = %e, "Rejected webhook");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "ok": false, "error": "Invalid signature" })),
            );
        }
    }

    let events = match parse_webhook(&body) {
        Ok(events) => events,
        Err(e) => {
            warn!(error = %e, "Malformed webhook body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error": "Malformed body" })),
            );
        }
    };

    let reports = state.processor.process_batch(events).await;
    let delivered = reports.iter().filter(|r| r.delivered).count();
    info!(events = reports.len(), delivered, "Webhook batch handled");

    (StatusCode::OK, Json(json!({ "ok": true })))
}

/// Browser-friendly hint; LINE only ever POSTs.
pub async fn hint(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "brand": state.brand.brand_name,
        "handle": state.brand.line_handle,
        "hint": "LINE calls this endpoint with POST only",
    }))
}
