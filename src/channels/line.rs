//! LINE Messaging API: webhook parsing, signature check, reply/push client.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use sha2::Sha256;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::pipeline::{EventKind, InboundEvent, MessageSender, OutboundMessage, ReplyHandle};

pub const LINE_API_BASE: &str = "https://api.line.me";

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// LINE rejects reply/push calls with more messages than this.
pub const MAX_MESSAGES_PER_CALL: usize = 5;

/// Check `x-line-signature`: base64(HMAC-SHA256(channel secret, raw body)).
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = BASE64.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Authenticate a webhook call. A missing secret or header fails like a bad
/// signature.
pub fn check_signature(
    channel_secret: Option<&str>,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), ChannelError> {
    let secret = channel_secret
        .ok_or_else(|| ChannelError::InvalidSignature("channel secret not configured".into()))?;
    let signature = signature
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ChannelError::InvalidSignature(format!("missing {SIGNATURE_HEADER}")))?;
    if verify_signature(secret, body, signature) {
        Ok(())
    } else {
        Err(ChannelError::InvalidSignature("digest mismatch".into()))
    }
}

/// Compute the signature LINE would send for `body`.
pub fn sign(channel_secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}

/// Parse a webhook body into events.
///
/// Only a body that is not a JSON object fails. Individual events that are not
/// text messages, or are malformed, come back as [`EventKind::Other`].
pub fn parse_webhook(body: &[u8]) -> Result<Vec<InboundEvent>, ChannelError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ChannelError::InvalidMessage(format!("webhook body: {e}")))?;
    if !value.is_object() {
        return Err(ChannelError::InvalidMessage(
            "webhook body is not an object".to_string(),
        ));
    }

    let events = value
        .get("events")
        .and_then(Value::as_array)
        .map(|events| events.iter().map(parse_event).collect())
        .unwrap_or_default();
    Ok(events)
}

fn parse_event(event: &Value) -> InboundEvent {
    let str_at = |pointer: &str| event.pointer(pointer).and_then(Value::as_str);

    let source_id = ["/source/userId", "/source/groupId", "/source/roomId"]
        .iter()
        .find_map(|p| str_at(*p))
        .unwrap_or_default()
        .to_string();
    let reply_handle = ReplyHandle::new(str_at("/replyToken").unwrap_or_default());

    let is_text = str_at("/type") == Some("message") && str_at("/message/type") == Some("text");
    let text = if is_text {
        str_at("/message/text").map(str::to_string)
    } else {
        None
    };

    InboundEvent {
        source_id,
        kind: if is_text {
            EventKind::Message
        } else {
            EventKind::Other
        },
        text,
        reply_handle,
    }
}

/// Wire form of one outbound message.
pub fn to_line_message(message: &OutboundMessage) -> Value {
    match message {
        OutboundMessage::Text { body } => json!({ "type": "text", "text": body }),
        OutboundMessage::RichCard { alt_text, content } => json!({
            "type": "flex",
            "altText": alt_text,
            "contents": content,
        }),
    }
}

fn to_line_messages(messages: &[OutboundMessage]) -> Vec<Value> {
    if messages.len() > MAX_MESSAGES_PER_CALL {
        warn!(
            count = messages.len(),
            max = MAX_MESSAGES_PER_CALL,
            "Too many messages for one LINE call, truncating"
        );
    }
    messages
        .iter()
        .take(MAX_MESSAGES_PER_CALL)
        .map(to_line_message)
        .collect()
}

/// LINE delivery client.
pub struct LineClient {
    client: reqwest::Client,
    access_token: SecretString,
    base_url: String,
}

impl LineClient {
    pub fn new(access_token: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token,
            base_url: LINE_API_BASE.to_string(),
        }
    }

    /// Point the client at another host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn post(&self, path: &str, body: Value) -> Result<(), ChannelError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::Http(format!("{path}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "line".to_string(),
                reason: format!("{path} returned {status}: {detail}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MessageSender for LineClient {
    async fn reply(
        &self,
        handle: ReplyHandle,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), ChannelError> {
        if handle.token().is_empty() {
            return Err(ChannelError::InvalidMessage(
                "event has no reply token".to_string(),
            ));
        }
        debug!(count = messages.len(), "LINE reply");
        self.post(
            "/v2/bot/message/reply",
            json!({ "replyToken": handle.token(), "messages": to_line_messages(&messages) }),
        )
        .await
    }

    async fn push(&self, to: &str, messages: Vec<OutboundMessage>) -> Result<(), ChannelError> {
        debug!(count = messages.len(), "LINE push");
        self.post(
            "/v2/bot/message/push",
            json!({ "to": to, "messages": to_line_messages(&messages) }),
        )
        .await
    }
}
