//! Shared types for the message routing pipeline.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ChannelError;

// ── Inbound event ───────────────────────────────────────────────────

/// Single-use token authorizing exactly one reply to one inbound event.
///
/// Not `Clone`. [`MessageSender::reply`] takes it by value, so a used handle
/// is gone.
#[derive(Debug, PartialEq, Eq)]
pub struct ReplyHandle(String);

impl ReplyHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw platform token (for the wire request only).
    pub fn token(&self) -> &str {
        &self.0
    }
}

/// What kind of delivery this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A text message from a user.
    Message,
    /// Anything else (follow, sticker, postback, image...).
    Other,
}

/// One inbound event from a webhook batch, already authenticated.
#[derive(Debug)]
pub struct InboundEvent {
    /// Channel-assigned identity of the sender (LINE userId / groupId).
    pub source_id: String,
    pub kind: EventKind,
    pub text: Option<String>,
    pub reply_handle: ReplyHandle,
}

impl InboundEvent {
    /// Convenience constructor for a plain text message.
    pub fn text(source_id: impl Into<String>, text: impl Into<String>, token: &str) -> Self {
        Self {
            source_id: source_id.into(),
            kind: EventKind::Message,
            text: Some(text.into()),
            reply_handle: ReplyHandle::new(token),
        }
    }
}

// ── Outbound messages ───────────────────────────────────────────────

/// A message the bot sends back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text {
        body: String,
    },
    /// Structured card; `content` is the platform's layout tree.
    RichCard {
        alt_text: String,
        content: serde_json::Value,
    },
}

impl OutboundMessage {
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text { body: body.into() }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::RichCard { .. } => "rich_card",
        }
    }
}

// ── Pipeline outcome ────────────────────────────────────────────────

/// Terminal state reached by one pipeline pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Not a text message, or empty text.
    Intake,
    /// An operator phrase; the bot stays silent.
    AdminSuppression,
    SensitiveDeflection,
    RateLimitGate,
    IntentRouting,
    GenerativeFallback,
    /// A stage failed unexpectedly and the apology was substituted.
    Recovered,
}

/// The decision for one event: which stage ended it and what to send.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub stage: Stage,
    /// Empty means no reply at all.
    pub messages: Vec<OutboundMessage>,
}

impl Decision {
    pub fn silent(stage: Stage) -> Self {
        Self {
            stage,
            messages: Vec::new(),
        }
    }

    pub fn reply(stage: Stage, messages: Vec<OutboundMessage>) -> Self {
        Self { stage, messages }
    }

    pub fn is_silent(&self) -> bool {
        self.messages.is_empty()
    }
}

/// What happened to one event, returned to the batch caller.
#[derive(Debug, Clone)]
pub struct EventReport {
    pub source_id: String,
    pub decision: Decision,
    /// Whether the reply call succeeded (false for silent decisions too).
    pub delivered: bool,
}

// ── Delivery collaborator ───────────────────────────────────────────

/// Outbound delivery: pure I/O, no routing logic.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Reply to an inbound event. Consumes the handle.
    async fn reply(
        &self,
        handle: ReplyHandle,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), ChannelError>;

    /// Proactive send to an identity, outside any reply window.
    async fn push(&self, to: &str, messages: Vec<OutboundMessage>) -> Result<(), ChannelError>;
}
