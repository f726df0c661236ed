//! Error types for the LINE concierge.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Messaging-platform errors (delivery and ingress).
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Signature verification failed: {0}")]
    InvalidSignature(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// News/lucky feed errors.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Feed {url} returned HTTP {status}")]
    BadStatus { url: String, status: u16 },
}

/// Pipeline-related errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Reply delivery failed: {0}")]
    Delivery(#[from] ChannelError),

    #[error("Event processing panicked: {0}")]
    Panicked(String),
}
