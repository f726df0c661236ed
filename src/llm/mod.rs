//! Generative fallback backends.
//!
//! OpenAI and Anthropic are reached through rig-core; [`RigAdapter`] maps a
//! rig `CompletionModel` onto the crate's own [`LlmProvider`] trait so the
//! pipeline can be tested with plain mocks.

pub mod provider;
mod rig_adapter;

pub use provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::LlmError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    pub fn label(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::Anthropic => create_anthropic_provider(config),
        LlmBackend::OpenAi => create_openai_provider(config),
    }
}

fn client_error(backend: LlmBackend, e: impl std::fmt::Display) -> LlmError {
    LlmError::RequestFailed {
        provider: backend.label().to_string(),
        reason: format!("failed to create client: {e}"),
    }
}

fn create_anthropic_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::anthropic;

    let client: rig::client::Client<anthropic::client::AnthropicExt> =
        anthropic::Client::new(config.api_key.expose_secret())
            .map_err(|e| client_error(LlmBackend::Anthropic, e))?;

    let model = client.completion_model(&config.model);
    tracing::info!(model = %config.model, "Generative fallback: Anthropic");
    Ok(Arc::new(RigAdapter::new(model, &config.model, LlmBackend::Anthropic.label())))
}

fn create_openai_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(config.api_key.expose_secret())
            .map_err(|e| client_error(LlmBackend::OpenAi, e))?;

    let model = client.completion_model(&config.model);
    tracing::info!(model = %config.model, "Generative fallback: OpenAI");
    Ok(Arc::new(RigAdapter::new(model, &config.model, LlmBackend::OpenAi.label())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_provider_constructs_without_network() {
        let config = LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: secrecy::SecretString::from("sk-test"),
            model: "gpt-4o-mini".to_string(),
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn anthropic_provider_constructs_without_network() {
        let config = LlmConfig {
            backend: LlmBackend::Anthropic,
            api_key: secrecy::SecretString::from("test-key"),
            model: "claude-3-5-haiku-latest".to_string(),
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), "claude-3-5-haiku-latest");
    }

    #[test]
    fn backend_labels() {
        assert_eq!(LlmBackend::OpenAi.label(), "openai");
        assert_eq!(LlmBackend::Anthropic.label(), "anthropic");
    }
}
