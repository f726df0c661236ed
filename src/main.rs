use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use line_concierge::channels::LineClient;
use line_concierge::config::BotConfig;
use line_concierge::feed::{HttpNewsFeed, NewsFeed};
use line_concierge::llm::{LlmConfig, create_provider};
use line_concierge::pipeline::{MessageProcessor, MessageSender};
use line_concierge::safety::{RateLimiter, spawn_sweep_task};
use line_concierge::server::{self, AppState, RuntimeInfo, WebhookAuth};
use line_concierge::store::{
    InMemoryPushHistory, InMemoryRateLimitStore, InMemoryUserRegistry, PushHistory, UserTracker,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().context("loading configuration")?;

    if config.channel_secret.is_none() && !config.skip_signature {
        tracing::warn!("LINE_CHANNEL_SECRET not set; every webhook call will be rejected");
    }
    if config.skip_signature {
        tracing::warn!("Webhook signature verification is disabled");
    }

    // ── Collaborators ───────────────────────────────────────────────────
    let llm = create_provider(&LlmConfig {
        backend: config.llm_backend,
        api_key: config.llm_api_key.clone(),
        model: config.llm_model.clone(),
    })?;

    let sender: Arc<dyn MessageSender> =
        Arc::new(LineClient::new(config.channel_access_token.clone()));
    let feed: Arc<dyn NewsFeed> = Arc::new(HttpNewsFeed::new(config.lucky_feed_url.clone()));
    let users: Arc<dyn UserTracker> = Arc::new(InMemoryUserRegistry::new());
    let history: Arc<dyn PushHistory> = Arc::new(InMemoryPushHistory::new());

    let rate_limiter = RateLimiter::new(Arc::new(InMemoryRateLimitStore::new()));
    let _sweep_handle = spawn_sweep_task(rate_limiter.clone(), config.rate_limit_sweep_interval);

    let processor = Arc::new(MessageProcessor::new(
        rate_limiter.clone(),
        llm,
        feed.clone(),
        sender.clone(),
        users.clone(),
        config.brand.clone(),
        config.pipeline.clone(),
    ));

    let state = AppState {
        processor,
        sender,
        feed,
        rate_limiter,
        users,
        history,
        brand: config.brand.clone(),
        webhook: WebhookAuth {
            channel_secret: config.channel_secret.clone(),
            skip_signature: config.skip_signature,
        },
        admin_token: config.admin_token.clone(),
        news_limit: config.pipeline.news_limit,
        runtime: RuntimeInfo {
            llm_backend: config.llm_backend.label(),
            llm_model: config.llm_model.clone(),
            feed_configured: config.lucky_feed_url.is_some(),
            started_at: Utc::now(),
        },
    };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding port {}", config.port))?;

    tracing::info!(
        port = config.port,
        brand = %config.brand.brand_name,
        model = %config.llm_model,
        rate_limit = config.pipeline.rate_limit.max_requests,
        window_secs = config.pipeline.rate_limit.window.as_secs(),
        "LINE concierge listening"
    );

    server::serve(listener, state).await?;
    Ok(())
}
