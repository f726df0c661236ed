//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::LlmBackend;

/// Default generative-fallback model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Brand/contact details woven into templated replies.
#[derive(Debug, Clone)]
pub struct BrandConfig {
    pub brand_name: String,
    /// LINE OA handle, e.g. `@mechoke`.
    pub line_handle: String,
    pub signup_url: String,
    /// Where customers report problems (a LINE link).
    pub issue_url: String,
    /// Results announcement group.
    pub results_url: String,
    pub promo_image_url: String,
    pub news_fallback_image: String,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            brand_name: "มีโชคดอทคอม".to_string(),
            line_handle: "@mechoke".to_string(),
            signup_url: "https://www.mechoke.com/".to_string(),
            issue_url: "https://lin.ee/t52Y9Nm".to_string(),
            results_url: "https://t.me/+BR_qCVWcre40NTc9".to_string(),
            promo_image_url:
                "https://images.unsplash.com/photo-1554200876-56c2f25224fa?w=1200&q=80"
                    .to_string(),
            news_fallback_image:
                "https://images.unsplash.com/photo-1519681393784-d120267933ba?q=80&w=1200&auto=format&fit=crop"
                    .to_string(),
        }
    }
}

impl BrandConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            brand_name: env_or("BRAND_NAME", defaults.brand_name),
            line_handle: env_or("LINE_OA_HANDLE", defaults.line_handle),
            signup_url: env_or("SIGNUP_URL", defaults.signup_url),
            issue_url: env_or("LINE_ISSUE_URL", defaults.issue_url),
            results_url: env_or("TELEGRAM_URL", defaults.results_url),
            promo_image_url: env_or("PROMO_IMAGE_URL", defaults.promo_image_url),
            news_fallback_image: env_or("NEWS_FALLBACK_IMAGE", defaults.news_fallback_image),
        }
    }
}

/// What to do with a message from an identity that is over its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottlePolicy {
    /// Drop the message without replying.
    Silent,
    /// Reply once with a short "slow down" notice.
    Notice,
}

impl std::str::FromStr for ThrottlePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "silent" | "drop" => Ok(Self::Silent),
            "notice" | "reply" => Ok(Self::Notice),
            other => Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_POLICY".to_string(),
                message: format!("expected 'silent' or 'notice', got '{other}'"),
            }),
        }
    }
}

/// Fixed-window rate limit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Pipeline behaviour knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub rate_limit: RateLimitPolicy,
    pub throttle_policy: ThrottlePolicy,
    /// Upper bound on a single generative-fallback call.
    pub llm_timeout: Duration,
    /// Number of news items requested for the digest card.
    pub news_limit: usize,
    /// Inbound text longer than this is truncated before classification.
    pub max_input_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitPolicy::default(),
            throttle_policy: ThrottlePolicy::Notice,
            llm_timeout: Duration::from_secs(8),
            news_limit: 5,
            max_input_chars: 2000,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let throttle_policy = match std::env::var("RATE_LIMIT_POLICY") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.throttle_policy,
        };

        Ok(Self {
            rate_limit: RateLimitPolicy {
                max_requests: env_parse("RATE_LIMIT_MAX", defaults.rate_limit.max_requests)?,
                window: Duration::from_millis(env_parse(
                    "RATE_LIMIT_WINDOW_MS",
                    defaults.rate_limit.window.as_millis() as u64,
                )?),
            },
            throttle_policy,
            llm_timeout: Duration::from_millis(env_parse(
                "LLM_TIMEOUT_MS",
                defaults.llm_timeout.as_millis() as u64,
            )?),
            news_limit: env_parse("NEWS_LIMIT", defaults.news_limit)?,
            max_input_chars: env_parse("MAX_INPUT_CHARS", defaults.max_input_chars)?,
        })
    }
}

/// Process-wide configuration, assembled once in `main`.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub brand: BrandConfig,
    pub pipeline: PipelineConfig,
    pub port: u16,
    pub channel_access_token: SecretString,
    pub channel_secret: Option<SecretString>,
    /// Skip webhook signature checks (non-production only).
    pub skip_signature: bool,
    pub admin_token: Option<SecretString>,
    pub llm_backend: LlmBackend,
    pub llm_api_key: SecretString,
    pub llm_model: String,
    pub lucky_feed_url: Option<String>,
    pub rate_limit_sweep_interval: Duration,
}

impl BotConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let channel_access_token = std::env::var("LINE_CHANNEL_ACCESS_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("LINE_CHANNEL_ACCESS_TOKEN".to_string()))?;

        let llm_backend = match std::env::var("LLM_BACKEND").as_deref() {
            Ok("anthropic") => LlmBackend::Anthropic,
            Ok("openai") | Err(_) => LlmBackend::OpenAi,
            Ok(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "LLM_BACKEND".to_string(),
                    message: format!("unknown backend '{other}'"),
                });
            }
        };
        let key_var = match llm_backend {
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
        };
        let llm_api_key = std::env::var(key_var)
            .map_err(|_| ConfigError::MissingEnvVar(key_var.to_string()))?;

        // ADMIN_TOKEN falls back to the channel secret, matching the webhook secret.
        let channel_secret = std::env::var("LINE_CHANNEL_SECRET").ok();
        let admin_token = std::env::var("ADMIN_TOKEN")
            .ok()
            .or_else(|| channel_secret.clone());

        Ok(Self {
            brand: BrandConfig::from_env(),
            pipeline: PipelineConfig::from_env()?,
            port: env_parse("PORT", 3000)?,
            channel_access_token: SecretString::from(channel_access_token),
            channel_secret: channel_secret.map(SecretString::from),
            skip_signature: env_parse("LINE_SKIP_SIGNATURE", false)?,
            admin_token: admin_token.map(SecretString::from),
            llm_backend,
            llm_api_key: SecretString::from(llm_api_key),
            llm_model: env_or("LLM_MODEL", DEFAULT_MODEL.to_string()),
            lucky_feed_url: std::env::var("LUCKY_FEED_URL")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            rate_limit_sweep_interval: Duration::from_secs(env_parse(
                "RATE_LIMIT_SWEEP_SECS",
                300,
            )?),
        })
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default)
}

fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_policy_parses_aliases() {
        assert_eq!("silent".parse::<ThrottlePolicy>().unwrap(), ThrottlePolicy::Silent);
        assert_eq!(" Notice ".parse::<ThrottlePolicy>().unwrap(), ThrottlePolicy::Notice);
        assert_eq!("drop".parse::<ThrottlePolicy>().unwrap(), ThrottlePolicy::Silent);
        assert!("sometimes".parse::<ThrottlePolicy>().is_err());
    }

    #[test]
    fn default_rate_limit_is_ten_per_minute() {
        let policy = RateLimitPolicy::default();
        assert_eq!(policy.max_requests, 10);
        assert_eq!(policy.window, Duration::from_secs(60));
    }

    #[test]
    fn pipeline_defaults_bound_llm_call() {
        let config = PipelineConfig::default();
        assert_eq!(config.llm_timeout, Duration::from_secs(8));
        assert_eq!(config.throttle_policy, ThrottlePolicy::Notice);
    }
}
