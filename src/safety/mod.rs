//! Safety layer: abuse throttling and generated-reply screening.

pub mod rate_limit;
pub mod validator;

pub use rate_limit::{RateLimitDecision, RateLimitStats, RateLimiter, spawn_sweep_task};
pub use validator::{RejectReason, ResponseValidator, ValidationVerdict, sanitize};
