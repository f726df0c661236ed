//! Store traits: the only shared mutable state in the bot.
//!
//! Everything here is volatile: a restart forgets counters, tracked users
//! and push history alike.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

// ── Rate limiting ───────────────────────────────────────────────────

/// Counter for one identity's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitEntry {
    pub count: u32,
    /// End of the half-open window `[start, reset_at)`.
    pub reset_at: DateTime<Utc>,
}

impl RateLimitEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.reset_at
    }
}

/// Keyed counter storage behind the rate limiter.
///
/// Operations are synchronous short critical sections; never call one while
/// holding a guard across an `.await`.
pub trait RateLimitStore: Send + Sync {
    fn get(&self, key: &str) -> Option<RateLimitEntry>;

    fn set(&self, key: &str, entry: RateLimitEntry);

    /// Atomic read-modify-write of one key. `f` sees the current entry (if
    /// any) and returns the replacement, which is also returned to the caller.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<RateLimitEntry>) -> RateLimitEntry,
    ) -> RateLimitEntry;

    /// Returns true if an entry was removed.
    fn remove(&self, key: &str) -> bool;

    /// Keys whose window had ended at `now`.
    fn expired_keys(&self, now: DateTime<Utc>) -> Vec<String>;

    /// Remove `key` only if it is still expired at `now`.
    fn remove_if_expired(&self, key: &str, now: DateTime<Utc>) -> bool;

    /// Point-in-time copy of every entry.
    fn snapshot(&self) -> Vec<(String, RateLimitEntry)>;
}

// ── User tracking ───────────────────────────────────────────────────

/// An identity seen on the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub user_id: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub message_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total: usize,
    /// First few ids, for eyeballing.
    pub sample: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Best-effort registry of identities that messaged the bot (push audience).
#[async_trait]
pub trait UserTracker: Send + Sync {
    async fn track(&self, user_id: &str, at: DateTime<Utc>);

    /// All tracked users, most recently seen first.
    async fn list(&self) -> Vec<UserRecord>;

    async fn stats(&self) -> UserStats;
}

// ── Push history ────────────────────────────────────────────────────

/// Outcome of one admin push run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushRecord {
    pub id: Uuid,
    pub sent_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Message preview, truncated.
    pub message: String,
    pub template: Option<String>,
}

#[async_trait]
pub trait PushHistory: Send + Sync {
    async fn record(&self, entry: PushRecord);

    /// Newest first, at most `limit` entries.
    async fn recent(&self, limit: usize) -> Vec<PushRecord>;
}
