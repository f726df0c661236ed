//! Fixed-window, per-identity rate limiter.
//!
//! The first action of a window opens it; every further action inside the
//! window bumps the counter. A burst that straddles two windows can briefly
//! see up to twice the cap, which is accepted.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::RateLimitPolicy;
use crate::store::{RateLimitEntry, RateLimitStore};

/// Identities in [`RateLimitStats`] are cut to this many characters.
const STATS_ID_PREFIX: usize = 12;

/// Result of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// One active window, for the debug endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitStatsEntry {
    /// Truncated identity.
    pub user: String,
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitStats {
    /// Entries in the store, expired ones included.
    pub total: usize,
    pub active: usize,
    pub entries: Vec<RateLimitStatsEntry>,
}

/// Rate limiter over an injected store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    /// Count one action for `identity` against `policy`.
    pub fn check(&self, identity: &str, policy: RateLimitPolicy) -> RateLimitDecision {
        self.check_at(identity, policy, Utc::now())
    }

    /// [`check`](Self::check) with an explicit clock.
    pub fn check_at(
        &self,
        identity: &str,
        policy: RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let window = chrono::Duration::from_std(policy.window)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));

        let entry = self.store.update(identity, &mut |current| match current {
            Some(entry) if !entry.is_expired(now) => RateLimitEntry {
                count: entry.count.saturating_add(1),
                reset_at: entry.reset_at,
            },
            _ => RateLimitEntry {
                count: 1,
                reset_at: now + window,
            },
        });

        let allowed = entry.count <= policy.max_requests;
        if !allowed {
            debug!(
                identity = %identity,
                count = entry.count,
                max = policy.max_requests,
                "Rate limit exceeded"
            );
        }

        RateLimitDecision {
            allowed,
            remaining: policy.max_requests.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        }
    }

    /// Forget an identity's window (admin override).
    pub fn reset(&self, identity: &str) -> bool {
        self.store.remove(identity)
    }

    pub fn stats(&self) -> RateLimitStats {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> RateLimitStats {
        let snapshot = self.store.snapshot();
        let total = snapshot.len();

        let mut entries: Vec<RateLimitStatsEntry> = snapshot
            .into_iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(identity, entry)| RateLimitStatsEntry {
                user: truncate_identity(&identity),
                count: entry.count,
                reset_at: entry.reset_at,
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count));

        RateLimitStats {
            total,
            active: entries.len(),
            entries,
        }
    }

    /// Drop every entry whose window has ended. Returns how many were removed.
    ///
    /// Keys are snapshotted first and each is removed only if still expired,
    /// so a window reopened in between survives.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.store
            .expired_keys(now)
            .iter()
            .filter(|key| self.store.remove_if_expired(key, now))
            .count()
    }
}

fn truncate_identity(identity: &str) -> String {
    let prefix: String = identity.chars().take(STATS_ID_PREFIX).collect();
    format!("{prefix}...")
}

/// Spawn a background task that periodically sweeps expired windows.
pub fn spawn_sweep_task(limiter: RateLimiter, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        // tokio panics on a zero period
        let mut interval = tokio::time::interval(every.max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            let removed = limiter.sweep(Utc::now());
            if removed > 0 {
                info!(removed, "Swept expired rate-limit windows");
            }
        }
    })
}
