//! In-memory store implementations.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;

use super::traits::{
    PushHistory, PushRecord, RateLimitEntry, RateLimitStore, UserRecord, UserStats, UserTracker,
};

/// Push history keeps this many runs.
pub const MAX_PUSH_HISTORY: usize = 100;

/// Users shown in [`UserStats::sample`].
const STATS_SAMPLE: usize = 10;

// ── Rate-limit counters ─────────────────────────────────────────────

/// DashMap-backed counters. Per-key updates hold the shard lock, so two
/// concurrent checks for one identity never lose an increment.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    entries: DashMap<String, RateLimitEntry>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|e| *e)
    }

    fn set(&self, key: &str, entry: RateLimitEntry) {
        self.entries.insert(key.to_string(), entry);
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<RateLimitEntry>) -> RateLimitEntry,
    ) -> RateLimitEntry {
        match self.entries.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let next = f(Some(*occupied.get()));
                occupied.insert(next);
                next
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                let next = f(None);
                vacant.insert(next);
                next
            }
        }
    }

    fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn expired_keys(&self, now: DateTime<Utc>) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.value().is_expired(now))
            .map(|e| e.key().clone())
            .collect()
    }

    fn remove_if_expired(&self, key: &str, now: DateTime<Utc>) -> bool {
        self.entries
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some()
    }

    fn snapshot(&self) -> Vec<(String, RateLimitEntry)> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }
}

// ── Users ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryUserRegistry {
    users: DashMap<String, UserRecord>,
    updated_at: RwLock<Option<DateTime<Utc>>>,
}

impl InMemoryUserRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserTracker for InMemoryUserRegistry {
    async fn track(&self, user_id: &str, at: DateTime<Utc>) {
        if user_id.trim().is_empty() {
            return;
        }

        self.users
            .entry(user_id.to_string())
            .and_modify(|record| {
                record.last_seen = record.last_seen.max(at);
                record.message_count += 1;
            })
            .or_insert_with(|| UserRecord {
                user_id: user_id.to_string(),
                first_seen: at,
                last_seen: at,
                message_count: 1,
            });

        let mut updated = self.updated_at.write().await;
        *updated = Some(updated.map_or(at, |prev| prev.max(at)));
    }

    async fn list(&self) -> Vec<UserRecord> {
        let mut users: Vec<UserRecord> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        users
    }

    async fn stats(&self) -> UserStats {
        let sample = self
            .list()
            .await
            .into_iter()
            .take(STATS_SAMPLE)
            .map(|u| u.user_id)
            .collect();

        UserStats {
            total: self.users.len(),
            sample,
            updated_at: *self.updated_at.read().await,
        }
    }
}

// ── Push history ────────────────────────────────────────────────────

/// Ring buffer of the last [`MAX_PUSH_HISTORY`] push runs, newest at the front.
#[derive(Debug, Default)]
pub struct InMemoryPushHistory {
    entries: RwLock<VecDeque<PushRecord>>,
}

impl InMemoryPushHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PushHistory for InMemoryPushHistory {
    async fn record(&self, entry: PushRecord) {
        let mut entries = self.entries.write().await;
        entries.push_front(entry);
        entries.truncate(MAX_PUSH_HISTORY);
    }

    async fn recent(&self, limit: usize) -> Vec<PushRecord> {
        self.entries
            .read()
            .await
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn entry(count: u32, reset_at: DateTime<Utc>) -> RateLimitEntry {
        RateLimitEntry { count, reset_at }
    }

    #[test]
    fn update_inserts_then_modifies() {
        let store = InMemoryRateLimitStore::new();
        let now = Utc::now();

        let first = store.update("u1", &mut |prev| {
            assert!(prev.is_none());
            entry(1, now + Duration::seconds(60))
        });
        assert_eq!(first.count, 1);

        let second = store.update("u1", &mut |prev| {
            let prev = prev.unwrap();
            entry(prev.count + 1, prev.reset_at)
        });
        assert_eq!(second.count, 2);
        assert_eq!(store.get("u1").unwrap().count, 2);
    }

    #[test]
    fn remove_if_expired_respects_fresh_entries() {
        let store = InMemoryRateLimitStore::new();
        let now = Utc::now();
        store.set("old", entry(3, now - Duration::seconds(1)));
        store.set("new", entry(1, now + Duration::seconds(30)));

        assert_eq!(store.expired_keys(now), vec!["old".to_string()]);

        // "old" got a fresh window between snapshot and removal
        store.set("old", entry(1, now + Duration::seconds(60)));
        assert!(!store.remove_if_expired("old", now));
        assert!(!store.remove_if_expired("new", now));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn entry_expires_at_reset_boundary() {
        let now = Utc::now();
        assert!(entry(1, now).is_expired(now));
        assert!(!entry(1, now + Duration::milliseconds(1)).is_expired(now));
    }

    #[tokio::test]
    async fn registry_counts_repeat_visits() {
        let registry = InMemoryUserRegistry::new();
        let t0 = Utc::now();
        registry.track("U1", t0).await;
        registry.track("U2", t0 + Duration::seconds(1)).await;
        registry.track("U1", t0 + Duration::seconds(2)).await;
        registry.track("  ", t0).await;

        let users = registry.list().await;
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, "U1");
        assert_eq!(users[0].message_count, 2);
        assert_eq!(users[0].first_seen, t0);

        let stats = registry.stats().await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.updated_at, Some(t0 + Duration::seconds(2)));
    }

    #[tokio::test]
    async fn push_history_is_capped_newest_first() {
        let history = InMemoryPushHistory::new();
        for i in 0..(MAX_PUSH_HISTORY + 5) {
            history
                .record(PushRecord {
                    id: Uuid::new_v4(),
                    sent_at: Utc::now(),
                    total: i,
                    succeeded: i,
                    failed: 0,
                    message: format!("push {i}"),
                    template: None,
                })
                .await;
        }

        let all = history.recent(usize::MAX).await;
        assert_eq!(all.len(), MAX_PUSH_HISTORY);
        assert_eq!(all[0].message, format!("push {}", MAX_PUSH_HISTORY + 4));
        assert_eq!(history.recent(3).await.len(), 3);
    }
}
