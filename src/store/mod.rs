//! Volatile in-process state: rate-limit counters, tracked users, push history.

mod memory;
mod traits;

pub use memory::{InMemoryPushHistory, InMemoryRateLimitStore, InMemoryUserRegistry, MAX_PUSH_HISTORY};
pub use traits::{
    PushHistory, PushRecord, RateLimitEntry, RateLimitStore, UserRecord, UserStats, UserTracker,
};
