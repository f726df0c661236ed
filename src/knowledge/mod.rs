//! Static reference data and the pure lookups over it.
//!
//! Everything here is read-only at runtime and performs no I/O.

pub mod broadcasts;
pub mod dreams;
pub mod promos;
pub mod schedule;

pub use broadcasts::{BroadcastTemplate, find_template, render_broadcast};
pub use dreams::{LuckyTokens, extract_tokens};
pub use schedule::{ScheduleEntry, ScheduleGroup, find_by_text};
