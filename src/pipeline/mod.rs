//! Message routing and safety pipeline.
//!
//! Every inbound LINE event flows through:
//! 1. `IntentMatcher::classify()`: ordered regex rules (no LLM)
//! 2. `RateLimiter::check()`: fixed-window cap per identity
//! 3. Domain renderers or the generative fallback
//! 4. `ResponseValidator` + `sanitize` on anything generated
//!
//! `MessageProcessor` ties the stages together and sends one reply per event.

pub mod processor;
pub mod rules;
pub mod types;

pub use processor::MessageProcessor;
pub use rules::{DomainIntent, IntentMatch, IntentMatcher};
pub use types::{
    Decision, EventKind, EventReport, InboundEvent, MessageSender, OutboundMessage, ReplyHandle,
    Stage,
};
