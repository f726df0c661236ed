//! LINE concierge: message routing and safety pipeline for a LINE Official Account.

pub mod channels;
pub mod config;
pub mod error;
pub mod feed;
pub mod knowledge;
pub mod llm;
pub mod pipeline;
pub mod safety;
pub mod server;
pub mod store;
