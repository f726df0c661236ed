//! LINE channel plumbing: wire client, webhook parsing and Flex cards.

pub mod flex;
pub mod line;

pub use line::{LineClient, check_signature, parse_webhook, verify_signature};
