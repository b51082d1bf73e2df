//! Forwarding Module
//!
//! Decides whether one log event must reach the SIEM.
//!
//! ## Decision order (first match wins)
//! 1. THREAT override
//! 2. Explicit per-event flag
//! 3. Matched rule's log-forwarding setting
//! 4. Classifier confidence (priority severities always forward)
//! 5. Fail open
//!
//! ## Structure
//! - `types`: ForwardDecision, DecisionTier
//! - `config`: Threshold and priority levels
//! - `rules`: The ordered tiers
//! - `engine`: ForwardingPolicy

pub mod types;
pub mod config;
pub mod rules;
pub mod engine;

pub use types::{DecisionTier, ForwardDecision};
pub use config::ForwardingConfig;
pub use rules::{apply_rules, DecisionContext, ForwardingRule};
pub use engine::ForwardingPolicy;
