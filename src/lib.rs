//! Log Forwarding Analyzer
//!
//! Decides which firewall log events must reach the SIEM, aggregates traffic
//! per security rule, and recommends forwarding changes with EPS and storage
//! projections.

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{AnalyzerError, AnalyzerResult};
pub use logic::aggregator::PatternAggregator;
pub use logic::config::AnalyzerConfig;
pub use logic::event::LogEvent;
pub use logic::forwarding::{ForwardDecision, ForwardingPolicy};
pub use logic::pipeline::{AnalysisOutcome, Analyzer};
pub use logic::recommend::RecommendationEngine;
pub use logic::rulebase::RuleRegistry;
