//! Aggregator Module
//!
//! Streaming per-rule statistics: included/excluded counters, the global
//! analysis window, and deduplicated traffic patterns.
//!
//! ## Structure
//! - `types`: RuleAggregate, TrafficPattern, AnalysisWindow, AggregationConfig
//! - `engine`: PatternAggregator (ingest, merge)
//!
//! ## Usage
//! ```ignore
//! let mut aggregator = PatternAggregator::new(registry.clone());
//! for event in &events {
//!     aggregator.ingest(event);
//! }
//! let analyses = RecommendationEngine::new().analyze(&aggregator);
//! ```

pub mod types;
pub mod engine;


pub use types::{AggregationConfig, AnalysisWindow, ExclusionBasis, PatternKey, RuleAggregate, TrafficPattern};
pub use engine::{event_needs_forwarding, pattern_key, PatternAggregator};
