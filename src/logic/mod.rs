//! Logic Module - Analysis engines
//!
//! ## Structure
//! - `event/` - LogEvent and field aliases
//! - `rulebase/` - Policy sources and RuleRegistry
//! - `classifier/` - ForwardClassifier capability and the token model
//! - `forwarding/` - ForwardingPolicy (per-event decision)
//! - `aggregator/` - PatternAggregator (per-rule statistics)
//! - `recommend/` - RecommendationEngine (EPS and advice)
//! - `estimate` - Daily volume and storage projection
//! - `ingest/` - CSV, JSON-lines and syslog readers
//! - `report/` - Text and JSON reports
//! - `config` - AnalyzerConfig
//! - `pipeline` - One analysis run end to end

// Core components
pub mod event;
pub mod rulebase;
pub mod classifier;
pub mod forwarding;
pub mod aggregator;
pub mod recommend;

// Surrounding layers
pub mod estimate;
pub mod ingest;
pub mod report;
pub mod config;
pub mod pipeline;
