//! Recommend Module
//!
//! EPS projections and forwarding advice per rule.
//!
//! ## Structure
//! - `types`: RuleAnalysis, RuleReport, ApplicationGroup, ForwardingTotals, RecommendationConfig
//! - `engine`: RecommendationEngine
//! - `justification`: Canned text for well-known applications

pub mod types;
pub mod engine;
pub mod justification;

#[cfg(test)]
mod tests;

pub use types::{
    ApplicationGroup, ForwardingTotals, PatternRate, RecommendationConfig, RecommendationKind, RuleAnalysis, RuleReport,
};
pub use engine::{group_by_application, RecommendationEngine};
pub use justification::justification;
