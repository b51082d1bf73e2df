//! Recommendation Types
//!
//! Data structures only. No logic here.

use serde::{Deserialize, Serialize};

use crate::logic::rulebase::RulebaseStage;

// ============================================================================
// RECOMMENDATION CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Minimum excluded share for a split (inclusive)
    pub split_threshold: f64,
    /// Excluded share above which disabling is suggested (exclusive)
    pub disable_threshold: f64,
    /// Excluded share above which the per-application breakdown is attached
    pub grouping_threshold: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            split_threshold: 0.2,
            disable_threshold: 0.9,
            grouping_threshold: 0.5,
        }
    }
}

// ============================================================================
// RECOMMENDATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Forwarding already disabled
    NoAction,
    Split,
    Disable,
    Keep,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::NoAction => "no_action",
            RecommendationKind::Split => "split",
            RecommendationKind::Disable => "disable",
            RecommendationKind::Keep => "keep",
        }
    }
}

impl std::fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RULE ANALYSIS
// ============================================================================

/// EPS figures and recommendation for one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAnalysis {
    /// Aggregation key (registry key for resolved rules)
    pub rule_key: String,
    pub rule_id: String,
    pub rule_name: String,
    pub total_eps: f64,
    pub included_eps: f64,
    pub excluded_eps: f64,
    /// Excluded share of the rule's events (0..=1)
    pub excluded_fraction: f64,
    pub forwarding_enabled: bool,
    pub potential_savings_eps: f64,
    pub needs_split: bool,
    pub kind: RecommendationKind,
    pub recommendation: String,
    pub location: String,
    pub device_group: Option<String>,
    pub rulebase_stage: Option<RulebaseStage>,
}

// ============================================================================
// FLEET TOTALS
// ============================================================================

/// Savings headline across all analysed rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForwardingTotals {
    /// Sum of `total_eps` over rules with forwarding enabled
    pub current_forwarded_eps: f64,
    /// Sum of `potential_savings_eps` over all rules
    pub potential_savings_eps: f64,
    /// Savings as a share of current forwarded EPS; `None` when nothing is forwarded
    pub reduction_percent: Option<f64>,
}

impl ForwardingTotals {
    pub fn from_analyses<'a>(analyses: impl IntoIterator<Item = &'a RuleAnalysis>) -> Self {
        let mut totals = Self::default();
        for analysis in analyses {
            if analysis.forwarding_enabled {
                totals.current_forwarded_eps += analysis.total_eps;
            }
            totals.potential_savings_eps += analysis.potential_savings_eps;
        }
        if totals.current_forwarded_eps > 0.0 {
            totals.reduction_percent = Some(totals.potential_savings_eps / totals.current_forwarded_eps * 100.0);
        }
        totals
    }

    pub fn from_reports(reports: &[RuleReport]) -> Self {
        Self::from_analyses(reports.iter().map(|r| &r.analysis))
    }
}

// ============================================================================
// REPORT VIEW
// ============================================================================

/// A traffic pattern with its rate over the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRate {
    pub source: String,
    pub destination: String,
    pub application: String,
    pub service: String,
    pub eps: f64,
    pub needs_forwarding: bool,
}

/// Excludable patterns of one application under a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationGroup {
    pub application: String,
    pub eps: f64,
    /// Sorted, wildcards removed
    pub sources: Vec<String>,
    pub destinations: Vec<String>,
    pub services: Vec<String>,
    pub justification: Option<String>,
}

impl ApplicationGroup {
    /// Multi-line bullet used in the forwarding report
    pub fn render(&self) -> String {
        let mut out = format!("- {} traffic ({:.1} EPS)", self.application, self.eps);
        if !self.sources.is_empty() {
            out.push_str(&format!("\n  Sources: {}", self.sources.join(", ")));
        }
        if !self.destinations.is_empty() {
            out.push_str(&format!("\n  Destinations: {}", self.destinations.join(", ")));
        }
        if !self.services.is_empty() {
            out.push_str(&format!("\n  Services: {}", self.services.join(", ")));
        }
        if let Some(justification) = &self.justification {
            out.push_str(&format!("\n  Justification: {}", justification));
        }
        out
    }
}

/// Report-shaped view of one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleReport {
    pub analysis: RuleAnalysis,
    pub patterns: Vec<PatternRate>,
    /// Present only when the excluded share passes the grouping threshold
    pub application_groups: Vec<ApplicationGroup>,
}

impl RuleReport {
    pub fn excludable_percent(&self) -> f64 {
        self.analysis.excluded_fraction * 100.0
    }
}
