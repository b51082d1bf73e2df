//! Forwarding Types
//!
//! Core types for forwarding decisions.
//! No logic here - data structures only.

use serde::{Deserialize, Serialize};

// ============================================================================
// DECISION TIERS
// ============================================================================

/// Which tier of the layered policy produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionTier {
    /// THREAT events, unconditional
    ThreatOverride,
    /// Per-event forwarding flag
    ExplicitFlag,
    /// Log-forwarding setting of the matched rule
    RuleSetting,
    /// Statistical classifier (with priority override)
    Classifier,
    /// Nothing applied, fail open
    Default,
}

impl DecisionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionTier::ThreatOverride => "threat_override",
            DecisionTier::ExplicitFlag => "explicit_flag",
            DecisionTier::RuleSetting => "rule_setting",
            DecisionTier::Classifier => "classifier",
            DecisionTier::Default => "default",
        }
    }

    /// True for tiers that do not depend on a model
    pub fn is_deterministic(&self) -> bool {
        matches!(
            self,
            DecisionTier::ThreatOverride | DecisionTier::ExplicitFlag | DecisionTier::RuleSetting
        )
    }
}

impl std::fmt::Display for DecisionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// FORWARD DECISION
// ============================================================================

/// Complete forwarding decision for one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardDecision {
    pub must_forward: bool,
    /// Set by the threat override (1.0) and the classifier tier only
    pub confidence: Option<f32>,
    pub tier: DecisionTier,
    pub reasons: Vec<String>,
}

impl ForwardDecision {
    pub fn new(tier: DecisionTier, must_forward: bool, reason: impl Into<String>) -> Self {
        Self {
            must_forward,
            confidence: None,
            tier,
            reasons: vec![reason.into()],
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// `(mustForward, confidence)` pair.
    ///
    /// Deterministic tiers report 1.0; the fail-open default reports 0.0.
    pub fn as_pair(&self) -> (bool, f32) {
        let confidence = self.confidence.unwrap_or(match self.tier {
            DecisionTier::Default => 0.0,
            _ => 1.0,
        });
        (self.must_forward, confidence)
    }
}
