//! Forwarding Rules (ordered tiers)
//!
//! Each tier either decides or passes. The engine applies them in order and
//! the first decision wins.

use super::config::ForwardingConfig;
use super::types::{DecisionTier, ForwardDecision};
use crate::logic::classifier::ForwardClassifier;
use crate::logic::event::{parse_flag, Field, LogEvent};
use crate::logic::rulebase::RuleRecord;

// ============================================================================
// DECISION CONTEXT
// ============================================================================

/// Everything a tier may look at
pub struct DecisionContext<'a> {
    pub event: &'a LogEvent,
    pub rule: Option<&'a RuleRecord>,
    pub classifier: Option<&'a dyn ForwardClassifier>,
    pub config: &'a ForwardingConfig,
}

// ============================================================================
// FORWARDING RULE TRAIT
// ============================================================================

pub trait ForwardingRule: Send + Sync {
    fn tier(&self) -> DecisionTier;
    fn evaluate(&self, ctx: &DecisionContext<'_>) -> Option<ForwardDecision>;
}

// ============================================================================
// BUILT-IN TIERS
// ============================================================================

/// THREAT events always forward with full confidence
pub struct ThreatOverride;

impl ForwardingRule for ThreatOverride {
    fn tier(&self) -> DecisionTier {
        DecisionTier::ThreatOverride
    }

    fn evaluate(&self, ctx: &DecisionContext<'_>) -> Option<ForwardDecision> {
        if !ctx.event.is_threat() {
            return None;
        }
        Some(ForwardDecision::new(self.tier(), true, "THREAT event - always forwarded").with_confidence(1.0))
    }
}

/// Honor a literal per-event forwarding flag
pub struct ExplicitFlag;

impl ForwardingRule for ExplicitFlag {
    fn tier(&self) -> DecisionTier {
        DecisionTier::ExplicitFlag
    }

    fn evaluate(&self, ctx: &DecisionContext<'_>) -> Option<ForwardDecision> {
        let raw = ctx.event.field(Field::ForwardingFlag)?;
        let forward = parse_flag(raw)?;
        Some(ForwardDecision::new(
            self.tier(),
            forward,
            format!("Explicit forwarding flag '{}'", raw),
        ))
    }
}

/// The matched rule's log-forwarding setting is authoritative
pub struct RuleSetting;

impl ForwardingRule for RuleSetting {
    fn tier(&self) -> DecisionTier {
        DecisionTier::RuleSetting
    }

    fn evaluate(&self, ctx: &DecisionContext<'_>) -> Option<ForwardDecision> {
        let rule = ctx.rule?;
        let reason = if rule.forwarding_enabled {
            format!("Rule '{}' has log forwarding enabled", rule.name)
        } else {
            format!("Rule '{}' has no log forwarding profile", rule.name)
        };
        Some(ForwardDecision::new(self.tier(), rule.forwarding_enabled, reason))
    }
}

/// Classifier confidence, with the always-forward severity check
pub struct ClassifierFallback;

impl ForwardingRule for ClassifierFallback {
    fn tier(&self) -> DecisionTier {
        DecisionTier::Classifier
    }

    fn evaluate(&self, ctx: &DecisionContext<'_>) -> Option<ForwardDecision> {
        let classifier = ctx.classifier?;
        let prediction = classifier
            .predict(std::slice::from_ref(ctx.event))
            .into_iter()
            .next()?;
        Some(classifier_decision(ctx.event, prediction.forward_confidence(), ctx.config))
    }
}

/// Combine a forward probability with the priority-severity override
pub fn classifier_decision(event: &LogEvent, confidence: f32, config: &ForwardingConfig) -> ForwardDecision {
    let tier = DecisionTier::Classifier;

    if let Some(severity) = event.field(Field::Severity) {
        if config.is_priority(severity) {
            return ForwardDecision::new(tier, true, format!("Priority level '{}' always forwarded", severity))
                .with_confidence(confidence);
        }
    }

    let forward = confidence >= config.confidence_threshold;
    let reason = format!(
        "Classifier confidence {:.2} {} threshold {:.2}",
        confidence,
        if forward { ">=" } else { "<" },
        config.confidence_threshold
    );
    ForwardDecision::new(tier, forward, reason).with_confidence(confidence)
}

/// Tiers in decision order (the fail-open default is applied by the engine)
pub fn default_rules() -> Vec<Box<dyn ForwardingRule>> {
    vec![
        Box::new(ThreatOverride),
        Box::new(ExplicitFlag),
        Box::new(RuleSetting),
        Box::new(ClassifierFallback),
    ]
}

// ============================================================================
// RULE ENGINE
// ============================================================================

/// Apply rules in order, return the first decision
pub fn apply_rules(rules: &[Box<dyn ForwardingRule>], ctx: &DecisionContext<'_>) -> Option<ForwardDecision> {
    rules.iter().find_map(|rule| rule.evaluate(ctx))
}
