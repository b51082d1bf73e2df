//! Forwarding Engine
//!
//! Decision logic only - no type definitions.
//! Input: LogEvent (+ matched rule) + ForwardingConfig
//! Output: ForwardDecision

use std::sync::Arc;

use super::config::ForwardingConfig;
use super::rules::{apply_rules, classifier_decision, default_rules, DecisionContext, ForwardingRule};
use super::types::{DecisionTier, ForwardDecision};
use crate::logic::classifier::ForwardClassifier;
use crate::logic::event::LogEvent;
use crate::logic::rulebase::{RuleRecord, RuleRegistry};

/// Layered forwarding policy. Pure: deciding never mutates state.
pub struct ForwardingPolicy {
    registry: Arc<RuleRegistry>,
    classifier: Option<Arc<dyn ForwardClassifier>>,
    config: ForwardingConfig,
    rules: Vec<Box<dyn ForwardingRule>>,
}

impl ForwardingPolicy {
    pub fn new(registry: Arc<RuleRegistry>, config: ForwardingConfig) -> Self {
        Self {
            registry,
            classifier: None,
            config,
            rules: default_rules(),
        }
    }

    /// Attach a trained classifier. Without one the classifier tier is skipped.
    pub fn with_classifier(mut self, classifier: Arc<dyn ForwardClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn config(&self) -> &ForwardingConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    // ========================================================================
    // MAIN DECISION FUNCTIONS
    // ========================================================================

    /// Decide for one event, resolving its rule through the registry
    pub fn decide(&self, event: &LogEvent) -> ForwardDecision {
        let rule = self.registry.resolve_event(event);
        self.decide_with_rule(event, rule)
    }

    /// Decide for one event with an already resolved rule
    pub fn decide_with_rule(&self, event: &LogEvent, rule: Option<&RuleRecord>) -> ForwardDecision {
        let ctx = DecisionContext {
            event,
            rule,
            classifier: self.classifier.as_deref(),
            config: &self.config,
        };
        apply_rules(&self.rules, &ctx).unwrap_or_else(fail_open)
    }

    /// Decide for a batch, calling the classifier once for every event that
    /// reaches the classifier tier. Same results as calling `decide` per event.
    pub fn decide_batch(&self, events: &[LogEvent]) -> Vec<ForwardDecision> {
        let mut decisions: Vec<Option<ForwardDecision>> = Vec::with_capacity(events.len());
        let mut pending = Vec::new();

        for (i, event) in events.iter().enumerate() {
            let ctx = DecisionContext {
                event,
                rule: self.registry.resolve_event(event),
                classifier: None,
                config: &self.config,
            };
            let decision = apply_rules(&self.rules, &ctx);
            if decision.is_none() {
                pending.push(i);
            }
            decisions.push(decision);
        }

        if let Some(classifier) = self.classifier.as_deref() {
            if !pending.is_empty() {
                let batch: Vec<LogEvent> = pending.iter().map(|&i| events[i].clone()).collect();
                let predictions = classifier.predict(&batch);
                for (&i, prediction) in pending.iter().zip(predictions) {
                    decisions[i] = Some(classifier_decision(
                        &events[i],
                        prediction.forward_confidence(),
                        &self.config,
                    ));
                }
            }
        }

        decisions.into_iter().map(|d| d.unwrap_or_else(fail_open)).collect()
    }
}

/// Unknown traffic is forwarded
fn fail_open() -> ForwardDecision {
    ForwardDecision::new(
        DecisionTier::Default,
        true,
        "No rule, flag or classifier - forwarded by default",
    )
}

// ============================================================================
// TESTS
// ============================================================================
