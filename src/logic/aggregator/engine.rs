//! Pattern Aggregator Engine
//!
//! Single owner of all aggregate state for one run. Events go in one at a
//! time; shards built in parallel are combined with `merge`.

use std::collections::HashMap;
use std::sync::Arc;

use super::types::{AggregationConfig, AnalysisWindow, ExclusionBasis, PatternKey, RuleAggregate};
use crate::logic::event::{parse_flag, Field, LogEvent};
use crate::logic::forwarding::{ForwardDecision, ForwardingPolicy};
use crate::logic::rulebase::RuleRegistry;

/// Severity values the heuristic treats as forward-worthy
const HIGH_SEVERITIES: &[&str] = &["high", "critical", "4", "5"];

/// Heuristic used for pattern flags: THREAT type, or high/critical/4/5
/// severity (first present severity alias)
pub fn event_needs_forwarding(event: &LogEvent) -> bool {
    if event.is_threat() {
        return true;
    }
    event
        .field(Field::Severity)
        .map(|s| {
            let s = s.to_lowercase();
            HIGH_SEVERITIES.contains(&s.as_str())
        })
        .unwrap_or(false)
}

/// Pattern tuple, "Any" for missing components
pub fn pattern_key(event: &LogEvent) -> PatternKey {
    (
        event.field_or_any(Field::Source).to_string(),
        event.field_or_any(Field::Destination).to_string(),
        event.field_or_any(Field::Application).to_string(),
        event.field_or_any(Field::Service).to_string(),
    )
}

pub struct PatternAggregator {
    registry: Arc<RuleRegistry>,
    policy: Option<Arc<ForwardingPolicy>>,
    config: AggregationConfig,
    rules: Vec<RuleAggregate>,
    index: HashMap<String, usize>,
    window: AnalysisWindow,
    ingested: u64,
    skipped: u64,
}

impl PatternAggregator {
    pub fn new(registry: Arc<RuleRegistry>) -> Self {
        Self {
            registry,
            policy: None,
            config: AggregationConfig::default(),
            rules: Vec::new(),
            index: HashMap::new(),
            window: AnalysisWindow::default(),
            ingested: 0,
            skipped: 0,
        }
    }

    pub fn with_config(mut self, config: AggregationConfig) -> Self {
        self.config = config;
        self
    }

    /// Policy consulted when the exclusion basis is `Policy`
    pub fn with_policy(mut self, policy: Arc<ForwardingPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    // ========================================================================
    // INGEST
    // ========================================================================

    /// Fold one event into the aggregates. Never fails; events without a
    /// usable rule identity are counted as skipped.
    pub fn ingest(&mut self, event: &LogEvent) {
        self.ingest_event(event, None);
    }

    /// Like `ingest`, reusing a decision already made for this event (e.g.
    /// by `ForwardingPolicy::decide_batch`) when the basis is `Policy`
    pub fn ingest_decided(&mut self, event: &LogEvent, decision: &ForwardDecision) {
        self.ingest_event(event, Some(decision));
    }

    fn ingest_event(&mut self, event: &LogEvent, decision: Option<&ForwardDecision>) {
        let Some(rule_id) = event
            .field(Field::RuleId)
            .or_else(|| event.field(Field::RuleName))
        else {
            self.skipped += 1;
            log::debug!("Skipping event without rule identity");
            return;
        };

        let resolved_key = self.registry.resolve_event(event).map(|rule| rule.key());
        if resolved_key.is_none() && self.config.strict_rule_match {
            self.skipped += 1;
            log::debug!("Skipping event for unknown rule '{}'", rule_id);
            return;
        }

        let timestamp = event.timestamp();
        if let Some(ts) = timestamp {
            self.window.observe(ts);
        }

        // The same classification seeds a new pattern's flag and moves the counters
        let included = match decision {
            Some(d) if self.config.exclusion_basis == ExclusionBasis::Policy => d.must_forward,
            _ => self.classify(event),
        };

        // Same-named rules in different device groups stay apart
        let key = resolved_key.unwrap_or_else(|| rule_id.to_string());
        let idx = match self.index.get(&key) {
            Some(&i) => i,
            None => self.open_aggregate(key, rule_id, event),
        };
        self.rules[idx].record(pattern_key(event), included, included, timestamp);
        self.ingested += 1;
    }

    pub fn ingest_all<'a>(&mut self, events: impl IntoIterator<Item = &'a LogEvent>) {
        for event in events {
            self.ingest(event);
        }
    }

    fn classify(&self, event: &LogEvent) -> bool {
        match (self.config.exclusion_basis, &self.policy) {
            (ExclusionBasis::Policy, Some(policy)) => policy.decide(event).must_forward,
            _ => event_needs_forwarding(event),
        }
    }

    /// First event for a rule: snapshot name, location and forwarding state
    fn open_aggregate(&mut self, key: String, rule_id: &str, event: &LogEvent) -> usize {
        let rule_name = event.field(Field::RuleName).unwrap_or(rule_id);

        let aggregate = match self.registry.resolve_event(event) {
            Some(rule) => RuleAggregate::new(rule_id, rule_name, rule.forwarding_enabled)
                .with_source(rule.source()),
            None => {
                let forwarding = event
                    .field(Field::ForwardingFlag)
                    .map(|v| parse_flag(v).unwrap_or(true))
                    .unwrap_or(true);
                let aggregate = RuleAggregate::new(rule_id, rule_name, forwarding);
                match self.registry.source_of(rule_name) {
                    Some(source) => aggregate.with_source(source),
                    None => aggregate,
                }
            }
        };

        let aggregate = aggregate.with_key(key.clone());

        log::debug!(
            "New rule aggregate '{}' (forwarding {})",
            key,
            if aggregate.forwarding_enabled { "enabled" } else { "disabled" }
        );
        let idx = self.rules.len();
        self.index.insert(key, idx);
        self.rules.push(aggregate);
        idx
    }

    // ========================================================================
    // MERGE
    // ========================================================================

    /// Add a shard's aggregates. Rules new to `self` are appended in the
    /// shard's order.
    pub fn merge(&mut self, other: PatternAggregator) {
        self.window.merge(&other.window);
        self.ingested += other.ingested;
        self.skipped += other.skipped;

        for aggregate in other.rules {
            match self.index.get(&aggregate.key) {
                Some(&i) => self.rules[i].merge(aggregate),
                None => {
                    self.index.insert(aggregate.key.clone(), self.rules.len());
                    self.rules.push(aggregate);
                }
            }
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Aggregates in first-seen order
    pub fn aggregates(&self) -> &[RuleAggregate] {
        &self.rules
    }

    /// Look up by aggregation key (see `RuleAggregate::key`)
    pub fn get(&self, key: &str) -> Option<&RuleAggregate> {
        self.index.get(key).map(|&i| &self.rules[i])
    }

    pub fn window(&self) -> &AnalysisWindow {
        &self.window
    }

    /// Events folded into some aggregate
    pub fn ingested_count(&self) -> u64 {
        self.ingested
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped
    }
}
