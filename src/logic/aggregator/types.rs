use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::rulebase::{RuleSource, RulebaseStage};

// ============================================================================
// AGGREGATION CONFIG
// ============================================================================

/// Which signal splits a rule's events into included/excluded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionBasis {
    /// THREAT type or high/critical/4/5 severity
    #[default]
    Heuristic,
    /// The full forwarding policy (`ForwardingPolicy::decide`)
    Policy,
}

impl ExclusionBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionBasis::Heuristic => "heuristic",
            ExclusionBasis::Policy => "policy",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Skip events whose rule is not in the registry
    pub strict_rule_match: bool,
    pub exclusion_basis: ExclusionBasis,
}

// ============================================================================
// TRAFFIC PATTERN
// ============================================================================

/// `(source, destination, application, service)`
pub type PatternKey = (String, String, String, String);

/// One distinct traffic shape seen under a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficPattern {
    pub source: String,
    pub destination: String,
    pub application: String,
    pub service: String,
    pub occurrence_count: u64,
    /// Fixed at first observation
    pub needs_forwarding: bool,
}

impl TrafficPattern {
    pub fn key(&self) -> PatternKey {
        (
            self.source.clone(),
            self.destination.clone(),
            self.application.clone(),
            self.service.clone(),
        )
    }
}

// ============================================================================
// RULE AGGREGATE
// ============================================================================

/// Streaming counters for one rule identifier.
///
/// `total_event_count == included_event_count + excluded_event_count` holds
/// after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleAggregate {
    /// Aggregation key: the registry key (`DG1::Allow-Web`) for resolved
    /// rules, the raw rule id otherwise
    pub key: String,
    /// Rule id as first seen in the logs
    pub rule_id: String,
    pub rule_name: String,
    pub device_group: Option<String>,
    pub rulebase_stage: Option<RulebaseStage>,
    /// Registry location, `None` when the rule is not in any loaded policy
    pub source: Option<RuleSource>,
    pub total_event_count: u64,
    pub included_event_count: u64,
    pub excluded_event_count: u64,
    /// Snapshotted at the first event
    pub forwarding_enabled: bool,
    pub last_seen_timestamp: Option<DateTime<Utc>>,
    patterns: Vec<TrafficPattern>,
    #[serde(skip_serializing)]
    pattern_index: HashMap<PatternKey, usize>,
}

impl RuleAggregate {
    pub fn new(rule_id: impl Into<String>, rule_name: impl Into<String>, forwarding_enabled: bool) -> Self {
        let rule_id = rule_id.into();
        Self {
            key: rule_id.clone(),
            rule_id,
            rule_name: rule_name.into(),
            device_group: None,
            rulebase_stage: None,
            source: None,
            total_event_count: 0,
            included_event_count: 0,
            excluded_event_count: 0,
            forwarding_enabled,
            last_seen_timestamp: None,
            patterns: Vec::new(),
            pattern_index: HashMap::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Attach registry metadata
    pub fn with_source(mut self, source: RuleSource) -> Self {
        self.device_group = source.device_group.clone();
        self.rulebase_stage = Some(source.rulebase_stage);
        self.source = Some(source);
        self
    }

    /// Count one event.
    ///
    /// `pattern_flag` only matters when the tuple is new; `included` decides
    /// which counter moves.
    pub fn record(&mut self, key: PatternKey, pattern_flag: bool, included: bool, timestamp: Option<DateTime<Utc>>) {
        self.add_pattern(key, 1, pattern_flag);

        self.total_event_count += 1;
        if included {
            self.included_event_count += 1;
        } else {
            self.excluded_event_count += 1;
        }

        if let Some(ts) = timestamp {
            self.touch(ts);
        }
    }

    /// Add another shard's counts for the same rule. Metadata stays ours.
    pub fn merge(&mut self, other: RuleAggregate) {
        self.total_event_count += other.total_event_count;
        self.included_event_count += other.included_event_count;
        self.excluded_event_count += other.excluded_event_count;

        if let Some(ts) = other.last_seen_timestamp {
            self.touch(ts);
        }
        for pattern in other.patterns {
            let key = pattern.key();
            self.add_pattern(key, pattern.occurrence_count, pattern.needs_forwarding);
        }
    }

    fn add_pattern(&mut self, key: PatternKey, count: u64, needs_forwarding: bool) {
        if let Some(&i) = self.pattern_index.get(&key) {
            self.patterns[i].occurrence_count += count;
            return;
        }
        let (source, destination, application, service) = key.clone();
        self.pattern_index.insert(key, self.patterns.len());
        self.patterns.push(TrafficPattern {
            source,
            destination,
            application,
            service,
            occurrence_count: count,
            needs_forwarding,
        });
    }

    fn touch(&mut self, ts: DateTime<Utc>) {
        self.last_seen_timestamp = Some(match self.last_seen_timestamp {
            Some(prev) if prev > ts => prev,
            _ => ts,
        });
    }

    /// Patterns in first-seen order
    pub fn patterns(&self) -> &[TrafficPattern] {
        &self.patterns
    }

    /// Excluded share of all events, 0 for an empty aggregate
    pub fn excluded_fraction(&self) -> f64 {
        if self.total_event_count == 0 {
            return 0.0;
        }
        self.excluded_event_count as f64 / self.total_event_count as f64
    }
}

// ============================================================================
// ANALYSIS WINDOW
// ============================================================================

/// Earliest and latest parseable timestamps seen in the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

impl AnalysisWindow {
    pub fn observe(&mut self, ts: DateTime<Utc>) {
        if self.earliest.map_or(true, |e| ts < e) {
            self.earliest = Some(ts);
        }
        if self.latest.map_or(true, |l| ts > l) {
            self.latest = Some(ts);
        }
    }

    pub fn merge(&mut self, other: &AnalysisWindow) {
        if let Some(ts) = other.earliest {
            self.observe(ts);
        }
        if let Some(ts) = other.latest {
            self.observe(ts);
        }
    }

    /// `latest - earliest` in seconds, `None` before any timestamp
    pub fn duration_seconds(&self) -> Option<f64> {
        let (earliest, latest) = (self.earliest?, self.latest?);
        Some((latest - earliest).num_milliseconds() as f64 / 1000.0)
    }

    /// Duration usable as an EPS denominator
    pub fn positive_duration(&self) -> Option<f64> {
        self.duration_seconds().filter(|d| *d > 0.0)
    }
}
