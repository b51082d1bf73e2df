//! Recommendation Engine
//!
//! Turns final aggregates into EPS figures and keep/split/disable advice.
//! Runs once, after the event stream is consumed.

use std::collections::BTreeSet;

use super::justification::justification;
use super::types::{
    ApplicationGroup, ForwardingTotals, PatternRate, RecommendationConfig, RecommendationKind, RuleAnalysis, RuleReport,
};
use crate::logic::aggregator::{PatternAggregator, RuleAggregate};
use crate::logic::event::ANY;

#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: RecommendationConfig,
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RecommendationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    // ========================================================================
    // ANALYSIS
    // ========================================================================

    /// One analysis per rule, highest potential savings first (ties keep
    /// first-seen order). Empty until the window has a positive duration.
    pub fn analyze(&self, aggregator: &PatternAggregator) -> Vec<RuleAnalysis> {
        let Some(duration) = aggregator.window().positive_duration() else {
            log::debug!("No positive analysis window, nothing to recommend");
            return Vec::new();
        };

        let mut results: Vec<RuleAnalysis> = aggregator
            .aggregates()
            .iter()
            .map(|agg| self.analyze_rule(agg, duration))
            .collect();

        results.sort_by(|a, b| {
            b.potential_savings_eps
                .partial_cmp(&a.potential_savings_eps)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }

    /// Figures for one aggregate over `duration_seconds`
    pub fn analyze_rule(&self, agg: &RuleAggregate, duration_seconds: f64) -> RuleAnalysis {
        let rate = |count: u64| {
            if duration_seconds > 0.0 {
                count as f64 / duration_seconds
            } else {
                0.0
            }
        };

        let total_eps = rate(agg.total_event_count);
        let included_eps = rate(agg.included_event_count);
        let excluded_eps = rate(agg.excluded_event_count);
        let excluded_fraction = agg.excluded_fraction();

        let potential_savings_eps = if agg.forwarding_enabled { excluded_eps } else { total_eps };

        let needs_split = agg.forwarding_enabled
            && included_eps > 0.0
            && excluded_eps > 0.0
            && excluded_fraction >= self.config.split_threshold;

        let kind = if !agg.forwarding_enabled {
            RecommendationKind::NoAction
        } else if needs_split {
            RecommendationKind::Split
        } else if excluded_fraction > self.config.disable_threshold {
            RecommendationKind::Disable
        } else {
            RecommendationKind::Keep
        };

        RuleAnalysis {
            rule_key: agg.key.clone(),
            rule_id: agg.rule_id.clone(),
            rule_name: agg.rule_name.clone(),
            total_eps,
            included_eps,
            excluded_eps,
            excluded_fraction,
            forwarding_enabled: agg.forwarding_enabled,
            potential_savings_eps,
            needs_split,
            kind,
            recommendation: recommendation_text(kind, excluded_eps, excluded_fraction, self.config.disable_threshold),
            location: agg
                .source
                .as_ref()
                .map(|s| s.location())
                .unwrap_or_else(|| "Unknown".to_string()),
            device_group: agg.device_group.clone(),
            rulebase_stage: agg.rulebase_stage,
        }
    }

    /// Fleet-wide forwarded EPS and savings for a set of analyses
    pub fn totals(&self, analyses: &[RuleAnalysis]) -> ForwardingTotals {
        ForwardingTotals::from_analyses(analyses)
    }

    // ========================================================================
    // REPORT VIEW
    // ========================================================================

    /// Analyses (same order as `analyze`) with pattern rates and, for mostly
    /// excludable rules, the per-application breakdown
    pub fn reports(&self, aggregator: &PatternAggregator) -> Vec<RuleReport> {
        let Some(duration) = aggregator.window().positive_duration() else {
            return Vec::new();
        };

        self.analyze(aggregator)
            .into_iter()
            .filter_map(|analysis| {
                let agg = aggregator.get(&analysis.rule_key)?;
                let patterns: Vec<PatternRate> = agg
                    .patterns()
                    .iter()
                    .map(|p| PatternRate {
                        source: p.source.clone(),
                        destination: p.destination.clone(),
                        application: p.application.clone(),
                        service: p.service.clone(),
                        eps: p.occurrence_count as f64 / duration,
                        needs_forwarding: p.needs_forwarding,
                    })
                    .collect();

                let application_groups = if analysis.excluded_fraction > self.config.grouping_threshold {
                    group_by_application(&patterns)
                } else {
                    Vec::new()
                };

                Some(RuleReport {
                    analysis,
                    patterns,
                    application_groups,
                })
            })
            .collect()
    }
}

fn recommendation_text(
    kind: RecommendationKind,
    excluded_eps: f64,
    excluded_fraction: f64,
    disable_threshold: f64,
) -> String {
    match kind {
        RecommendationKind::NoAction => "Rule already has forwarding disabled. No action needed.".to_string(),
        RecommendationKind::Split => format!(
            "Consider splitting rule - {:.1} EPS ({:.1}%) could be excluded from forwarding",
            excluded_eps,
            excluded_fraction * 100.0
        ),
        RecommendationKind::Disable => format!(
            "Consider disabling forwarding - over {:.0}% of traffic could be excluded",
            disable_threshold * 100.0
        ),
        RecommendationKind::Keep => "Keep current forwarding configuration".to_string(),
    }
}

/// Group excludable patterns by application in first-seen order.
/// Wildcard applications are skipped.
pub fn group_by_application(patterns: &[PatternRate]) -> Vec<ApplicationGroup> {
    struct Acc<'a> {
        application: &'a str,
        eps: f64,
        sources: BTreeSet<&'a str>,
        destinations: BTreeSet<&'a str>,
        services: BTreeSet<&'a str>,
    }

    let mut groups: Vec<Acc<'_>> = Vec::new();
    for p in patterns.iter().filter(|p| !p.needs_forwarding && p.application != ANY) {
        let pos = match groups.iter().position(|g| g.application == p.application) {
            Some(pos) => pos,
            None => {
                groups.push(Acc {
                    application: p.application.as_str(),
                    eps: 0.0,
                    sources: BTreeSet::new(),
                    destinations: BTreeSet::new(),
                    services: BTreeSet::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[pos];
        group.eps += p.eps;
        if p.source != ANY {
            group.sources.insert(p.source.as_str());
        }
        if p.destination != ANY {
            group.destinations.insert(p.destination.as_str());
        }
        if p.service != ANY {
            group.services.insert(p.service.as_str());
        }
    }

    groups
        .into_iter()
        .map(|g| ApplicationGroup {
            application: g.application.to_string(),
            eps: g.eps,
            sources: g.sources.into_iter().map(String::from).collect(),
            destinations: g.destinations.into_iter().map(String::from).collect(),
            services: g.services.into_iter().map(String::from).collect(),
            justification: justification(g.application).map(String::from),
        })
        .collect()
}
