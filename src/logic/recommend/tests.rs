use std::sync::Arc;

use super::*;
use crate::logic::aggregator::PatternAggregator;
use crate::logic::event::LogEvent;
use crate::logic::rulebase::RuleRegistry;

const BASE: i64 = 1_700_000_000;

/// `excluded` low-severity events then `included` THREAT events, spread
/// evenly over exactly 100 seconds
fn events(rule: &str, excluded: usize, included: usize) -> Vec<LogEvent> {
    let n = excluded + included;
    (0..n)
        .map(|i| {
            let offset = if n > 1 { (i * 100 / (n - 1)) as i64 } else { 0 };
            let event = LogEvent::new()
                .with("Rule", rule)
                .with("Receive Time", (BASE + offset).to_string())
                .with("Application", "dns-base");
            if i < excluded {
                event.with("Severity", "low")
            } else {
                event.with("Type", "THREAT")
            }
        })
        .collect()
}

fn aggregate(streams: &[Vec<LogEvent>]) -> PatternAggregator {
    let mut aggregator = PatternAggregator::new(Arc::new(RuleRegistry::new()));
    for stream in streams {
        aggregator.ingest_all(stream);
    }
    aggregator
}

fn single(rule: &str, excluded: usize, included: usize) -> RuleAnalysis {
    let analyses = RecommendationEngine::new().analyze(&aggregate(&[events(rule, excluded, included)]));
    assert_eq!(analyses.len(), 1);
    analyses.into_iter().next().unwrap()
}

#[test]
fn test_eighty_twenty_scenario() {
    let r1 = single("R1", 80, 20);
    assert_eq!(r1.total_eps, 1.0);
    assert_eq!(r1.excluded_eps, 0.8);
    assert!((r1.included_eps - 0.2).abs() < 1e-12);
    assert_eq!(r1.potential_savings_eps, 0.8);
    assert!(r1.needs_split);
    assert_eq!(r1.kind, RecommendationKind::Split);
    assert_eq!(
        r1.recommendation,
        "Consider splitting rule - 0.8 EPS (80.0%) could be excluded from forwarding"
    );
    assert_eq!(r1.location, "Unknown");
}

#[test]
fn test_split_boundary_is_inclusive() {
    let at = single("R1", 20, 80);
    assert!(at.needs_split);

    let below = single("R1", 19, 81);
    assert!(!below.needs_split);
    assert_eq!(below.kind, RecommendationKind::Keep);
    assert_eq!(below.recommendation, "Keep current forwarding configuration");
}

#[test]
fn test_ninety_percent_still_splits() {
    // Split is checked before disable
    let r = single("R1", 90, 10);
    assert_eq!(r.kind, RecommendationKind::Split);
}

#[test]
fn test_disable_when_nothing_needs_forwarding() {
    let r = single("R1", 100, 0);
    assert!(!r.needs_split);
    assert_eq!(r.kind, RecommendationKind::Disable);
    assert_eq!(
        r.recommendation,
        "Consider disabling forwarding - over 90% of traffic could be excluded"
    );
}

#[test]
fn test_disable_boundary_is_exclusive() {
    let engine = RecommendationEngine::with_config(RecommendationConfig {
        split_threshold: 0.95,
        ..RecommendationConfig::default()
    });

    let at = engine.analyze(&aggregate(&[events("R1", 90, 10)]));
    assert_eq!(at[0].kind, RecommendationKind::Keep);

    let above = engine.analyze(&aggregate(&[events("R1", 91, 9)]));
    assert_eq!(above[0].kind, RecommendationKind::Disable);
}

#[test]
fn test_disabled_rule_saves_everything() {
    let stream: Vec<LogEvent> = events("R1", 50, 50)
        .into_iter()
        .map(|e| e.with("LogForwarding", "disabled"))
        .collect();
    let analyses = RecommendationEngine::new().analyze(&aggregate(&[stream]));
    let r = &analyses[0];
    assert!(!r.forwarding_enabled);
    assert!(!r.needs_split);
    assert_eq!(r.kind, RecommendationKind::NoAction);
    assert_eq!(r.potential_savings_eps, r.total_eps);
    assert_eq!(r.recommendation, "Rule already has forwarding disabled. No action needed.");
}

#[test]
fn test_sorted_by_savings_with_equal_totals() {
    let aggregator = aggregate(&[events("Low", 10, 90), events("High", 50, 50)]);
    let analyses = RecommendationEngine::new().analyze(&aggregator);
    assert_eq!(analyses[0].total_eps, analyses[1].total_eps);
    assert_eq!(analyses[0].rule_id, "High");
    assert_eq!(analyses[1].rule_id, "Low");
}

#[test]
fn test_ties_keep_first_seen_order() {
    let aggregator = aggregate(&[events("B", 30, 70), events("A", 30, 70)]);
    let ids: Vec<_> = RecommendationEngine::new()
        .analyze(&aggregator)
        .into_iter()
        .map(|a| a.rule_id)
        .collect();
    assert_eq!(ids, vec!["B", "A"]);
}

#[test]
fn test_empty_aggregator_yields_nothing() {
    let engine = RecommendationEngine::new();
    assert!(engine.analyze(&aggregate(&[])).is_empty());
    assert!(engine.reports(&aggregate(&[])).is_empty());
}

#[test]
fn test_timestampless_events_yield_nothing() {
    let stream = vec![
        LogEvent::new().with("Rule", "R1").with("Time", "not a time"),
        LogEvent::new().with("Rule", "R1"),
    ];
    let aggregator = aggregate(&[stream]);
    assert_eq!(aggregator.get("R1").unwrap().total_event_count, 2);
    assert!(RecommendationEngine::new().analyze(&aggregator).is_empty());
}

#[test]
fn test_single_timestamp_yields_nothing() {
    let aggregator = aggregate(&[events("R1", 1, 0)]);
    assert!(RecommendationEngine::new().analyze(&aggregator).is_empty());
}

#[test]
fn test_report_groups_excludable_applications() {
    let mut stream = events("R1", 60, 40);
    for (i, e) in stream.iter_mut().take(20).enumerate() {
        e.insert("Application", "ssl");
        e.insert("Source", if i % 2 == 0 { "10.0.0.2" } else { "10.0.0.1" });
        e.insert("Service", "tcp/443");
    }
    stream[20].insert("Application", "Any");

    let reports = RecommendationEngine::new().reports(&aggregate(&[stream]));
    let report = &reports[0];
    assert!((report.excludable_percent() - 60.0).abs() < 1e-9);

    let apps: Vec<_> = report.application_groups.iter().map(|g| g.application.as_str()).collect();
    assert_eq!(apps, vec!["ssl", "dns-base"]);

    let ssl = &report.application_groups[0];
    assert_eq!(ssl.sources, vec!["10.0.0.1", "10.0.0.2"]);
    assert_eq!(ssl.services, vec!["tcp/443"]);
    assert!(ssl.destinations.is_empty());
    assert!((ssl.eps - 0.2).abs() < 1e-9);
    assert_eq!(
        ssl.justification.as_deref(),
        Some("Standard encrypted web traffic, monitored by URL filtering")
    );

    // The THREAT events share the first dns-base tuple, whose flag was set
    // by a low-severity event
    let dns = &report.application_groups[1];
    assert!((dns.eps - 0.79).abs() < 1e-9);
}

#[test]
fn test_report_groups_need_majority_excludable() {
    let reports = RecommendationEngine::new().reports(&aggregate(&[events("R1", 50, 50)]));
    assert!(reports[0].application_groups.is_empty());
    assert_eq!(reports[0].patterns.len(), 1);
}

#[test]
fn test_group_render() {
    let group = ApplicationGroup {
        application: "icmp".to_string(),
        eps: 1.3,
        sources: vec!["10.0.0.1".to_string()],
        destinations: vec![],
        services: vec![],
        justification: justification("icmp").map(String::from),
    };
    assert_eq!(
        group.render(),
        "- icmp traffic (1.3 EPS)\n  Sources: 10.0.0.1\n  Justification: Network diagnostic traffic, monitored by threat prevention"
    );
}

fn disabled(stream: Vec<LogEvent>) -> Vec<LogEvent> {
    stream.into_iter().map(|e| e.with("LogForwarding", "disabled")).collect()
}

#[test]
fn test_totals_across_rules() {
    let aggregator = aggregate(&[events("R1", 80, 20), disabled(events("R2", 10, 0))]);
    let engine = RecommendationEngine::new();
    let analyses = engine.analyze(&aggregator);
    let totals = engine.totals(&analyses);

    // Only forwarding-enabled rules count as current traffic
    assert_eq!(totals.current_forwarded_eps, 1.0);
    // R1 excluded share plus all of the disabled R2
    assert!((totals.potential_savings_eps - 0.9).abs() < 1e-9);
    assert!((totals.reduction_percent.unwrap() - 90.0).abs() < 1e-9);

    let reports = engine.reports(&aggregator);
    assert_eq!(ForwardingTotals::from_reports(&reports), totals);
}

#[test]
fn test_totals_without_forwarded_traffic() {
    let aggregator = aggregate(&[disabled(events("R2", 10, 0))]);
    let engine = RecommendationEngine::new();
    let totals = engine.totals(&engine.analyze(&aggregator));
    assert_eq!(totals.current_forwarded_eps, 0.0);
    assert!((totals.potential_savings_eps - 0.1).abs() < 1e-9);
    assert_eq!(totals.reduction_percent, None);

    assert_eq!(engine.totals(&[]), ForwardingTotals::default());
}
