//! Text rendering for the summary and forwarding reports

use std::fmt::Write;

use crate::logic::estimate::{DailyEstimate, SampleSummary, StorageEstimate};
use crate::logic::event::ANY;
use crate::logic::recommend::{ForwardingTotals, PatternRate, RuleReport};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

fn separator() -> String {
    "=".repeat(50)
}

/// Integer with `,` thousands separators; fractions are rounded away
pub fn with_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ============================================================================
// SUMMARY REPORT
// ============================================================================

pub fn render_summary(sample: &SampleSummary, daily: &DailyEstimate, storage: &StorageEstimate) -> String {
    let mut out = String::new();

    // writeln! into a String cannot fail
    let _ = writeln!(out, "Sample Analysis:");
    let _ = writeln!(out, "{}", separator());
    let _ = writeln!(out, "Duration: {:.2} hours", sample.duration_hours);
    let _ = writeln!(out, "Total Events: {}", with_thousands(sample.total_events as f64));
    let _ = writeln!(out, "Forwarded Events: {}", with_thousands(sample.forwarded_events as f64));
    let _ = writeln!(
        out,
        "Filtering Efficiency: {:.1}% reduction\n",
        sample.filtering_efficiency_percent
    );

    let _ = writeln!(out, "Daily Estimates:");
    let _ = writeln!(out, "{}", separator());
    let _ = writeln!(out, "Events per Day: {}", with_thousands(daily.events_per_day));
    let _ = writeln!(out, "Forwarded Events per Day: {}", with_thousands(daily.forwarded_per_day));
    let _ = writeln!(out, "Events per Second (EPS): {:.1}", daily.eps);
    let _ = writeln!(out, "Forwarded EPS: {:.1}", daily.forwarded_eps);
    let _ = writeln!(out, "SIEM Savings: {:.1} EPS reduction\n", daily.savings_eps);

    let _ = writeln!(out, "Storage Estimates:");
    let _ = writeln!(out, "{}", separator());
    let _ = writeln!(out, "Daily Size: {:.2} GB", storage.daily_size_bytes / BYTES_PER_GB);
    let _ = writeln!(out, "Retention Period: {} days", storage.retention_days);
    let _ = writeln!(out, "Total Storage Required: {:.2} GB", storage.total_size_gb);
    out
}

// ============================================================================
// FORWARDING REPORT
// ============================================================================

/// `Traffic from A to B using app on svc (x EPS)`; wildcard parts are left out
pub fn describe_pattern(pattern: &PatternRate) -> String {
    let mut parts = Vec::with_capacity(5);
    if pattern.source != ANY {
        parts.push(format!("from {}", pattern.source));
    }
    if pattern.destination != ANY {
        parts.push(format!("to {}", pattern.destination));
    }
    if pattern.application != ANY {
        parts.push(format!("using {}", pattern.application));
    }
    if pattern.service != ANY {
        parts.push(format!("on {}", pattern.service));
    }
    if pattern.eps > 0.0 {
        parts.push(format!("({:.1} EPS)", pattern.eps));
    }
    format!("Traffic {}", parts.join(" "))
}

pub fn render_rule(report: &RuleReport) -> String {
    let analysis = &report.analysis;
    let mut out = String::new();

    let _ = writeln!(out, "Rule: {} (ID: {})", analysis.rule_name, analysis.rule_id);
    let _ = writeln!(out, "Location: {}", analysis.location);
    if let Some(dg) = &analysis.device_group {
        let _ = writeln!(out, "Device Group: {}", dg);
    }
    if let Some(stage) = analysis.rulebase_stage {
        let _ = writeln!(out, "Rulebase: {}", stage);
    }

    let _ = writeln!(out, "Current EPS: {:.1}", analysis.total_eps);
    let _ = writeln!(out, "Traffic requiring forwarding: {:.1} EPS", analysis.included_eps);
    let _ = writeln!(out, "Traffic eligible for exclusion: {:.1} EPS", analysis.excluded_eps);
    let _ = writeln!(out, "Recommendation: {}", analysis.recommendation);

    let excludable: Vec<&PatternRate> = report.patterns.iter().filter(|p| !p.needs_forwarding).collect();
    if !excludable.is_empty() {
        let _ = writeln!(out, "\nTraffic patterns that can be excluded:");
        for pattern in excludable {
            let _ = writeln!(out, "- {}", describe_pattern(pattern));
        }
    }

    if !report.application_groups.is_empty() {
        let _ = writeln!(out, "\nModel Analysis:");
        let groups: Vec<String> = report.application_groups.iter().map(|g| g.render()).collect();
        let _ = writeln!(out, "{}", groups.join("\n"));
    }

    let _ = write!(out, "\n{}\n\n", separator());
    out
}

/// Fleet headline: current forwarded EPS, savings and reduction share
pub fn render_totals(totals: &ForwardingTotals) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Current Forwarded EPS: {:.1}", totals.current_forwarded_eps);
    let _ = writeln!(out, "Potential EPS Savings: {:.1}", totals.potential_savings_eps);
    match totals.reduction_percent {
        Some(percent) => {
            let _ = writeln!(out, "Potential Reduction: {:.1}% of current forwarded traffic", percent);
        }
        None => {
            let _ = writeln!(out, "Potential Reduction: n/a (no traffic currently forwarded)");
        }
    }
    out
}

pub fn render_forwarding(reports: &[RuleReport]) -> String {
    let mut out = format!("Log Forwarding Analysis Report\n{}\n\n", separator());
    out.push_str(&render_totals(&ForwardingTotals::from_reports(reports)));
    out.push('\n');
    for report in reports {
        out.push_str(&render_rule(report));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::recommend::{ApplicationGroup, RecommendationKind, RuleAnalysis};
    use crate::logic::rulebase::RulebaseStage;

    fn pattern(src: &str, dst: &str, app: &str, svc: &str, eps: f64, fwd: bool) -> PatternRate {
        PatternRate {
            source: src.to_string(),
            destination: dst.to_string(),
            application: app.to_string(),
            service: svc.to_string(),
            eps,
            needs_forwarding: fwd,
        }
    }

    fn report() -> RuleReport {
        RuleReport {
            analysis: RuleAnalysis {
                rule_key: "DG1::R1".to_string(),
                rule_id: "R1".to_string(),
                rule_name: "Allow-Web".to_string(),
                total_eps: 1.0,
                included_eps: 0.2,
                excluded_eps: 0.8,
                excluded_fraction: 0.8,
                forwarding_enabled: true,
                potential_savings_eps: 0.8,
                needs_split: true,
                kind: RecommendationKind::Split,
                recommendation: "Consider splitting rule".to_string(),
                location: "Panorama (DG1 - pre rulebase)".to_string(),
                device_group: Some("DG1".to_string()),
                rulebase_stage: Some(RulebaseStage::Pre),
            },
            patterns: vec![
                pattern("10.0.0.1", "8.8.8.8", "dns", "53", 0.8, false),
                pattern("10.0.0.2", ANY, ANY, ANY, 0.2, true),
            ],
            application_groups: vec![ApplicationGroup {
                application: "dns".to_string(),
                eps: 0.8,
                sources: vec!["10.0.0.1".to_string()],
                destinations: vec!["8.8.8.8".to_string()],
                services: vec!["53".to_string()],
                justification: None,
            }],
        }
    }

    #[test]
    fn test_with_thousands() {
        assert_eq!(with_thousands(0.0), "0");
        assert_eq!(with_thousands(999.0), "999");
        assert_eq!(with_thousands(1000.0), "1,000");
        assert_eq!(with_thousands(1234567.4), "1,234,567");
        assert_eq!(with_thousands(-12345.0), "-12,345");
    }

    #[test]
    fn test_describe_pattern_skips_wildcards() {
        assert_eq!(
            describe_pattern(&pattern("10.0.0.1", ANY, "ssl", ANY, 0.3, false)),
            "Traffic from 10.0.0.1 using ssl (0.3 EPS)"
        );
        assert_eq!(describe_pattern(&pattern(ANY, ANY, ANY, ANY, 0.0, false)), "Traffic ");
    }

    #[test]
    fn test_render_rule() {
        let text = render_rule(&report());
        assert!(text.starts_with("Rule: Allow-Web (ID: R1)\nLocation: Panorama (DG1 - pre rulebase)\n"));
        assert!(text.contains("Device Group: DG1\nRulebase: pre\n"));
        assert!(text.contains("Traffic requiring forwarding: 0.2 EPS\n"));
        assert!(text.contains("Traffic eligible for exclusion: 0.8 EPS\n"));
        assert!(text.contains(
            "\nTraffic patterns that can be excluded:\n- Traffic from 10.0.0.1 to 8.8.8.8 using dns on 53 (0.8 EPS)\n"
        ));
        // Forwarded pattern is not listed
        assert!(!text.contains("10.0.0.2"));
        assert!(text.contains("\nModel Analysis:\n- dns traffic (0.8 EPS)\n  Sources: 10.0.0.1"));
        assert!(text.ends_with(&format!("\n{}\n\n", "=".repeat(50))));
    }

    #[test]
    fn test_render_rule_without_optional_sections() {
        let mut r = report();
        r.analysis.device_group = None;
        r.analysis.rulebase_stage = None;
        r.patterns.retain(|p| p.needs_forwarding);
        r.application_groups.clear();
        let text = render_rule(&r);
        assert!(!text.contains("Device Group"));
        assert!(!text.contains("Rulebase:"));
        assert!(!text.contains("can be excluded"));
        assert!(!text.contains("Model Analysis"));
    }

    #[test]
    fn test_render_summary() {
        let sample = SampleSummary {
            duration_hours: 2.0,
            total_events: 12000,
            forwarded_events: 3000,
            total_bytes: 0,
            filtering_efficiency_percent: 75.0,
        };
        let daily = DailyEstimate {
            scale_factor: 12.0,
            events_per_day: 144000.0,
            forwarded_per_day: 36000.0,
            bytes_per_day: 0.0,
            eps: 1.6666,
            forwarded_eps: 0.41666,
            savings_eps: 1.3,
        };
        let storage = StorageEstimate {
            daily_size_bytes: BYTES_PER_GB * 2.0,
            retention_days: 365,
            total_size_bytes: 0.0,
            total_size_gb: 262.8,
        };
        let text = render_summary(&sample, &daily, &storage);
        assert!(text.starts_with("Sample Analysis:\n=================================================="));
        assert!(text.contains("Duration: 2.00 hours\n"));
        assert!(text.contains("Total Events: 12,000\n"));
        assert!(text.contains("Filtering Efficiency: 75.0% reduction\n\n"));
        assert!(text.contains("Events per Day: 144,000\n"));
        assert!(text.contains("Events per Second (EPS): 1.7\n"));
        assert!(text.contains("Forwarded EPS: 0.4\n"));
        assert!(text.contains("SIEM Savings: 1.3 EPS reduction\n"));
        assert!(text.contains("Daily Size: 2.00 GB\n"));
        assert!(text.contains("Retention Period: 365 days\n"));
        assert!(text.ends_with("Total Storage Required: 262.80 GB\n"));
    }

    #[test]
    fn test_render_forwarding_header() {
        let text = render_forwarding(&[report()]);
        assert!(text.starts_with("Log Forwarding Analysis Report\n==="));
        assert!(text.contains(
            "\n\nCurrent Forwarded EPS: 1.0\nPotential EPS Savings: 0.8\n\
             Potential Reduction: 80.0% of current forwarded traffic\n\nRule: Allow-Web"
        ));
        assert_eq!(text.matches("Rule: ").count(), 1);
    }

    #[test]
    fn test_render_totals_without_forwarded_traffic() {
        let mut r = report();
        r.analysis.forwarding_enabled = false;
        r.analysis.potential_savings_eps = 1.0;
        let text = render_forwarding(&[r]);
        assert!(text.contains("Current Forwarded EPS: 0.0\n"));
        assert!(text.contains("Potential EPS Savings: 1.0\n"));
        assert!(text.contains("Potential Reduction: n/a (no traffic currently forwarded)\n"));

        let empty = render_forwarding(&[]);
        assert!(empty.contains("Potential Reduction: n/a"));
    }
}
