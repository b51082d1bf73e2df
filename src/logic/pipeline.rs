//! Analysis Pipeline
//!
//! Wires the components for one run: policy sources and model from the
//! config, then each input file is read, decided in one batch, and folded
//! into the volume estimator and the pattern aggregator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AnalyzerResult, IngestError};
use crate::logic::aggregator::PatternAggregator;
use crate::logic::classifier::TokenModel;
use crate::logic::config::AnalyzerConfig;
use crate::logic::estimate::{DailyEstimate, SampleSummary, StorageEstimate, VolumeEstimator};
use crate::logic::event::LogEvent;
use crate::logic::forwarding::ForwardingPolicy;
use crate::logic::ingest::{collect_inputs, reader_for, InputFormat, RawRecord};
use crate::logic::recommend::{ForwardingTotals, RecommendationEngine, RuleReport};
use crate::logic::rulebase::RuleRegistry;

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub summary: SampleSummary,
    pub daily: DailyEstimate,
    pub storage: StorageEstimate,
    pub reports: Vec<RuleReport>,
    pub totals: ForwardingTotals,
    pub files_read: usize,
    /// Malformed rows dropped by the readers
    pub entries_skipped: u64,
    /// Events the aggregator could not attribute to a rule
    pub events_unattributed: u64,
}

pub struct Analyzer {
    config: AnalyzerConfig,
    registry: Arc<RuleRegistry>,
    policy: Arc<ForwardingPolicy>,
}

impl Analyzer {
    /// Load policy sources and the optional model named in `config.source`
    pub fn from_config(config: AnalyzerConfig) -> AnalyzerResult<Self> {
        let mut registry = RuleRegistry::new();
        registry.load(
            config.source.panorama_config.as_deref(),
            config.source.local_config.as_deref(),
        )?;
        if let Some(path) = &config.source.rules_json {
            registry.load_json(path)?;
        }
        if registry.is_empty() {
            log::warn!("No policy rules loaded; forwarding state falls back to log fields");
        }
        let registry = Arc::new(registry);

        let mut policy = ForwardingPolicy::new(registry.clone(), config.forwarding.clone());
        if let Some(path) = &config.source.model_path {
            let model = TokenModel::load(path)?;
            log::info!("Classifier loaded from {}", path.display());
            policy = policy.with_classifier(Arc::new(model));
        }

        Ok(Self::with_parts(config, registry, Arc::new(policy)))
    }

    pub fn with_parts(config: AnalyzerConfig, registry: Arc<RuleRegistry>, policy: Arc<ForwardingPolicy>) -> Self {
        Self {
            config,
            registry,
            policy,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &ForwardingPolicy {
        &self.policy
    }

    fn new_aggregator(&self) -> PatternAggregator {
        PatternAggregator::new(self.registry.clone())
            .with_config(self.config.aggregation.clone())
            .with_policy(self.policy.clone())
    }

    /// Expand directories and resolve each file's format
    pub fn resolve_inputs(&self, inputs: &[PathBuf]) -> Result<Vec<(PathBuf, InputFormat)>, IngestError> {
        let mut files = Vec::new();
        for input in inputs {
            match self.config.source.format {
                Some(format) => {
                    files.extend(collect_inputs(input, format)?.into_iter().map(|p| (p, format)));
                }
                None => {
                    let format = InputFormat::from_path(input)
                        .ok_or_else(|| IngestError::UnknownFormat(input.display().to_string()))?;
                    files.push((input.clone(), format));
                }
            }
        }
        Ok(files)
    }

    /// Read, decide and aggregate every input, then project and recommend
    pub fn run(&self, inputs: &[PathBuf]) -> AnalyzerResult<AnalysisOutcome> {
        let files = self.resolve_inputs(inputs)?;
        let mut aggregator = self.new_aggregator();
        let mut estimator = VolumeEstimator::new();
        let mut entries_skipped = 0;

        for (path, format) in &files {
            let result = reader_for(*format).read_path(path)?;
            entries_skipped += result.entries_skipped;
            self.fold(&result.records, &mut aggregator, &mut estimator);
        }

        Ok(self.finish(files.len(), entries_skipped, &aggregator, &estimator))
    }

    /// Same as `run` for records already in memory
    pub fn run_records(&self, records: &[RawRecord]) -> AnalysisOutcome {
        let mut aggregator = self.new_aggregator();
        let mut estimator = VolumeEstimator::new();
        self.fold(records, &mut aggregator, &mut estimator);
        self.finish(0, 0, &aggregator, &estimator)
    }

    fn fold(&self, records: &[RawRecord], aggregator: &mut PatternAggregator, estimator: &mut VolumeEstimator) {
        let events: Vec<LogEvent> = records.iter().map(|r| r.event.clone()).collect();
        let decisions = self.policy.decide_batch(&events);
        for ((record, event), decision) in records.iter().zip(&events).zip(&decisions) {
            estimator.record(event, record.size_bytes, decision);
            aggregator.ingest_decided(event, decision);
        }
    }

    fn finish(
        &self,
        files_read: usize,
        entries_skipped: u64,
        aggregator: &PatternAggregator,
        estimator: &VolumeEstimator,
    ) -> AnalysisOutcome {
        let engine = RecommendationEngine::with_config(self.config.recommendation.clone());
        let reports = engine.reports(aggregator);
        let totals = ForwardingTotals::from_reports(&reports);
        log::info!(
            "Analyzed {} events across {} rules ({} unattributed)",
            aggregator.ingested_count(),
            aggregator.aggregates().len(),
            aggregator.skipped_count()
        );

        AnalysisOutcome {
            summary: estimator.summary(),
            daily: estimator.daily(),
            storage: estimator.storage(&self.config.storage),
            reports,
            totals,
            files_read,
            entries_skipped,
            events_unattributed: aggregator.skipped_count(),
        }
    }
}

/// Convenience for callers holding a single path
pub fn analyze_path(config: AnalyzerConfig, path: &Path) -> AnalyzerResult<AnalysisOutcome> {
    Analyzer::from_config(config)?.run(&[path.to_path_buf()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::aggregator::ExclusionBasis;
    use crate::logic::classifier::{ForwardClassifier, Prediction};
    use crate::logic::recommend::RecommendationKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Counts how many events it was asked to score
    struct CountingClassifier {
        scored: AtomicUsize,
    }

    impl ForwardClassifier for CountingClassifier {
        fn name(&self) -> &str {
            "counting"
        }

        fn predict(&self, events: &[LogEvent]) -> Vec<Prediction> {
            self.scored.fetch_add(events.len(), Ordering::SeqCst);
            events.iter().map(|_| Prediction::binary(0.1)).collect()
        }
    }

    const RULES: &str = r#"[
        {"name": "Allow-Web", "scope": "shared", "rulebase_stage": "pre", "forwarding_enabled": true},
        {"name": "Quiet", "scope": "local", "rulebase_stage": "local", "forwarding_enabled": false}
    ]"#;

    /// 10 Allow-Web rows over 100 s: 8 low-severity dns, 2 THREAT
    fn csv_sample() -> String {
        let mut csv = String::from("Receive Time,Type,Rule,Source,Destination,Application,Service,Severity\n");
        for i in 0..10 {
            let secs = i * 100 / 9;
            let ts = format!("2024/01/15 10:{:02}:{:02}", secs / 60, secs % 60);
            if i < 8 {
                csv.push_str(&format!("{},TRAFFIC,Allow-Web,10.0.0.1,8.8.8.8,dns,53,low\n", ts));
            } else {
                csv.push_str(&format!("{},THREAT,Allow-Web,10.0.0.9,1.2.3.4,ssl,443,high\n", ts));
            }
        }
        csv.push_str("2024/01/15 10:00:50,TRAFFIC,,10.0.0.1,8.8.8.8,dns,53,low\n");
        csv
    }

    fn config(dir: &Path) -> AnalyzerConfig {
        let rules = dir.join("rules.json");
        std::fs::write(&rules, RULES).unwrap();
        let mut config = AnalyzerConfig::default();
        config.source.rules_json = Some(rules);
        config.paths.data_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn test_run_over_csv() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("traffic.csv");
        std::fs::write(&input, csv_sample()).unwrap();

        let analyzer = Analyzer::from_config(config(dir.path())).unwrap();
        assert_eq!(analyzer.registry().len(), 2);
        assert!(!analyzer.policy().has_classifier());

        let outcome = analyzer.run(&[input]).unwrap();
        assert_eq!(outcome.files_read, 1);
        assert_eq!(outcome.summary.total_events, 11);
        assert_eq!(outcome.events_unattributed, 1);

        assert_eq!(outcome.reports.len(), 1);
        let analysis = &outcome.reports[0].analysis;
        assert_eq!(analysis.rule_name, "Allow-Web");
        assert_eq!(analysis.location, "Panorama (Shared - pre rulebase)");
        assert_eq!(analysis.kind, RecommendationKind::Split);
        assert!((analysis.excluded_fraction - 0.8).abs() < 1e-9);
        assert!((analysis.total_eps - 0.1).abs() < 1e-9);

        assert!((outcome.totals.current_forwarded_eps - 0.1).abs() < 1e-9);
        assert!((outcome.totals.potential_savings_eps - analysis.potential_savings_eps).abs() < 1e-12);
        assert!(outcome.totals.reduction_percent.is_some());
    }

    #[test]
    fn test_policy_basis_scores_each_event_once() {
        let registry = Arc::new(RuleRegistry::new());
        let classifier = Arc::new(CountingClassifier {
            scored: AtomicUsize::new(0),
        });
        let mut config = AnalyzerConfig::default();
        config.aggregation.exclusion_basis = ExclusionBasis::Policy;
        let policy = ForwardingPolicy::new(registry.clone(), config.forwarding.clone())
            .with_classifier(classifier.clone());
        let analyzer = Analyzer::with_parts(config, registry, Arc::new(policy));

        let records: Vec<RawRecord> = (0..3)
            .map(|i| RawRecord {
                event: LogEvent::new()
                    .with("Rule", "Unlisted")
                    .with("Type", "TRAFFIC")
                    .with("Receive Time", format!("2024/01/15 10:00:0{}", i * 4)),
                size_bytes: 100,
                line: i + 1,
            })
            .collect();
        let outcome = analyzer.run_records(&records);

        assert_eq!(classifier.scored.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.summary.total_events, 3);
        assert_eq!(outcome.summary.forwarded_events, 0);
        let analysis = &outcome.reports[0].analysis;
        assert!((analysis.excluded_fraction - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_extension_needs_format() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("traffic.dat");
        std::fs::write(&input, csv_sample()).unwrap();

        let mut cfg = config(dir.path());
        let analyzer = Analyzer::from_config(cfg.clone()).unwrap();
        assert!(matches!(
            analyzer.resolve_inputs(&[input.clone()]),
            Err(IngestError::UnknownFormat(_))
        ));

        cfg.source.format = Some(InputFormat::Csv);
        let analyzer = Analyzer::from_config(cfg).unwrap();
        assert_eq!(analyzer.run(&[input]).unwrap().summary.total_events, 11);
    }

    #[test]
    fn test_missing_rules_source_is_error() {
        let dir = tempdir().unwrap();
        let mut cfg = AnalyzerConfig::default();
        cfg.source.rules_json = Some(dir.path().join("missing.json"));
        assert!(Analyzer::from_config(cfg).is_err());
    }

    #[test]
    fn test_run_records_without_window_has_no_reports() {
        let dir = tempdir().unwrap();
        let analyzer = Analyzer::from_config(config(dir.path())).unwrap();
        let records = vec![RawRecord {
            event: LogEvent::new().with("Rule", "Allow-Web"),
            size_bytes: 10,
            line: 1,
        }];
        let outcome = analyzer.run_records(&records);
        assert_eq!(outcome.summary.total_events, 1);
        assert!(outcome.reports.is_empty());
        assert_eq!(outcome.daily.eps, 0.0);
    }
}
