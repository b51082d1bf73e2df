//! Report files under `<data_dir>/reports`
//!
//! The current run lives in `reports/latest`. Before a run is written, the
//! previous run's `.txt` reports move to `reports/archive_<YYYYmmdd_HHMMSS>`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::render::{render_forwarding, render_summary};
use crate::error::ReportError;
use crate::logic::estimate::{DailyEstimate, SampleSummary, StorageEstimate};
use crate::logic::recommend::{ForwardingTotals, RuleAnalysis, RuleReport};

pub const SUMMARY_FILE: &str = "summary_report.txt";
pub const FORWARDING_FILE: &str = "forwarding_report.txt";
pub const ANALYSIS_FILE: &str = "analysis.json";

/// Machine-readable copy of one run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisExport<'a> {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub sample: &'a SampleSummary,
    pub daily: &'a DailyEstimate,
    pub storage: &'a StorageEstimate,
    pub totals: ForwardingTotals,
    pub rules: Vec<&'a RuleAnalysis>,
}

/// Paths written by one run
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenReports {
    pub run_id: String,
    pub summary: PathBuf,
    pub forwarding: PathBuf,
    pub analysis: PathBuf,
    pub archived_to: Option<PathBuf>,
}

pub struct ReportWriter {
    reports_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            reports_dir: data_dir.join("reports"),
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn latest_dir(&self) -> PathBuf {
        self.reports_dir.join("latest")
    }

    /// Move `.txt` files out of `latest`. Returns the archive directory, or
    /// `None` when there was nothing to move.
    pub fn archive_previous(&self) -> Result<Option<PathBuf>, ReportError> {
        let latest = self.latest_dir();
        if !latest.is_dir() {
            return Ok(None);
        }

        let mut previous = Vec::new();
        for entry in fs::read_dir(&latest)? {
            let path = entry?.path();
            if path.is_file() && path.extension().map(|e| e == "txt").unwrap_or(false) {
                previous.push(path);
            }
        }
        if previous.is_empty() {
            return Ok(None);
        }

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let archive_dir = self.reports_dir.join(format!("archive_{}", stamp));
        fs::create_dir_all(&archive_dir)?;
        for path in previous {
            if let Some(name) = path.file_name() {
                fs::rename(&path, archive_dir.join(name))?;
            }
        }
        log::info!("Archived previous reports to {}", archive_dir.display());
        Ok(Some(archive_dir))
    }

    /// Archive the last run, then write summary, forwarding and JSON reports
    pub fn write(
        &self,
        sample: &SampleSummary,
        daily: &DailyEstimate,
        storage: &StorageEstimate,
        reports: &[RuleReport],
    ) -> Result<WrittenReports, ReportError> {
        let archived_to = self.archive_previous()?;

        let latest = self.latest_dir();
        fs::create_dir_all(&latest)?;

        let summary = latest.join(SUMMARY_FILE);
        fs::write(&summary, render_summary(sample, daily, storage))?;

        let forwarding = latest.join(FORWARDING_FILE);
        fs::write(&forwarding, render_forwarding(reports))?;

        let run_id = Uuid::new_v4().to_string();
        let export = AnalysisExport {
            run_id: run_id.clone(),
            generated_at: Utc::now(),
            sample,
            daily,
            storage,
            totals: ForwardingTotals::from_reports(reports),
            rules: reports.iter().map(|r| &r.analysis).collect(),
        };
        let analysis = latest.join(ANALYSIS_FILE);
        fs::write(&analysis, serde_json::to_vec_pretty(&export)?)?;

        log::info!("Reports written to {} (run {})", latest.display(), run_id);
        Ok(WrittenReports {
            run_id,
            summary,
            forwarding,
            analysis,
            archived_to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::estimate::{StorageConfig, VolumeEstimator};
    use tempfile::tempdir;

    fn write_empty(writer: &ReportWriter) -> WrittenReports {
        let estimator = VolumeEstimator::new();
        writer
            .write(
                &estimator.summary(),
                &estimator.daily(),
                &estimator.storage(&StorageConfig::default()),
                &[],
            )
            .unwrap()
    }

    #[test]
    fn test_first_run_writes_latest() {
        let dir = tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        let written = write_empty(&writer);

        assert_eq!(written.summary, dir.path().join("reports/latest/summary_report.txt"));
        assert!(written.archived_to.is_none());
        let summary = fs::read_to_string(&written.summary).unwrap();
        assert!(summary.starts_with("Sample Analysis:"));
        let forwarding = fs::read_to_string(&written.forwarding).unwrap();
        assert!(forwarding.starts_with("Log Forwarding Analysis Report"));

        let json: serde_json::Value = serde_json::from_slice(&fs::read(&written.analysis).unwrap()).unwrap();
        assert_eq!(json["run_id"], written.run_id.as_str());
        assert!(json["rules"].as_array().unwrap().is_empty());
        assert_eq!(json["totals"]["current_forwarded_eps"], 0.0);
        assert!(json["totals"]["reduction_percent"].is_null());
    }

    #[test]
    fn test_second_run_archives_text_reports() {
        let dir = tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        let first = write_empty(&writer);
        let second = write_empty(&writer);

        assert_ne!(first.run_id, second.run_id);
        let archive = second.archived_to.unwrap();
        assert!(archive
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("archive_"));
        assert!(archive.join(SUMMARY_FILE).is_file());
        assert!(archive.join(FORWARDING_FILE).is_file());
        // JSON stays in latest and is replaced
        assert!(!archive.join(ANALYSIS_FILE).exists());
        assert!(writer.latest_dir().join(SUMMARY_FILE).is_file());
    }

    #[test]
    fn test_archive_without_latest_is_noop() {
        let dir = tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        assert!(writer.archive_previous().unwrap().is_none());
        fs::create_dir_all(writer.latest_dir()).unwrap();
        fs::write(writer.latest_dir().join("notes.md"), "x").unwrap();
        assert!(writer.archive_previous().unwrap().is_none());
    }
}
