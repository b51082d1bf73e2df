//! Volume Estimator
//!
//! Whole-sample counters (all events, forwarded events, bytes) projected to a
//! day and to the retention period. The daily projection scales linearly by
//! `24 / sample_hours`, assuming a uniform rate over the day.

use serde::{Deserialize, Serialize};

use crate::logic::aggregator::AnalysisWindow;
use crate::logic::event::LogEvent;
use crate::logic::forwarding::ForwardDecision;

const HOURS_PER_DAY: f64 = 24.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

// ============================================================================
// STORAGE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub retention_period_days: u32,
    /// Expected on-disk size relative to raw size
    pub compression_ratio: f64,
    /// Headroom multiplier
    pub storage_buffer: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            retention_period_days: 365,
            compression_ratio: 0.3,
            storage_buffer: 1.2,
        }
    }
}

// ============================================================================
// ESTIMATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub duration_hours: f64,
    pub total_events: u64,
    pub forwarded_events: u64,
    pub total_bytes: u64,
    /// Share of events that would not be forwarded, in percent
    pub filtering_efficiency_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEstimate {
    pub scale_factor: f64,
    pub events_per_day: f64,
    pub forwarded_per_day: f64,
    pub bytes_per_day: f64,
    pub eps: f64,
    pub forwarded_eps: f64,
    pub savings_eps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEstimate {
    pub daily_size_bytes: f64,
    pub retention_days: u32,
    pub total_size_bytes: f64,
    pub total_size_gb: f64,
}

// ============================================================================
// VOLUME ESTIMATOR
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeEstimator {
    total_events: u64,
    forwarded_events: u64,
    total_bytes: u64,
    window: AnalysisWindow,
}

impl VolumeEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one event with its raw size and forwarding decision
    pub fn record(&mut self, event: &LogEvent, size_bytes: u64, decision: &ForwardDecision) {
        self.total_events += 1;
        self.total_bytes += size_bytes;
        if decision.must_forward {
            self.forwarded_events += 1;
        }
        if let Some(ts) = event.timestamp() {
            self.window.observe(ts);
        }
    }

    pub fn merge(&mut self, other: &VolumeEstimator) {
        self.total_events += other.total_events;
        self.forwarded_events += other.forwarded_events;
        self.total_bytes += other.total_bytes;
        self.window.merge(&other.window);
    }

    pub fn window(&self) -> &AnalysisWindow {
        &self.window
    }

    pub fn duration_hours(&self) -> f64 {
        self.window.positive_duration().map(|s| s / 3600.0).unwrap_or(0.0)
    }

    /// Events per second over the sample, 0 without a window
    pub fn eps(&self) -> f64 {
        self.per_second(self.total_events)
    }

    pub fn forwarded_eps(&self) -> f64 {
        self.per_second(self.forwarded_events)
    }

    fn per_second(&self, count: u64) -> f64 {
        match self.window.positive_duration() {
            Some(seconds) => count as f64 / seconds,
            None => 0.0,
        }
    }

    pub fn summary(&self) -> SampleSummary {
        let filtering_efficiency_percent = if self.total_events > 0 {
            (self.total_events - self.forwarded_events) as f64 / self.total_events as f64 * 100.0
        } else {
            0.0
        };
        SampleSummary {
            duration_hours: self.duration_hours(),
            total_events: self.total_events,
            forwarded_events: self.forwarded_events,
            total_bytes: self.total_bytes,
            filtering_efficiency_percent,
        }
    }

    /// Linear 24-hour projection; all zeros without a positive window
    pub fn daily(&self) -> DailyEstimate {
        let hours = self.duration_hours();
        let scale_factor = if hours > 0.0 { HOURS_PER_DAY / hours } else { 0.0 };
        let eps = self.eps();
        let forwarded_eps = self.forwarded_eps();
        DailyEstimate {
            scale_factor,
            events_per_day: self.total_events as f64 * scale_factor,
            forwarded_per_day: self.forwarded_events as f64 * scale_factor,
            bytes_per_day: self.total_bytes as f64 * scale_factor,
            eps,
            forwarded_eps,
            savings_eps: eps - forwarded_eps,
        }
    }

    /// Daily bytes x retention x compression x buffer
    pub fn storage(&self, config: &StorageConfig) -> StorageEstimate {
        let daily_size_bytes = self.daily().bytes_per_day;
        let total_size_bytes = daily_size_bytes
            * config.retention_period_days as f64
            * config.compression_ratio
            * config.storage_buffer;
        StorageEstimate {
            daily_size_bytes,
            retention_days: config.retention_period_days,
            total_size_bytes,
            total_size_gb: total_size_bytes / BYTES_PER_GB,
        }
    }
}
