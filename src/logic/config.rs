//! Analyzer Configuration
//!
//! One JSON document with a section per component. Every field has a default,
//! so a partial file (or no file) is valid. Load order:
//! defaults -> JSON file -> `LFA_*` environment variables -> validation.
//!
//! ## Usage
//! ```ignore
//! let config = AnalyzerConfig::load(Some(Path::new("lfa.json")))?;
//! let policy = ForwardingPolicy::new(registry, config.forwarding.clone());
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{default_data_dir, ENV_PREFIX};
use crate::error::ConfigError;
use crate::logic::aggregator::{AggregationConfig, ExclusionBasis};
use crate::logic::estimate::StorageConfig;
use crate::logic::forwarding::ForwardingConfig;
use crate::logic::ingest::InputFormat;
use crate::logic::recommend::RecommendationConfig;

// ============================================================================
// SECTIONS
// ============================================================================

/// Where logs, policy sources and the model come from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// `None` = guess from each file's extension
    pub format: Option<InputFormat>,
    pub inputs: Vec<PathBuf>,
    pub panorama_config: Option<PathBuf>,
    pub local_config: Option<PathBuf>,
    pub rules_json: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Reports are written under `<data_dir>/reports`
    pub data_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

// ============================================================================
// ANALYZER CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub source: SourceConfig,
    pub forwarding: ForwardingConfig,
    pub aggregation: AggregationConfig,
    pub recommendation: RecommendationConfig,
    pub storage: StorageConfig,
    pub paths: PathsConfig,
}

impl AnalyzerConfig {
    /// Defaults, optional file, environment, validation
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        log::debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Override from the process environment. Unparseable values are
    /// ignored with a warning.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = var("FORMAT") {
            match v.parse::<InputFormat>() {
                Ok(format) => self.source.format = Some(format),
                Err(e) => log::warn!("Ignoring {}FORMAT: {}", ENV_PREFIX, e),
            }
        }
        if let Some(v) = var("MODEL") {
            self.source.model_path = Some(PathBuf::from(v));
        }
        if let Some(v) = var("DATA_DIR") {
            self.paths.data_dir = PathBuf::from(v);
        }

        if let Some(v) = parsed(var("CONFIDENCE_THRESHOLD"), "CONFIDENCE_THRESHOLD") {
            self.forwarding.confidence_threshold = v;
        }
        if let Some(v) = var("PRIORITY_LEVELS") {
            self.forwarding.priority_levels = v
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(v) = parsed(var("STRICT_RULE_MATCH"), "STRICT_RULE_MATCH") {
            self.aggregation.strict_rule_match = v;
        }
        if let Some(v) = var("EXCLUSION_BASIS") {
            match v.to_lowercase().as_str() {
                "heuristic" => self.aggregation.exclusion_basis = ExclusionBasis::Heuristic,
                "policy" => self.aggregation.exclusion_basis = ExclusionBasis::Policy,
                other => log::warn!("Ignoring {}EXCLUSION_BASIS: {}", ENV_PREFIX, other),
            }
        }

        if let Some(v) = parsed(var("RETENTION_DAYS"), "RETENTION_DAYS") {
            self.storage.retention_period_days = v;
        }
        if let Some(v) = parsed(var("COMPRESSION_RATIO"), "COMPRESSION_RATIO") {
            self.storage.compression_ratio = v;
        }
        if let Some(v) = parsed(var("STORAGE_BUFFER"), "STORAGE_BUFFER") {
            self.storage.storage_buffer = v;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.forwarding.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid("forwarding.confidence_threshold", threshold));
        }

        let rec = &self.recommendation;
        for (field, value) in [
            ("recommendation.split_threshold", rec.split_threshold),
            ("recommendation.disable_threshold", rec.disable_threshold),
            ("recommendation.grouping_threshold", rec.grouping_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, value));
            }
        }

        if self.storage.retention_period_days == 0 {
            return Err(invalid("storage.retention_period_days", 0));
        }
        if self.storage.compression_ratio <= 0.0 {
            return Err(invalid("storage.compression_ratio", self.storage.compression_ratio));
        }
        if self.storage.storage_buffer <= 0.0 {
            return Err(invalid("storage.storage_buffer", self.storage.storage_buffer));
        }
        Ok(())
    }
}

fn parsed<T: std::str::FromStr>(value: Option<String>, name: &str) -> Option<T> {
    let raw = value?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring {}{}: cannot parse {:?}", ENV_PREFIX, name, raw);
            None
        }
    }
}

fn invalid(field: &'static str, value: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: format!("{} is out of range", value),
    }
}
