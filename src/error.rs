//! Error handling
//!
//! Only malformed inputs (policy sources, model files, config) are errors.
//! Missing event fields and empty aggregates never are.

use std::path::PathBuf;

use thiserror::Error;

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error(transparent)]
    Rulebase(#[from] RulebaseError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

// ============================================================================
// RULEBASE
// ============================================================================

#[derive(Debug, Error)]
pub enum RulebaseError {
    #[error("failed to read policy source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed policy XML at byte {position}: {message}")]
    Xml { position: usize, message: String },

    #[error("malformed rule JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("policy source contains no document element")]
    EmptyDocument,

    #[error("invalid rule record '{name}': {message}")]
    InvalidRecord { name: String, message: String },
}

// ============================================================================
// MODEL
// ============================================================================

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read model: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("model vocabulary hash mismatch: header {expected:08x}, computed {actual:08x}")]
    VocabularyMismatch { expected: u32, actual: u32 },

    #[error("model is inconsistent: {0}")]
    Invalid(String),
}

// ============================================================================
// INGEST
// ============================================================================

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read log data: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read CSV headers: {0}")]
    CsvHeader(#[from] csv::Error),

    #[error("unknown input format: {0}")]
    UnknownFormat(String),
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
