//! Ingest Module - Log export readers
//!
//! Turns exported log files into `LogEvent`s. Readers are lenient: a bad row
//! is counted and reported as a warning, never fatal. Only an unreadable
//! file (or a CSV without a header row) is an error.
//!
//! ## Structure
//! - `csv`: Header-row CSV exports
//! - `jsonl`: One JSON object per line (or a single JSON array)
//! - `syslog`: `MMM dd HH:MM:SS message` lines

pub mod csv;
pub mod jsonl;
pub mod syslog;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_LOGGED_WARNINGS;
use crate::error::IngestError;
use crate::logic::event::LogEvent;

pub use self::csv::CsvReader;
pub use self::jsonl::JsonLinesReader;
pub use self::syslog::SyslogReader;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Csv,
    Json,
    Syslog,
}

impl InputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Json => "json",
            InputFormat::Syslog => "syslog",
        }
    }

    /// Guess from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "csv" => Some(InputFormat::Csv),
            "json" | "jsonl" | "ndjson" => Some(InputFormat::Json),
            "log" | "syslog" => Some(InputFormat::Syslog),
            _ => None,
        }
    }
}

impl FromStr for InputFormat {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(InputFormat::Csv),
            "json" | "jsonl" => Ok(InputFormat::Json),
            "syslog" => Ok(InputFormat::Syslog),
            other => Err(IngestError::UnknownFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One parsed log line/row with its raw size
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub event: LogEvent,
    pub size_bytes: u64,
    /// 1-based line (or row) in the source
    pub line: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ReadResult {
    pub records: Vec<RawRecord>,
    pub warnings: Vec<String>,
    pub entries_skipped: u64,
}

impl ReadResult {
    fn skip(&mut self, line: usize, reason: impl std::fmt::Display) {
        self.entries_skipped += 1;
        self.warnings.push(format!("Line {}: {}", line, reason));
    }

    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }
}

// ============================================================================
// READER TRAIT
// ============================================================================

pub trait LogReader {
    fn name(&self) -> &'static str;
    fn read_from(&self, input: &mut dyn std::io::Read) -> Result<ReadResult, IngestError>;

    fn read_path(&self, path: &Path) -> Result<ReadResult, IngestError> {
        let mut file = File::open(path).map_err(|source| IngestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let result = self.read_from(&mut file)?;

        log::info!(
            "Read {} events from {} ({} skipped)",
            result.records.len(),
            path.display(),
            result.entries_skipped
        );
        for warning in result.warnings.iter().take(MAX_LOGGED_WARNINGS) {
            log::warn!("{}: {}", path.display(), warning);
        }
        if result.warnings.len() > MAX_LOGGED_WARNINGS {
            log::warn!("{}: {} more warnings", path.display(), result.warnings.len() - MAX_LOGGED_WARNINGS);
        }
        Ok(result)
    }
}

pub fn reader_for(format: InputFormat) -> Box<dyn LogReader> {
    match format {
        InputFormat::Csv => Box::new(CsvReader::new()),
        InputFormat::Json => Box::new(JsonLinesReader::new()),
        InputFormat::Syslog => Box::new(SyslogReader::new()),
    }
}

/// Expand an input path: a file is returned as is, a directory yields its
/// files matching `format`, sorted by name
pub fn collect_inputs(path: &Path, format: InputFormat) -> Result<Vec<PathBuf>, IngestError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = std::fs::read_dir(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let file = entry?.path();
        if file.is_file() && InputFormat::from_path(&file) == Some(format) {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<InputFormat>().unwrap(), InputFormat::Csv);
        assert_eq!("jsonl".parse::<InputFormat>().unwrap(), InputFormat::Json);
        assert!(matches!(
            "parquet".parse::<InputFormat>(),
            Err(IngestError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a/traffic.CSV")), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_path(Path::new("x.ndjson")), Some(InputFormat::Json));
        assert_eq!(InputFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_collect_inputs_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["b.csv", "a.csv", "notes.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        let files = collect_inputs(dir.path(), InputFormat::Csv).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);

        let single = dir.path().join("notes.txt");
        assert_eq!(collect_inputs(&single, InputFormat::Csv).unwrap(), vec![single]);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let dir = tempdir().unwrap();
        let err = reader_for(InputFormat::Csv).read_path(&dir.path().join("missing.csv"));
        assert!(matches!(err, Err(IngestError::Open { .. })));
    }
}
