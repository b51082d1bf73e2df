//! Event Module
//!
//! A log event is a flat mapping of column name to printable value. No schema
//! is enforced; semantic fields are located through the alias table.
//!
//! ## Structure
//! - `fields`: Semantic fields and their ordered aliases
//! - `timestamp`: Timestamp parsing for the formats seen in exports

pub mod fields;
pub mod timestamp;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use fields::{parse_flag, Field, ANY, DG_LEVELS};
pub use timestamp::parse_timestamp;

// ============================================================================
// LOG EVENT
// ============================================================================

/// One log record. Keys are kept sorted so iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEvent {
    fields: BTreeMap<String, String>,
}

impl LogEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Raw lookup. Empty or whitespace-only values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First present alias of a semantic field
    pub fn field(&self, field: Field) -> Option<&str> {
        field.aliases().iter().find_map(|alias| self.get(alias))
    }

    /// Pattern component, wildcard when absent
    pub fn field_or_any(&self, field: Field) -> &str {
        self.field(field).unwrap_or(ANY)
    }

    /// Device-group hierarchy, outermost level first (empty strings for gaps)
    pub fn dg_hierarchy(&self) -> [&str; 4] {
        DG_LEVELS.map(|level| self.field(level).unwrap_or(""))
    }

    /// True if the event type is THREAT (case-insensitive)
    pub fn is_threat(&self) -> bool {
        self.field(Field::EventType)
            .map(|t| t.eq_ignore_ascii_case("THREAT"))
            .unwrap_or(false)
    }

    /// First timestamp alias whose value parses
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Field::Timestamp
            .aliases()
            .iter()
            .filter_map(|alias| self.get(alias))
            .find_map(parse_timestamp)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LogEvent {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut event = LogEvent::new();
        for (k, v) in iter {
            event.insert(k, v);
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_alias_wins() {
        let event = LogEvent::new()
            .with("LogType", "TRAFFIC")
            .with("Type", "THREAT");
        assert_eq!(event.field(Field::EventType), Some("THREAT"));
        assert!(event.is_threat());
    }

    #[test]
    fn test_empty_value_is_absent() {
        let event = LogEvent::new()
            .with("Type", "  ")
            .with("LogType", "threat");
        assert_eq!(event.field(Field::EventType), Some("threat"));
        assert!(event.is_threat());
    }

    #[test]
    fn test_pattern_fields_default_to_any() {
        let event = LogEvent::new().with("Source", "10.0.0.1");
        assert_eq!(event.field_or_any(Field::Source), "10.0.0.1");
        assert_eq!(event.field_or_any(Field::Service), ANY);
    }

    #[test]
    fn test_dg_hierarchy_keeps_gaps() {
        let event = LogEvent::new()
            .with("DG Hierarchy Level 1", "Global")
            .with("DG Hierarchy Level 3", "Branch");
        assert_eq!(event.dg_hierarchy(), ["Global", "", "Branch", ""]);
    }

    #[test]
    fn test_timestamp_skips_unparseable_alias() {
        let event = LogEvent::new()
            .with("Receive Time", "garbage")
            .with("Time", "2024/01/15 10:00:00");
        assert!(event.timestamp().is_some());
    }
}
