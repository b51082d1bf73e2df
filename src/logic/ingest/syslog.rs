//! BSD syslog lines: `MMM dd HH:MM:SS <message>`
//!
//! The header carries no year, so the reader's year is prefixed. `key=value`
//! tokens in the message become fields of their own.

use std::io::{BufRead, BufReader, Read};

use chrono::{Datelike, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{LogReader, RawRecord, ReadResult};
use crate::error::IngestError;
use crate::logic::event::LogEvent;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(.*)$").expect("static syslog header regex")
});

static KEY_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(\w+)=("[^"]*"|\S+)"#).expect("static key=value regex"));

#[derive(Debug, Clone, Copy)]
pub struct SyslogReader {
    year: i32,
}

impl Default for SyslogReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SyslogReader {
    /// Reader stamping the current year
    pub fn new() -> Self {
        Self {
            year: Utc::now().year(),
        }
    }

    pub fn with_year(year: i32) -> Self {
        Self { year }
    }

    /// Parse one line, `None` if the header does not match
    pub fn parse_line(&self, line: &str) -> Option<LogEvent> {
        let caps = HEADER.captures(line.trim_end())?;
        let stamp = caps.get(1)?.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
        let message = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        let ts = NaiveDateTime::parse_from_str(&format!("{} {}", self.year, stamp), "%Y %b %d %H:%M:%S").ok()?;

        let mut event = LogEvent::new()
            .with("Receive Time", ts.format("%Y/%m/%d %H:%M:%S").to_string())
            .with("Message", message);

        for kv in KEY_VALUE.captures_iter(message) {
            let key = &kv[1];
            let value = kv[2].trim_matches('"');
            event.insert(key, value);
        }
        Some(event)
    }
}

impl LogReader for SyslogReader {
    fn name(&self) -> &'static str {
        "syslog"
    }

    fn read_from(&self, input: &mut dyn Read) -> Result<ReadResult, IngestError> {
        let mut result = ReadResult::default();
        for (idx, line) in BufReader::new(input).lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match self.parse_line(&line) {
                Some(event) => result.records.push(RawRecord {
                    event,
                    size_bytes: line.len() as u64 + 1,
                    line: line_no,
                }),
                None => result.skip(line_no, "no syslog header"),
            }
        }
        Ok(result)
    }
}
