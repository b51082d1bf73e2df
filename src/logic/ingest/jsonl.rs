//! JSON exports: one object per line, or a single top-level array
//!
//! Scalars are stringified; nulls, nested objects and arrays are dropped.

use std::io::{BufRead, BufReader, Read};

use serde_json::Value;

use super::{LogReader, RawRecord, ReadResult};
use crate::error::IngestError;
use crate::logic::event::LogEvent;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesReader;

impl JsonLinesReader {
    pub fn new() -> Self {
        Self
    }
}

/// Flatten a JSON object into an event. `None` for non-objects.
pub fn event_from_value(value: &Value) -> Option<LogEvent> {
    let obj = value.as_object()?;
    let event = obj
        .iter()
        .filter_map(|(key, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => return None,
            };
            Some((key.as_str(), text))
        })
        .collect();
    Some(event)
}

impl LogReader for JsonLinesReader {
    fn name(&self) -> &'static str {
        "json"
    }

    fn read_from(&self, input: &mut dyn Read) -> Result<ReadResult, IngestError> {
        let mut content = String::new();
        BufReader::new(input).read_to_string(&mut content)?;

        let mut result = ReadResult::default();

        if content.trim_start().starts_with('[') {
            match serde_json::from_str::<Vec<Value>>(&content) {
                Ok(values) => {
                    for (idx, value) in values.iter().enumerate() {
                        push_value(&mut result, value, idx + 1, value.to_string().len() as u64);
                    }
                }
                Err(e) => result.skip(1, format!("invalid JSON array: {}", e)),
            }
            return Ok(result);
        }

        for (idx, line) in content.as_bytes().lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line) {
                Ok(value) => push_value(&mut result, &value, line_no, line.len() as u64 + 1),
                Err(e) => result.skip(line_no, e),
            }
        }
        Ok(result)
    }
}

fn push_value(result: &mut ReadResult, value: &Value, line: usize, size_bytes: u64) {
    match event_from_value(value) {
        Some(event) => result.records.push(RawRecord {
            event,
            size_bytes,
            line,
        }),
        None => result.skip(line, "not a JSON object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(data: &str) -> ReadResult {
        JsonLinesReader::new().read_from(&mut data.as_bytes()).unwrap()
    }

    #[test]
    fn test_scalars_are_stringified() {
        let result = read(
            r#"{"Rule": "Allow-Web", "Severity": 4, "SendToSiem": false, "Tags": ["a"], "Extra": null}"#,
        );
        let event = &result.records[0].event;
        assert_eq!(event.get("Rule"), Some("Allow-Web"));
        assert_eq!(event.get("Severity"), Some("4"));
        assert_eq!(event.get("SendToSiem"), Some("false"));
        assert_eq!(event.get("Tags"), None);
        assert_eq!(event.len(), 3);
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let result = read("{\"Rule\": \"R1\"}\n\nnot json\n[1, 2]\n{\"Rule\": \"R2\"}\n");
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.entries_skipped, 2);
        assert_eq!(result.records[1].line, 5);
        assert!(result.warnings[0].starts_with("Line 3"));
        assert_eq!(result.records[0].size_bytes, 15);
    }

    #[test]
    fn test_top_level_array() {
        let result = read(r#"[{"Rule": "R1"}, 7, {"Rule": "R2"}]"#);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.entries_skipped, 1);
        assert_eq!(result.records[1].line, 3);
    }
}
