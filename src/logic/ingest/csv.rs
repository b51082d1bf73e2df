//! CSV exports (Panorama / firewall "Export to CSV")
//!
//! The header row names the fields. Empty cells are left out of the event.

use std::io::Read;

use super::{LogReader, RawRecord, ReadResult};
use crate::error::IngestError;
use crate::logic::event::LogEvent;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReader;

impl CsvReader {
    pub fn new() -> Self {
        Self
    }
}

impl LogReader for CsvReader {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn read_from(&self, input: &mut dyn Read) -> Result<ReadResult, IngestError> {
        let mut rdr = ::csv::ReaderBuilder::new().flexible(true).from_reader(input);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut result = ReadResult::default();
        for (idx, row) in rdr.records().enumerate() {
            // +2: header row, 1-based
            let line = idx + 2;
            let record = match row {
                Ok(r) => r,
                Err(e) => {
                    result.skip(line, e);
                    continue;
                }
            };
            if record.len() > headers.len() {
                result.skip(line, format!("{} fields, header has {}", record.len(), headers.len()));
                continue;
            }

            let event: LogEvent = headers
                .iter()
                .zip(record.iter())
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(header, value)| (header.as_str(), value))
                .collect();

            // Field bytes, separators and newline
            let size_bytes = record.iter().map(|v| v.len() as u64).sum::<u64>() + record.len() as u64;

            result.records.push(RawRecord {
                event,
                size_bytes,
                line,
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::event::Field;

    fn read(data: &str) -> ReadResult {
        CsvReader::new().read_from(&mut data.as_bytes()).unwrap()
    }

    #[test]
    fn test_reads_rows_by_header() {
        let result = read(
            "Receive Time,Type,Rule,Application\n\
             2024/01/15 10:00:00,TRAFFIC,Allow-Web,ssl\n\
             2024/01/15 10:00:05,THREAT,Allow-Web,\n",
        );
        assert_eq!(result.records.len(), 2);
        let first = &result.records[0];
        assert_eq!(first.line, 2);
        assert_eq!(first.event.field(Field::RuleName), Some("Allow-Web"));
        assert_eq!(first.size_bytes, 42);

        // Empty cell is absent
        assert_eq!(result.records[1].event.get("Application"), None);
        assert!(result.records[1].event.is_threat());
    }

    #[test]
    fn test_quoted_fields() {
        let result = read("Rule,Source\n\"Allow, Web\",10.0.0.1\n");
        assert_eq!(result.records[0].event.get("Rule"), Some("Allow, Web"));
    }

    #[test]
    fn test_overlong_row_is_skipped() {
        let result = read("Rule,Type\nR1,TRAFFIC\nR2,TRAFFIC,extra\nR3\n");
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.entries_skipped, 1);
        assert!(result.warnings[0].starts_with("Line 3"));
        // Short rows keep the columns they have
        assert_eq!(result.records[1].event.get("Rule"), Some("R3"));
    }

    #[test]
    fn test_empty_input_has_no_rows() {
        let result = read("");
        assert!(result.records.is_empty());
    }
}
