//! Report Module - Text and JSON reports
//!
//! ## Structure
//! - `render`: Summary and forwarding report text
//! - `writer`: `reports/latest` output with archiving of the previous run

pub mod render;
pub mod writer;

pub use render::{describe_pattern, render_forwarding, render_rule, render_summary, render_totals, with_thousands};
pub use writer::{AnalysisExport, ReportWriter, WrittenReports};
