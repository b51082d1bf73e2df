//! Rulebase Module
//!
//! Security policy rules from Panorama (shared + device groups) and local
//! firewall configurations, keyed for lookup from log entries.
//!
//! ## Structure
//! - `types`: RuleRecord, RuleScope, RulebaseStage, RuleSource
//! - `loader`: Streaming XML parser for both policy layouts
//! - `registry`: Accumulating lookup table
//!
//! ## Usage
//! ```ignore
//! let mut registry = RuleRegistry::new();
//! registry.load(Some(panorama_xml), Some(firewall_xml))?;
//! let rule = registry.resolve("Allow-Web", &["DG1"]);
//! ```

pub mod types;
pub mod loader;
pub mod registry;


pub use types::{rule_key, RuleRecord, RuleScope, RuleSource, RulebaseStage};
pub use loader::{parse_flat, parse_hierarchical, PolicyFormat};
pub use registry::{LoadSummary, RuleRegistry};
