//! Rule Registry
//!
//! Uniform lookup over every loaded policy source. Owned by the caller and
//! shared read-only (behind `Arc`) once loading is done.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use super::loader::{parse_rules, PolicyFormat};
use super::types::{rule_key, RuleRecord, RuleScope, RuleSource};
use crate::error::RulebaseError;
use crate::logic::event::{Field, LogEvent};

/// Rules added by one load call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub added: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    /// Load order is preserved
    rules: Vec<RuleRecord>,
    index: HashMap<String, usize>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Load zero, one or both policy sources. Sources accumulate.
    ///
    /// The hierarchical source is loaded first; its failure is returned
    /// before the flat source is touched.
    pub fn load(
        &mut self,
        hierarchical: Option<&Path>,
        flat: Option<&Path>,
    ) -> Result<LoadSummary, RulebaseError> {
        let mut total = LoadSummary::default();
        if let Some(path) = hierarchical {
            let summary = self.load_hierarchical(path)?;
            total.added += summary.added;
            total.duplicates += summary.duplicates;
        }
        if let Some(path) = flat {
            let summary = self.load_flat(path)?;
            total.added += summary.added;
            total.duplicates += summary.duplicates;
        }
        Ok(total)
    }

    pub fn load_hierarchical(&mut self, path: &Path) -> Result<LoadSummary, RulebaseError> {
        let xml = read_source(path)?;
        let summary = self.load_xml_str(&xml, PolicyFormat::Hierarchical)?;
        log::info!(
            "Loaded {} hierarchical rules from {} ({} duplicates skipped)",
            summary.added,
            path.display(),
            summary.duplicates
        );
        Ok(summary)
    }

    pub fn load_flat(&mut self, path: &Path) -> Result<LoadSummary, RulebaseError> {
        let xml = read_source(path)?;
        let summary = self.load_xml_str(&xml, PolicyFormat::Flat)?;
        log::info!(
            "Loaded {} local rules from {} ({} duplicates skipped)",
            summary.added,
            path.display(),
            summary.duplicates
        );
        Ok(summary)
    }

    /// Parse a policy document held in memory. Nothing is inserted on error.
    pub fn load_xml_str(&mut self, xml: &str, format: PolicyFormat) -> Result<LoadSummary, RulebaseError> {
        let parsed = parse_rules(xml, format)?;
        Ok(self.insert_all(parsed))
    }

    /// Load a JSON array of rule records (exported rule dumps, fixtures)
    pub fn load_json(&mut self, path: &Path) -> Result<LoadSummary, RulebaseError> {
        let raw = read_source(path)?;
        let summary = self.load_json_str(&raw)?;
        log::info!("Loaded {} rules from JSON {}", summary.added, path.display());
        Ok(summary)
    }

    /// Records are checked before any is inserted; one bad record rejects the document.
    pub fn load_json_str(&mut self, raw: &str) -> Result<LoadSummary, RulebaseError> {
        let parsed: Vec<RuleRecord> = serde_json::from_str(raw)?;
        let records = parsed
            .into_iter()
            .map(normalize_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.insert_all(records))
    }

    /// First definition of a key wins
    fn insert_all(&mut self, records: Vec<RuleRecord>) -> LoadSummary {
        let mut summary = LoadSummary::default();
        for record in records {
            let key = record.key();
            if self.index.contains_key(&key) {
                log::warn!(
                    "Duplicate rule key '{}' ({} {}), keeping first definition",
                    key,
                    record.scope,
                    record.rulebase_stage
                );
                summary.duplicates += 1;
                continue;
            }
            self.index.insert(key, self.rules.len());
            self.rules.push(record);
            summary.added += 1;
        }
        summary
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    /// Resolve a rule from a log entry's device-group hierarchy.
    ///
    /// Tries `{most specific non-empty level}::{name}`, then the bare name.
    pub fn resolve(&self, rule_name: &str, hierarchy: &[&str]) -> Option<&RuleRecord> {
        let most_specific = hierarchy
            .iter()
            .map(|level| level.trim())
            .filter(|level| !level.is_empty())
            .last();

        if let Some(dg) = most_specific {
            if let Some(rule) = self.get(&rule_key(Some(dg), rule_name)) {
                return Some(rule);
            }
        }
        self.get(rule_name)
    }

    /// Resolve the rule that produced a log entry (rule name, else rule id,
    /// plus the entry's device-group hierarchy)
    pub fn resolve_event(&self, event: &LogEvent) -> Option<&RuleRecord> {
        let name = event
            .field(Field::RuleName)
            .or_else(|| event.field(Field::RuleId))?;
        self.resolve(name, &event.dg_hierarchy())
    }

    /// Scope, device group and stage for a rule name.
    ///
    /// Bare-name key first, then the first rule with that name in load order.
    pub fn source_of(&self, rule_name: &str) -> Option<RuleSource> {
        self.get(rule_name)
            .or_else(|| self.rules.iter().find(|r| r.name == rule_name))
            .map(RuleRecord::source)
    }

    /// Exact key lookup
    pub fn get(&self, key: &str) -> Option<&RuleRecord> {
        self.index.get(key).map(|&i| &self.rules[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleRecord> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Bring a deserialized record in line with what the XML loader produces:
/// a device group exactly when scoped to one, forwarding on whenever a
/// profile is attached.
fn normalize_record(mut record: RuleRecord) -> Result<RuleRecord, RulebaseError> {
    let invalid = |record: &RuleRecord, message: &str| RulebaseError::InvalidRecord {
        name: record.name.clone(),
        message: message.to_string(),
    };

    if record.name.trim().is_empty() {
        return Err(invalid(&record, "empty rule name"));
    }

    record.device_group = record
        .device_group
        .take()
        .map(|dg| dg.trim().to_string())
        .filter(|dg| !dg.is_empty());
    match (record.scope, &record.device_group) {
        (RuleScope::DeviceGroup, None) => {
            return Err(invalid(&record, "device_group scope without a device group"));
        }
        (RuleScope::Shared | RuleScope::Local, Some(_)) => {
            return Err(invalid(&record, "device group set on a rule outside device_group scope"));
        }
        _ => {}
    }

    record.log_forwarding_profile = record
        .log_forwarding_profile
        .take()
        .filter(|profile| !profile.trim().is_empty());
    if record.log_forwarding_profile.is_some() && !record.forwarding_enabled {
        log::debug!(
            "Rule '{}' has a log-forwarding profile, marking forwarding enabled",
            record.name
        );
        record.forwarding_enabled = true;
    }
    Ok(record)
}

fn read_source(path: &Path) -> Result<String, RulebaseError> {
    std::fs::read_to_string(path).map_err(|source| RulebaseError::Io {
        path: path.to_path_buf(),
        source,
    })
}
