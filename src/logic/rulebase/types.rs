//! Rulebase Types
//!
//! Data structures only. Parsing lives in `loader`, lookup in `registry`.

use serde::{Deserialize, Serialize};

// ============================================================================
// SCOPE & STAGE
// ============================================================================

/// Where a rule was defined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    /// Panorama shared policy
    Shared,
    /// Panorama device-group policy
    DeviceGroup,
    /// Local firewall policy
    Local,
}

impl RuleScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleScope::Shared => "shared",
            RuleScope::DeviceGroup => "device_group",
            RuleScope::Local => "local",
        }
    }
}

impl std::fmt::Display for RuleScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rulebase the rule sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulebaseStage {
    Pre,
    Post,
    Local,
}

impl RulebaseStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RulebaseStage::Pre => "pre",
            RulebaseStage::Post => "post",
            RulebaseStage::Local => "local",
        }
    }

    /// Map a policy XML container tag to its stage
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pre-rulebase" => Some(RulebaseStage::Pre),
            "post-rulebase" => Some(RulebaseStage::Post),
            "rulebase" => Some(RulebaseStage::Local),
            _ => None,
        }
    }
}

impl std::fmt::Display for RulebaseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RULE RECORD
// ============================================================================

/// One parsed security rule. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub name: String,
    pub scope: RuleScope,
    /// Only set for `RuleScope::DeviceGroup`
    #[serde(default)]
    pub device_group: Option<String>,
    pub rulebase_stage: RulebaseStage,
    #[serde(default)]
    pub log_forwarding_profile: Option<String>,
    #[serde(default)]
    pub log_at_session_start: bool,
    #[serde(default)]
    pub log_at_session_end: bool,
    /// True iff a log-forwarding setting is attached
    #[serde(default)]
    pub forwarding_enabled: bool,
}

impl RuleRecord {
    /// Lookup key: `{device_group}::{name}` for device-group rules, bare name otherwise
    pub fn key(&self) -> String {
        match (&self.scope, &self.device_group) {
            (RuleScope::DeviceGroup, Some(dg)) => rule_key(Some(dg), &self.name),
            _ => self.name.clone(),
        }
    }

    pub fn source(&self) -> RuleSource {
        RuleSource {
            scope: self.scope,
            device_group: self.device_group.clone(),
            rulebase_stage: self.rulebase_stage,
        }
    }
}

/// Build a registry key
pub fn rule_key(device_group: Option<&str>, name: &str) -> String {
    match device_group {
        Some(dg) if !dg.is_empty() => format!("{}::{}", dg, name),
        _ => name.to_string(),
    }
}

// ============================================================================
// RULE SOURCE
// ============================================================================

/// Scope, device group and stage of a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSource {
    pub scope: RuleScope,
    pub device_group: Option<String>,
    pub rulebase_stage: RulebaseStage,
}

impl RuleSource {
    /// Human-readable location used in reports
    pub fn location(&self) -> String {
        match self.scope {
            RuleScope::DeviceGroup => format!(
                "Panorama ({} - {} rulebase)",
                self.device_group.as_deref().unwrap_or("unknown"),
                self.rulebase_stage
            ),
            RuleScope::Shared => format!("Panorama (Shared - {} rulebase)", self.rulebase_stage),
            RuleScope::Local => "Local Firewall".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(scope: RuleScope, dg: Option<&str>) -> RuleRecord {
        RuleRecord {
            name: "Allow-Web".to_string(),
            scope,
            device_group: dg.map(String::from),
            rulebase_stage: RulebaseStage::Pre,
            log_forwarding_profile: None,
            log_at_session_start: false,
            log_at_session_end: true,
            forwarding_enabled: false,
        }
    }

    #[test]
    fn test_keys_by_scope() {
        assert_eq!(record(RuleScope::DeviceGroup, Some("DG1")).key(), "DG1::Allow-Web");
        assert_eq!(record(RuleScope::Shared, None).key(), "Allow-Web");
        // A local rule never gets a qualified key, even if a device group leaks in
        assert_eq!(record(RuleScope::Local, Some("DG1")).key(), "Allow-Web");
    }

    #[test]
    fn test_location_text() {
        assert_eq!(
            record(RuleScope::DeviceGroup, Some("DG1")).source().location(),
            "Panorama (DG1 - pre rulebase)"
        );
        assert_eq!(
            record(RuleScope::Shared, None).source().location(),
            "Panorama (Shared - pre rulebase)"
        );
        assert_eq!(record(RuleScope::Local, None).source().location(), "Local Firewall");
    }
}
