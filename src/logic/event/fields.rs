//! Field Alias Table
//!
//! Log producers name the same column differently ("Type" vs "LogType" vs
//! "EventType"). Every semantic field is resolved through the ordered alias
//! list below, first match wins.

use serde::{Deserialize, Serialize};

// ============================================================================
// SEMANTIC FIELDS
// ============================================================================

/// Semantic field looked up on every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    RuleId,
    RuleName,
    EventType,
    Severity,
    Timestamp,
    DgLevel1,
    DgLevel2,
    DgLevel3,
    DgLevel4,
    ForwardingFlag,
    Source,
    Destination,
    Application,
    Service,
}

// ============================================================================
// ALIAS TABLE (Authoritative source)
// ============================================================================

const RULE_ID_ALIASES: &[&str] = &["RuleId", "Rule ID", "SecurityRule", "Rule"];
const RULE_NAME_ALIASES: &[&str] = &["RuleName", "Rule Name", "SecurityRuleName", "Rule"];
const TYPE_ALIASES: &[&str] = &["Type", "LogType", "EventType"];
const SEVERITY_ALIASES: &[&str] = &["Severity", "Priority", "Risk"];
const TIMESTAMP_ALIASES: &[&str] = &["Receive Time", "ReceiveTime", "Time", "Timestamp", "EventTime"];
const DG_LEVEL_1_ALIASES: &[&str] = &["DG Hierarchy Level 1", "DGHierarchyLevel1", "dg_hier_level_1"];
const DG_LEVEL_2_ALIASES: &[&str] = &["DG Hierarchy Level 2", "DGHierarchyLevel2", "dg_hier_level_2"];
const DG_LEVEL_3_ALIASES: &[&str] = &["DG Hierarchy Level 3", "DGHierarchyLevel3", "dg_hier_level_3"];
const DG_LEVEL_4_ALIASES: &[&str] = &["DG Hierarchy Level 4", "DGHierarchyLevel4", "dg_hier_level_4"];
const FORWARDING_FLAG_ALIASES: &[&str] = &["LogForwarding", "ForwardingEnabled", "SendToSiem"];
const SOURCE_ALIASES: &[&str] = &["Source", "Source address"];
const DESTINATION_ALIASES: &[&str] = &["Destination", "Destination address"];
const APPLICATION_ALIASES: &[&str] = &["Application"];
const SERVICE_ALIASES: &[&str] = &["Service"];

/// Device-group hierarchy levels, outermost first
pub const DG_LEVELS: [Field; 4] = [Field::DgLevel1, Field::DgLevel2, Field::DgLevel3, Field::DgLevel4];

/// Wildcard used when a pattern field is absent
pub const ANY: &str = "Any";

impl Field {
    /// Ordered alias list for this field
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::RuleId => RULE_ID_ALIASES,
            Field::RuleName => RULE_NAME_ALIASES,
            Field::EventType => TYPE_ALIASES,
            Field::Severity => SEVERITY_ALIASES,
            Field::Timestamp => TIMESTAMP_ALIASES,
            Field::DgLevel1 => DG_LEVEL_1_ALIASES,
            Field::DgLevel2 => DG_LEVEL_2_ALIASES,
            Field::DgLevel3 => DG_LEVEL_3_ALIASES,
            Field::DgLevel4 => DG_LEVEL_4_ALIASES,
            Field::ForwardingFlag => FORWARDING_FLAG_ALIASES,
            Field::Source => SOURCE_ALIASES,
            Field::Destination => DESTINATION_ALIASES,
            Field::Application => APPLICATION_ALIASES,
            Field::Service => SERVICE_ALIASES,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::RuleId => "rule_id",
            Field::RuleName => "rule_name",
            Field::EventType => "type",
            Field::Severity => "severity",
            Field::Timestamp => "timestamp",
            Field::DgLevel1 => "dg_level_1",
            Field::DgLevel2 => "dg_level_2",
            Field::DgLevel3 => "dg_level_3",
            Field::DgLevel4 => "dg_level_4",
            Field::ForwardingFlag => "forwarding_flag",
            Field::Source => "source",
            Field::Destination => "destination",
            Field::Application => "application",
            Field::Service => "service",
        }
    }
}

/// True for keys that carry time values and must not feed the classifier
pub fn is_time_key(key: &str) -> bool {
    key.ends_with("Time") || TIMESTAMP_ALIASES.contains(&key)
}

// ============================================================================
// BOOLEAN-LIKE VALUES
// ============================================================================

/// Parse an explicit forwarding flag.
///
/// Returns `None` for values that are neither truthy nor falsy so callers can
/// fall through to the next decision tier.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "false" | "0" | "disabled" | "no" => Some(false),
        "true" | "1" | "enabled" | "yes" => Some(true),
        _ => None,
    }
}
