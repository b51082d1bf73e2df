//! Forwarding Configuration
//!
//! Thresholds for the classifier tier.
//! Can be loaded from the analyzer config file or set at runtime.

use serde::{Deserialize, Serialize};

// ============================================================================
// FORWARDING CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Minimum forward probability for the classifier tier
    pub confidence_threshold: f32,
    /// Severity/priority/risk values that always forward (case-insensitive)
    pub priority_levels: Vec<String>,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            priority_levels: vec!["critical".to_string(), "high".to_string()],
        }
    }
}

impl ForwardingConfig {
    /// Forward more: lower threshold, medium severity always forwarded
    pub fn conservative() -> Self {
        Self {
            confidence_threshold: 0.5,
            priority_levels: vec![
                "critical".to_string(),
                "high".to_string(),
                "medium".to_string(),
            ],
        }
    }

    /// Suppress more: only very confident predictions and critical severity
    pub fn aggressive() -> Self {
        Self {
            confidence_threshold: 0.95,
            priority_levels: vec!["critical".to_string()],
        }
    }

    /// Named preset, `None` for unknown names
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::default()),
            "conservative" => Some(Self::conservative()),
            "aggressive" => Some(Self::aggressive()),
            _ => None,
        }
    }

    /// Check if a severity value is in the always-forward set
    pub fn is_priority(&self, severity: &str) -> bool {
        let severity = severity.trim();
        self.priority_levels
            .iter()
            .any(|level| level.eq_ignore_ascii_case(severity))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ForwardingConfig::default();
        assert_eq!(config.confidence_threshold, 0.8);
        assert!(config.is_priority("HIGH"));
        assert!(config.is_priority(" critical "));
        assert!(!config.is_priority("medium"));
    }

    #[test]
    fn test_presets() {
        assert!(ForwardingConfig::preset("Conservative").unwrap().is_priority("medium"));
        assert_eq!(ForwardingConfig::preset("aggressive").unwrap().confidence_threshold, 0.95);
        assert!(ForwardingConfig::preset("reckless").is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ForwardingConfig = serde_json::from_str(r#"{"confidence_threshold": 0.6}"#).unwrap();
        assert_eq!(config.confidence_threshold, 0.6);
        assert_eq!(config.priority_levels.len(), 2);
    }
}
