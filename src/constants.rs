//! Central Configuration Constants
//!
//! Single source of truth for names and defaults shared by the library and
//! the `lfa` binary.

use std::path::PathBuf;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Log Forwarding Analyzer";

/// Directory under the platform data dir
pub const DATA_DIR_NAME: &str = "log-forwarding-analyzer";

/// Prefix of environment overrides (`LFA_CONFIDENCE_THRESHOLD`, ...)
pub const ENV_PREFIX: &str = "LFA_";

/// Warnings printed per input file before they are summarised
pub const MAX_LOGGED_WARNINGS: usize = 10;

// ============================================
// Helper functions
// ============================================

/// `<data_local_dir>/log-forwarding-analyzer`, or `./log-forwarding-analyzer`
/// when the platform has no data dir
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}
