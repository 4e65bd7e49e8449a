//! Configuration management
//!
//! Configuration loads from environment variables (`CLASSROUTINE_*`) or a
//! TOML file, with working defaults for the department's published sheet.

use crate::parser::{RemainderPolicy, ScanOptions, TimetableOptions};
use crate::sync::SyncOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Spreadsheet source configuration
    pub sheets: SheetsConfig,

    /// Fetch and refresh configuration
    pub fetch: FetchConfig,

    /// Parsing tolerances
    pub parser: ParserConfig,

    /// Local storage configuration
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Spreadsheet source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// The shared spreadsheet's document id
    pub spreadsheet_id: String,

    /// Values API key; without it the public CSV export is used and the
    /// directory ranges come back empty
    pub api_key: Option<String>,

    /// A1 range of the faculty columns on the info sheet
    pub teacher_range: String,

    /// A1 range of the committee columns on the info sheet
    pub committee_range: String,

    /// A1 range of the lab columns on the info sheet
    pub lab_range: String,

    /// Semester sheet tab labels
    pub semesters: Vec<String>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        let defaults = SyncOptions::default();
        Self {
            spreadsheet_id: String::from("1Sdmr60rcZeBCa2ofswUr9mxIreIj71W9HYM1RRhvfMM"),
            api_key: None,
            teacher_range: defaults.teacher_range,
            committee_range: defaults.committee_range,
            lab_range: defaults.lab_range,
            semesters: defaults.semesters,
        }
    }
}

/// Fetch and refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum retry attempts for retryable HTTP failures
    pub max_retries: u32,

    /// Periodic refresh interval in seconds
    pub refresh_interval_secs: u64,

    /// Endpoint host override, for tests and mirrors
    pub base_url: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_retries: 3,
            refresh_interval_secs: 300,
            base_url: None,
        }
    }
}

/// Parsing tolerances
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Consecutive blank directory rows tolerated before a list scan stops
    pub blank_row_tolerance: usize,

    /// What to do with leftover lines after 3-line class grouping
    pub remainder_policy: RemainderPolicy,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            blank_row_tolerance: 1,
            remainder_policy: RemainderPolicy::Discard,
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the offline snapshot and sync status
    pub data_dir: PathBuf,

    /// Optional exported backup snapshot to use as a fallback tier
    pub backup_file: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            backup_file: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(id) = std::env::var("CLASSROUTINE_SPREADSHEET_ID") {
            config.sheets.spreadsheet_id = id;
        }
        config.sheets.api_key = std::env::var("CLASSROUTINE_SHEETS_API_KEY").ok();

        if let Some(timeout) = env_parse("CLASSROUTINE_REQUEST_TIMEOUT") {
            config.fetch.request_timeout_secs = timeout;
        }
        if let Some(retries) = env_parse("CLASSROUTINE_MAX_RETRIES") {
            config.fetch.max_retries = retries;
        }
        if let Some(interval) = env_parse("CLASSROUTINE_REFRESH_INTERVAL") {
            config.fetch.refresh_interval_secs = interval;
        }
        if let Ok(base_url) = std::env::var("CLASSROUTINE_BASE_URL") {
            config.fetch.base_url = Some(base_url);
        }

        if let Some(tolerance) = env_parse("CLASSROUTINE_BLANK_ROW_TOLERANCE") {
            config.parser.blank_row_tolerance = tolerance;
        }

        if let Ok(dir) = std::env::var("CLASSROUTINE_DATA_DIR") {
            config.storage.data_dir = dir.into();
        }
        if let Ok(backup) = std::env::var("CLASSROUTINE_BACKUP_FILE") {
            config.storage.backup_file = Some(backup.into());
        }

        if let Ok(level) = std::env::var("CLASSROUTINE_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("CLASSROUTINE_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.sheets.spreadsheet_id.trim().is_empty() {
            anyhow::bail!("spreadsheet_id must not be empty");
        }

        if self.sheets.semesters.is_empty() {
            anyhow::bail!("at least one semester sheet must be configured");
        }

        if self.fetch.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.fetch.refresh_interval_secs == 0 {
            anyhow::bail!("refresh_interval_secs must be greater than 0");
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.request_timeout_secs)
    }

    /// Get refresh interval as Duration
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.fetch.refresh_interval_secs)
    }

    /// Orchestrator options derived from this configuration
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            teacher_range: self.sheets.teacher_range.clone(),
            committee_range: self.sheets.committee_range.clone(),
            lab_range: self.sheets.lab_range.clone(),
            semesters: self.sheets.semesters.clone(),
            scan: ScanOptions {
                blank_row_tolerance: self.parser.blank_row_tolerance,
            },
            timetable: TimetableOptions {
                remainder_policy: self.parser.remainder_policy,
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sheets.semesters.len(), 9);
        // The config layer is more lenient than the strict ScanOptions default
        assert_eq!(config.parser.blank_row_tolerance, 1);
        assert_eq!(config.sync_options().scan.blank_row_tolerance, 1);
    }

    #[test]
    fn test_empty_spreadsheet_id_rejected() {
        let mut config = Config::default();
        config.sheets.spreadsheet_id = String::from("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_refresh_interval_rejected() {
        let mut config = Config::default();
        config.fetch.refresh_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_conversions() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.refresh_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_sync_options_mirror_config() {
        let mut config = Config::default();
        config.parser.blank_row_tolerance = 3;
        config.parser.remainder_policy = RemainderPolicy::Reject;

        let opts = config.sync_options();
        assert_eq!(opts.scan.blank_row_tolerance, 3);
        assert_eq!(opts.timetable.remainder_policy, RemainderPolicy::Reject);
        assert_eq!(opts.teacher_range, "Info.!B2:H");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_text = r#"
[sheets]
spreadsheet_id = "custom-sheet"

[parser]
blank_row_tolerance = 2
remainder_policy = "reject"
"#;
        let config: Config = toml::from_str(toml_text).unwrap();
        assert_eq!(config.sheets.spreadsheet_id, "custom-sheet");
        assert_eq!(config.parser.blank_row_tolerance, 2);
        assert_eq!(config.parser.remainder_policy, RemainderPolicy::Reject);
        // untouched sections keep their defaults
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.logging.level, "info");
    }
}
