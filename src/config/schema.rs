//! Configuration schema types
//!
//! This module defines the configuration structure for Tidemark. One
//! controller is run per configured table; the export window size drives
//! both the incremental window and the scheduling cadence.

use crate::core::retry::RetryPolicy;
use crate::domain::ids::TableId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Smallest accepted export window, in minutes
pub const MIN_WINDOW_MINUTES: u32 = 15;

/// Largest accepted export window, in minutes (24 hours)
pub const MAX_WINDOW_MINUTES: u32 = 1440;

/// Main Tidemark configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TidemarkConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Export lifecycle settings
    pub export: ExportConfig,

    /// Notification channel settings
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Parameter store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TidemarkConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.export.validate()?;
        self.notification.validate()?;
        self.store.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (log decisions without starting exports or writing
    /// parameters)
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Export lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Comma-separated list of source table identifiers; one controller is
    /// run per table
    pub tables: String,

    /// Incremental export window size in minutes, 15 to 1440
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,

    /// Seconds between export-job status polls
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// Retry policy for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        self.table_ids()?;
        if !(MIN_WINDOW_MINUTES..=MAX_WINDOW_MINUTES).contains(&self.window_minutes) {
            return Err(format!(
                "window_minutes must be between {} and {}, got {}",
                MIN_WINDOW_MINUTES, MAX_WINDOW_MINUTES, self.window_minutes
            ));
        }
        if self.poll_interval_seconds == 0 {
            return Err("poll_interval_seconds must be at least 1".to_string());
        }
        self.retry.validate()?;
        Ok(())
    }

    /// Parsed table identifiers from the comma-separated list
    pub fn table_ids(&self) -> Result<Vec<TableId>, String> {
        let ids: Vec<TableId> = self
            .tables
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(TableId::from_str)
            .collect::<Result<_, _>>()?;
        if ids.is_empty() {
            return Err("tables must name at least one table".to_string());
        }
        Ok(ids)
    }

    /// Poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

/// Retry configuration for transient failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.backoff_multiplier < 1.0 {
            return Err(format!(
                "backoff_multiplier must be at least 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err("max_delay_ms must not be smaller than initial_delay_ms".to_string());
        }
        Ok(())
    }

    /// Convert to a runtime retry policy
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
        }
    }
}

/// Notification channel configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Reuse an existing topic instead of provisioning one
    #[serde(default)]
    pub reuse_existing_topic: bool,

    /// Name of the existing topic when `reuse_existing_topic` is set
    #[serde(default)]
    pub topic_name: Option<String>,

    /// Email endpoints subscribed to success/failure events
    #[serde(default)]
    pub email_endpoints: Vec<String>,

    /// Queue endpoints subscribed to success/failure events
    #[serde(default)]
    pub queue_endpoints: Vec<String>,
}

impl NotificationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.reuse_existing_topic && self.topic_name.as_deref().unwrap_or("").is_empty() {
            return Err(
                "topic_name is required when reuse_existing_topic is enabled".to_string(),
            );
        }
        for email in &self.email_endpoints {
            if !email.contains('@') {
                return Err(format!("Invalid email endpoint: {}", email));
            }
        }
        Ok(())
    }
}

/// Parameter store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key prefix all per-table parameters live under
    #[serde(default = "default_store_prefix")]
    pub prefix: String,

    /// Path of the JSON file backing the store
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: default_store_prefix(),
            path: default_store_path(),
        }
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<(), String> {
        if self.prefix.trim().is_empty() {
            return Err("store prefix cannot be empty".to_string());
        }
        if !self.prefix.starts_with('/') {
            return Err(format!("store prefix must start with '/', got {}", self.prefix));
        }
        if self.path.trim().is_empty() {
            return Err("store path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation policy: daily or hourly
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_window_minutes() -> u32 {
    60
}

fn default_poll_interval_seconds() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_store_prefix() -> String {
    "/tidemark".to_string()
}

fn default_store_path() -> String {
    "tidemark-params.json".to_string()
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config(window_minutes: u32) -> TidemarkConfig {
        TidemarkConfig {
            application: ApplicationConfig::default(),
            export: ExportConfig {
                tables: "orders".to_string(),
                window_minutes,
                poll_interval_seconds: default_poll_interval_seconds(),
                retry: RetryConfig::default(),
            },
            notification: NotificationConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_window_boundaries() {
        assert!(minimal_config(15).validate().is_ok());
        assert!(minimal_config(1440).validate().is_ok());
        assert!(minimal_config(14).validate().is_err());
        assert!(minimal_config(1441).validate().is_err());
    }

    #[test]
    fn test_tables_parse_comma_separated() {
        let mut config = minimal_config(60);
        config.export.tables = "orders, customers ,audit-log".to_string();
        let ids = config.export.table_ids().unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[1].as_str(), "customers");
    }

    #[test]
    fn test_tables_must_not_be_empty() {
        let mut config = minimal_config(60);
        config.export.tables = " , ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_table_name_rejected() {
        let mut config = minimal_config(60);
        config.export.tables = "orders,bad name".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = minimal_config(60);
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_validation() {
        let mut config = minimal_config(60);
        config.export.retry.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());

        let mut config = minimal_config(60);
        config.export.retry.max_delay_ms = 100;
        config.export.retry.initial_delay_ms = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_notification_validation() {
        let mut config = minimal_config(60);
        config.notification.reuse_existing_topic = true;
        assert!(config.validate().is_err());
        config.notification.topic_name = Some("backup-events".to_string());
        assert!(config.validate().is_ok());

        config.notification.email_endpoints = vec!["not-an-email".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_prefix_validation() {
        let mut config = minimal_config(60);
        config.store.prefix = "tidemark".to_string();
        assert!(config.validate().is_err());
        config.store.prefix = "/tidemark".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_rotation_validation() {
        let mut config = minimal_config(60);
        config.logging.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_config_to_policy() {
        let retry = RetryConfig {
            max_retries: 5,
            initial_delay_ms: 250,
            max_delay_ms: 10_000,
            backoff_multiplier: 3.0,
        };
        let policy = retry.policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_secs(10));
    }

    #[test]
    fn test_minimal_toml_parses_with_defaults() {
        let config: TidemarkConfig = toml::from_str(
            r#"
[export]
tables = "orders"
"#,
        )
        .unwrap();
        assert_eq!(config.export.window_minutes, 60);
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.store.prefix, "/tidemark");
        assert!(config.validate().is_ok());
    }
}
