//! Domain error types
//!
//! This module defines the error hierarchy for Tidemark. All errors are
//! domain-specific and don't expose third-party types. The sub-error enums
//! carry the retry classification: a cycle only ever retries conditions that
//! are explicitly marked transient here.

use thiserror::Error;

/// Main Tidemark error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum TidemarkError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Parameter store errors
    #[error("Parameter store error: {0}")]
    ParamStore(#[from] ParamStoreError),

    /// Backup subsystem errors
    #[error("Backup service error: {0}")]
    Backup(#[from] BackupError),

    /// Notification channel errors
    #[error("Notification error: {0}")]
    Notify(String),

    /// Workflow state management errors
    #[error("State management error: {0}")]
    State(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Parameter store errors
///
/// Typed errors for the durable key-value parameter store. `NotFound` is a
/// normal outcome for optional parameters and for deletes of stale keys;
/// `Throttled` is the only transient class.
#[derive(Debug, Error)]
pub enum ParamStoreError {
    /// Parameter does not exist
    #[error("Parameter not found: {0}")]
    NotFound(String),

    /// Request was throttled by the store
    #[error("Parameter store throttled: {0}")]
    Throttled(String),

    /// Stored value could not be interpreted
    #[error("Invalid parameter value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Any other store failure
    #[error("Parameter store failure: {0}")]
    Other(String),
}

impl ParamStoreError {
    /// Whether the error is worth retrying with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, ParamStoreError::Throttled(_))
    }

    /// Whether the error means the parameter simply isn't there
    pub fn is_not_found(&self) -> bool {
        matches!(self, ParamStoreError::NotFound(_))
    }
}

/// Backup subsystem errors
///
/// Errors from the service that performs full and incremental exports.
/// `Transient` covers SDK client exceptions and gets bounded retries with
/// backoff. `InvalidExportTime` is the clock-skew race on incremental
/// exports; it gets its own fixed-spacing retry and, if it persists,
/// escalates to PITR-gap handling rather than a hard failure.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Transient SDK/client failure, safe to retry
    #[error("Transient backup service failure: {0}")]
    Transient(String),

    /// Requested export end time is in the future of the service clock
    #[error("Invalid export time: {0}")]
    InvalidExportTime(String),

    /// Point-in-time recovery is not enabled on the source table
    #[error("Point-in-time recovery is disabled for table: {0}")]
    PitrDisabled(String),

    /// Requested export start time falls outside the recovery window
    #[error("Export start time outside the PITR window: {0}")]
    OutsidePitrWindow(String),

    /// Export job ID is unknown to the service
    #[error("Export job not found: {0}")]
    JobNotFound(String),

    /// Source table does not exist
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Any other backup service failure
    #[error("Backup service failure: {0}")]
    Other(String),
}

impl BackupError {
    /// Whether the error is worth retrying with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, BackupError::Transient(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for TidemarkError {
    fn from(err: std::io::Error) -> Self {
        TidemarkError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for TidemarkError {
    fn from(err: serde_json::Error) -> Self {
        TidemarkError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for TidemarkError {
    fn from(err: toml::de::Error) -> Self {
        TidemarkError::Configuration(format!("TOML parse error: {err}"))
    }
}
