//! Collaborator abstraction traits
//!
//! This module defines the traits the lifecycle controller is wired against:
//! the durable parameter store, the backup subsystem, and the notification
//! channel. Production binds these to managed cloud services; tests bind
//! them to the in-memory implementations in [`crate::adapters::memory`].

use crate::domain::errors::{BackupError, ParamStoreError};
use crate::domain::ids::{ExportJobId, TableId};
use crate::domain::job::ExportJob;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable key-value parameter store
///
/// Holds the per-table workflow markers (action, state, initiated flag,
/// watermarks) as string values. Keys are namespaced by table identifier;
/// see [`crate::core::state::params`] for the key layout.
///
/// Writes are read-then-write without optimistic concurrency control; the
/// controller assumes at most one active cycle per table.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Read a parameter value
    ///
    /// # Errors
    ///
    /// Returns `ParamStoreError::NotFound` if the key does not exist and
    /// `ParamStoreError::Throttled` when the store rejects the request
    /// transiently.
    async fn get(&self, key: &str) -> Result<String, ParamStoreError>;

    /// Write a parameter value, creating or overwriting the key
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. Backends with update-only
    /// semantics report `ParamStoreError::NotFound` for missing keys; the
    /// controller treats that as recoverable.
    async fn put(&self, key: &str, value: &str) -> Result<(), ParamStoreError>;

    /// Delete a parameter
    ///
    /// # Errors
    ///
    /// Returns `ParamStoreError::NotFound` if the key does not exist.
    async fn delete(&self, key: &str) -> Result<(), ParamStoreError>;
}

/// Point-in-time-recovery and export status of a source table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableBackupStatus {
    /// Whether point-in-time recovery is enabled on the table
    pub pitr_enabled: bool,

    /// Earliest restorable time within the PITR retention window.
    /// `None` when PITR is disabled.
    pub earliest_restorable_time: Option<DateTime<Utc>>,

    /// A full export that is still running from an earlier cycle, if any
    pub running_full_export: Option<ExportJobId>,
}

/// Backup/export subsystem
///
/// Performs full and incremental exports of a source table and reports
/// job completion state. All methods map 1:1 to the consumed API surface:
/// describe-PITR-status, start-full-export, start-incremental-export and
/// describe-export-job.
#[async_trait]
pub trait BackupService: Send + Sync {
    /// Describe PITR status and any running full export for a table
    ///
    /// # Errors
    ///
    /// Returns `BackupError::TableNotFound` if the table does not exist,
    /// `BackupError::Transient` for retryable SDK failures.
    async fn describe_backup_status(
        &self,
        table_id: &TableId,
    ) -> Result<TableBackupStatus, BackupError>;

    /// Start a full export of the table
    ///
    /// # Errors
    ///
    /// Returns `BackupError::PitrDisabled` if PITR is off and
    /// `BackupError::Transient` for retryable SDK failures.
    async fn start_full_export(&self, table_id: &TableId) -> Result<ExportJob, BackupError>;

    /// Start an incremental export for the [from, to) window
    ///
    /// # Errors
    ///
    /// Returns `BackupError::InvalidExportTime` when the service clock has
    /// not yet reached `to`, `BackupError::OutsidePitrWindow` when `from`
    /// precedes the earliest restorable time, `BackupError::Transient` for
    /// retryable SDK failures.
    async fn start_incremental_export(
        &self,
        table_id: &TableId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ExportJob, BackupError>;

    /// Describe an export job started earlier
    ///
    /// # Errors
    ///
    /// Returns `BackupError::JobNotFound` for unknown job IDs.
    async fn describe_export_job(&self, job_id: &ExportJobId) -> Result<ExportJob, BackupError>;
}

/// Outcome published to the notification channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    /// The cycle's export work succeeded
    Success,
    /// The cycle failed or reported a gap
    Failed,
}

/// Structured notification payload
///
/// Downstream subscribers filter on the `status` field, which is restricted
/// to SUCCESS/FAILED.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// SUCCESS or FAILED
    pub status: NotificationStatus,

    /// Table the cycle ran for
    pub table_id: TableId,

    /// Human-readable description of what happened
    pub message: String,

    /// When the event was produced
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    /// Build a SUCCESS event
    pub fn success(table_id: TableId, message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: NotificationStatus::Success,
            table_id,
            message: message.into(),
            timestamp: at,
        }
    }

    /// Build a FAILED event
    pub fn failed(table_id: TableId, message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: NotificationStatus::Failed,
            table_id,
            message: message.into(),
            timestamp: at,
        }
    }
}

/// Notification channel
///
/// Publishes structured success/failure events. Failures surface to
/// operators only through this channel; there is no interactive failure
/// surface.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish an event
    ///
    /// # Errors
    ///
    /// Returns an error message if the publish fails. Publish failures are
    /// logged by the controller but never abort a cycle.
    async fn publish(&self, event: &NotificationEvent) -> Result<(), String>;
}
