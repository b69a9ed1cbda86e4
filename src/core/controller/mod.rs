//! Export lifecycle controller
//!
//! Drives one cycle of the export lifecycle for a single table: load the
//! parameter snapshot, describe the table's backup status, pick a path with
//! the pure decision machine, and execute it. Every unhandled fault is
//! reported through the notifier exactly once before the cycle ends; the
//! next scheduled cycle is independent.

mod full;
mod incremental;

use crate::adapters::clock::Clock;
use crate::adapters::traits::{
    BackupService, NotificationEvent, Notifier, ParameterStore, TableBackupStatus,
};
use crate::core::retry::{retry_transient, RetryPolicy};
use crate::core::state::machine::{decide, CyclePath, CycleSnapshot};
use crate::core::state::params::{ParamKey, ParamSnapshot, TableNamespace, WorkflowAction};
use crate::domain::errors::{BackupError, ParamStoreError, TidemarkError};
use crate::domain::ids::{ExportJobId, TableId};
use crate::domain::job::ExportJob;
use crate::domain::result::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Per-table controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Table this controller manages
    pub table_id: TableId,

    /// Incremental export window size in minutes
    pub window_minutes: u32,

    /// Delay between export-job status polls
    pub poll_interval: Duration,

    /// Retry policy for transient failures
    pub retry: RetryPolicy,

    /// Parameter key prefix
    pub store_prefix: String,

    /// Decide only; skip exports, parameter writes and notifications
    pub dry_run: bool,
}

/// Terminal outcome of one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Operator paused the workflow
    Paused,
    /// PITR is disabled on the source table
    PitrDisabled,
    /// Full export finished successfully
    FullExportCompleted,
    /// Full export reached a FAILED status
    FullExportFailed,
    /// Incremental export finished successfully
    IncrementalExportCompleted,
    /// Incremental export reached a FAILED status
    IncrementalExportFailed,
    /// The next window's end has already passed; nothing to export
    ExportNotNeeded,
    /// A previously recorded PITR gap was re-notified
    PitrGapReported,
    /// A PITR gap was detected and recorded this cycle
    PitrGapEntered,
    /// Dry-run mode: the path that would have been taken
    DryRun(CyclePath),
}

/// One export lifecycle controller instance
///
/// Holds the injected collaborators for a single table. `run_cycle` is the
/// entry point the scheduler calls once per tick.
pub struct LifecycleController {
    config: ControllerConfig,
    store: Arc<dyn ParameterStore>,
    backup: Arc<dyn BackupService>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    namespace: TableNamespace,
}

impl LifecycleController {
    /// Create a controller for one table
    pub fn new(
        config: ControllerConfig,
        store: Arc<dyn ParameterStore>,
        backup: Arc<dyn BackupService>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let namespace = TableNamespace::new(config.store_prefix.clone(), config.table_id.clone());
        Self {
            config,
            store,
            backup,
            notifier,
            clock,
            namespace,
        }
    }

    /// The table this controller manages
    pub fn table_id(&self) -> &TableId {
        &self.config.table_id
    }

    /// Run one cycle
    ///
    /// Classified terminal outcomes (success, export failure, gap reports)
    /// notify from within their path. Any other error is published once as
    /// a FAILED notification here before being returned.
    ///
    /// # Errors
    ///
    /// Returns the underlying error after the notify-and-fail report.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        tracing::info!(table_id = %self.config.table_id, "Starting export lifecycle cycle");

        match self.execute_cycle().await {
            Ok(outcome) => {
                tracing::info!(
                    table_id = %self.config.table_id,
                    outcome = ?outcome,
                    "Cycle finished"
                );
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(
                    table_id = %self.config.table_id,
                    error = %e,
                    "Cycle failed"
                );
                self.notify_failed(format!("Export cycle failed: {}", e))
                    .await;
                Err(e)
            }
        }
    }

    async fn execute_cycle(&self) -> Result<CycleOutcome> {
        let params = self.load_params().await?;

        // The workflow graph reads parameters before it touches the backup
        // subsystem, so a paused workflow never issues a describe call.
        if params.action == WorkflowAction::Pause {
            if self.config.dry_run {
                return Ok(CycleOutcome::DryRun(CyclePath::Paused));
            }
            tracing::info!(table_id = %self.config.table_id, "Workflow paused, skipping cycle");
            return Ok(CycleOutcome::Paused);
        }

        let status = self.describe_backup_status().await?;
        let snapshot = self.build_snapshot(&params, &status);
        let path = decide(&snapshot);

        tracing::debug!(
            table_id = %self.config.table_id,
            snapshot = ?snapshot,
            path = ?path,
            "Cycle path decided"
        );

        if self.config.dry_run {
            return Ok(CycleOutcome::DryRun(path));
        }

        match path {
            CyclePath::Paused => Ok(CycleOutcome::Paused),
            CyclePath::PitrDisabledFail => self.pitr_disabled().await,
            CyclePath::AwaitFullExport => {
                let job_id = status
                    .running_full_export
                    .clone()
                    .ok_or_else(|| TidemarkError::State(
                        "decision requires a running full export but none was reported"
                            .to_string(),
                    ))?;
                self.await_full_export(&job_id).await
            }
            CyclePath::FullExport => full::run(self).await,
            CyclePath::PitrGapNotify => self.pitr_gap_notify().await,
            CyclePath::IncrementalExport => {
                incremental::run(self, &params, status.earliest_restorable_time).await
            }
        }
    }

    /// Build the decision snapshot from parameters and backup status
    ///
    /// The "reset with full export again" condition holds when the operator
    /// has cleared the initiated flag while a PITR gap is recorded; the
    /// `reset` CLI command does exactly that.
    fn build_snapshot(&self, params: &ParamSnapshot, status: &TableBackupStatus) -> CycleSnapshot {
        CycleSnapshot {
            action: params.action,
            pitr_enabled: status.pitr_enabled,
            full_export_running: status.running_full_export.is_some(),
            state: params.state,
            initiated: params.initiated,
            reset_requested: !params.initiated,
        }
    }

    async fn load_params(&self) -> Result<ParamSnapshot> {
        let snapshot = retry_transient(
            &self.config.retry,
            self.clock.as_ref(),
            "load-parameters",
            |e: &ParamStoreError| e.is_transient(),
            || ParamSnapshot::load(self.store.as_ref(), &self.namespace),
        )
        .await?;
        Ok(snapshot)
    }

    async fn describe_backup_status(&self) -> Result<TableBackupStatus> {
        let status = retry_transient(
            &self.config.retry,
            self.clock.as_ref(),
            "describe-backup-status",
            |e: &BackupError| e.is_transient(),
            || self.backup.describe_backup_status(&self.config.table_id),
        )
        .await?;
        Ok(status)
    }

    async fn pitr_disabled(&self) -> Result<CycleOutcome> {
        tracing::error!(
            table_id = %self.config.table_id,
            "Point-in-time recovery is disabled; exports cannot run"
        );
        self.notify_failed(format!(
            "Point-in-time recovery is disabled for table {}",
            self.config.table_id
        ))
        .await;
        Ok(CycleOutcome::PitrDisabled)
    }

    async fn pitr_gap_notify(&self) -> Result<CycleOutcome> {
        tracing::warn!(
            table_id = %self.config.table_id,
            "PITR gap recorded; waiting for an operator reset"
        );
        self.notify_failed(format!(
            "PITR gap found for table {}; reset with a full export to resume incremental exports",
            self.config.table_id
        ))
        .await;
        Ok(CycleOutcome::PitrGapReported)
    }

    /// Finish a full export left running by an earlier cycle
    async fn await_full_export(&self, job_id: &ExportJobId) -> Result<CycleOutcome> {
        tracing::info!(
            table_id = %self.config.table_id,
            job_id = %job_id,
            "Full export still running, polling to completion"
        );
        let job = self.poll_job_to_terminal(job_id).await?;
        full::finish(self, &job).await
    }

    /// Poll an export job until it reaches a terminal status
    pub(crate) async fn poll_job_to_terminal(&self, job_id: &ExportJobId) -> Result<ExportJob> {
        loop {
            let job = retry_transient(
                &self.config.retry,
                self.clock.as_ref(),
                "describe-export-job",
                |e: &BackupError| e.is_transient(),
                || self.backup.describe_export_job(job_id),
            )
            .await?;

            if job.is_terminal() {
                tracing::info!(
                    table_id = %self.config.table_id,
                    job_id = %job_id,
                    status = ?job.status,
                    "Export job reached a terminal status"
                );
                return Ok(job);
            }

            tracing::debug!(
                table_id = %self.config.table_id,
                job_id = %job_id,
                "Export job still running"
            );
            self.clock.sleep(self.config.poll_interval).await;
        }
    }

    /// Write a parameter, retrying throttles
    pub(crate) async fn put_param(&self, key: ParamKey, value: &str) -> Result<()> {
        let full_key = self.namespace.key(key);
        retry_transient(
            &self.config.retry,
            self.clock.as_ref(),
            key.suffix(),
            |e: &ParamStoreError| e.is_transient(),
            || self.store.put(&full_key, value),
        )
        .await?;
        Ok(())
    }

    /// Write a parameter, falling back to clearing the initiated flag when
    /// the store reports the key missing
    ///
    /// An inconsistent parameter set must not wedge the workflow: clearing
    /// the initiated flag forces the next cycle back through a full export,
    /// which rebuilds all downstream parameters.
    pub(crate) async fn put_param_tolerating_missing(
        &self,
        key: ParamKey,
        value: &str,
    ) -> Result<()> {
        let full_key = self.namespace.key(key);
        let result = retry_transient(
            &self.config.retry,
            self.clock.as_ref(),
            key.suffix(),
            |e: &ParamStoreError| e.is_transient(),
            || self.store.put(&full_key, value),
        )
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    table_id = %self.config.table_id,
                    key = %full_key,
                    "Parameter missing during update, clearing initiated flag instead"
                );
                self.delete_param_tolerating_missing(ParamKey::Initiated)
                    .await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a parameter, treating a missing key as already deleted
    pub(crate) async fn delete_param_tolerating_missing(&self, key: ParamKey) -> Result<()> {
        let full_key = self.namespace.key(key);
        let result = retry_transient(
            &self.config.retry,
            self.clock.as_ref(),
            key.suffix(),
            |e: &ParamStoreError| e.is_transient(),
            || self.store.delete(&full_key),
        )
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Publish a SUCCESS event; publish failures are logged, never fatal
    pub(crate) async fn notify_success(&self, message: String) {
        let event = NotificationEvent::success(
            self.config.table_id.clone(),
            message,
            self.clock.now(),
        );
        if let Err(e) = self.notifier.publish(&event).await {
            tracing::error!(
                table_id = %self.config.table_id,
                error = %e,
                "Failed to publish success notification"
            );
        }
    }

    /// Publish a FAILED event; publish failures are logged, never fatal
    pub(crate) async fn notify_failed(&self, message: String) {
        let event = NotificationEvent::failed(
            self.config.table_id.clone(),
            message,
            self.clock.now(),
        );
        if let Err(e) = self.notifier.publish(&event).await {
            tracing::error!(
                table_id = %self.config.table_id,
                error = %e,
                "Failed to publish failure notification"
            );
        }
    }

    pub(crate) fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn backup(&self) -> &dyn BackupService {
        self.backup.as_ref()
    }
}
