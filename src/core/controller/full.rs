//! Full export path
//!
//! Runs a full export and rebuilds the table's workflow parameters around
//! it. This path serves both the first-ever export of a table and the reset
//! after a PITR gap; in both cases the incremental watermark is discarded
//! and only re-established once the full export completes.

use super::{CycleOutcome, LifecycleController};
use crate::core::retry::retry_transient;
use crate::core::state::params::{encode_timestamp, ParamKey, WorkflowAction, WorkflowState};
use crate::domain::errors::BackupError;
use crate::domain::job::ExportJob;
use crate::domain::result::Result;

/// Run a full export for the controller's table
pub(super) async fn run(ctl: &LifecycleController) -> Result<CycleOutcome> {
    let config = ctl.config();
    tracing::info!(table_id = %config.table_id, "Starting full export");

    let job = retry_transient(
        &config.retry,
        ctl.clock(),
        "start-full-export",
        |e: &BackupError| e.is_transient(),
        || ctl.backup().start_full_export(&config.table_id),
    )
    .await?;

    tracing::info!(
        table_id = %config.table_id,
        job_id = %job.id,
        started_at = %job.started_at,
        "Full export started"
    );

    // Record the export time before anything can fail mid-path; if the
    // poll below is cut short, the next cycle resumes this job and the
    // watermark fallback still points at a real export.
    ctl.put_param(ParamKey::FullExportTime, &encode_timestamp(job.started_at))
        .await?;

    // Normalize the workflow markers for the fresh baseline. These keys may
    // be missing on a brand-new table; a missing-key write falls back to
    // clearing the initiated flag, which routes the next cycle back here.
    ctl.put_param_tolerating_missing(ParamKey::Action, WorkflowAction::Run.as_str())
        .await?;
    ctl.put_param_tolerating_missing(ParamKey::State, WorkflowState::Normal.as_str())
        .await?;

    // The old incremental watermark predates the new baseline
    ctl.delete_param_tolerating_missing(ParamKey::LastIncrementalExportTime)
        .await?;

    let job = ctl.poll_job_to_terminal(&job.id).await?;
    finish(ctl, &job).await
}

/// Handle a full export that reached a terminal status
///
/// Shared with the await path, where the export was started by an earlier
/// cycle and this cycle only observes its completion.
pub(super) async fn finish(ctl: &LifecycleController, job: &ExportJob) -> Result<CycleOutcome> {
    let table_id = &ctl.config().table_id;

    if job.is_completed() {
        ctl.put_param(ParamKey::Initiated, "true").await?;
        tracing::info!(
            table_id = %table_id,
            job_id = %job.id,
            "Full export completed, workflow initiated"
        );
        ctl.notify_success(format!(
            "Full export completed for table {} (job {})",
            table_id, job.id
        ))
        .await;
        Ok(CycleOutcome::FullExportCompleted)
    } else {
        tracing::error!(
            table_id = %table_id,
            job_id = %job.id,
            "Full export failed"
        );
        ctl.notify_failed(format!(
            "Full export failed for table {} (job {})",
            table_id, job.id
        ))
        .await;
        Ok(CycleOutcome::FullExportFailed)
    }
}
