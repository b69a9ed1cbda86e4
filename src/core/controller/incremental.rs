//! Incremental export path
//!
//! Exports the next [watermark, watermark + window) slice of changes. Two
//! conditions route this path into PITR-gap handling instead of a hard
//! failure: the watermark falling behind the earliest restorable time, and
//! an export-time rejection that survives its fixed-spacing retries.

use super::{CycleOutcome, LifecycleController};
use crate::core::retry::retry_transient;
use crate::core::state::params::{encode_timestamp, ParamKey, ParamSnapshot, WorkflowState};
use crate::core::window::next_export_window;
use crate::domain::errors::{BackupError, TidemarkError};
use crate::domain::job::ExportJob;
use crate::domain::result::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Extra attempts after the first export-time rejection
const EXPORT_TIME_RETRIES: usize = 2;

/// Fixed spacing between export-time retries
const EXPORT_TIME_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Run an incremental export for the controller's table
pub(super) async fn run(
    ctl: &LifecycleController,
    params: &ParamSnapshot,
    earliest_restorable: Option<DateTime<Utc>>,
) -> Result<CycleOutcome> {
    let config = ctl.config();
    let watermark = params.export_watermark().ok_or_else(|| {
        TidemarkError::State(format!(
            "no export watermark for table {}; neither an incremental nor a full export time is recorded",
            config.table_id
        ))
    })?;

    let mut export_time_attempt = 0;
    loop {
        let now = ctl.clock().now();
        let window = next_export_window(now, watermark, config.window_minutes);

        if window.end_elapsed(now) {
            tracing::info!(
                table_id = %config.table_id,
                export_to = %window.export_to,
                now = %now,
                "Export window end has already passed, nothing to export"
            );
            return Ok(CycleOutcome::ExportNotNeeded);
        }

        // A watermark behind the earliest restorable time can never be
        // exported; the continuity of the change stream is broken.
        if let Some(earliest) = earliest_restorable {
            if window.export_from < earliest {
                tracing::warn!(
                    table_id = %config.table_id,
                    export_from = %window.export_from,
                    earliest_restorable = %earliest,
                    "Watermark fell behind the PITR window"
                );
                return enter_pitr_gap(ctl).await;
            }
        }

        tracing::info!(
            table_id = %config.table_id,
            export_from = %window.export_from,
            export_to = %window.export_to,
            "Starting incremental export"
        );

        let started = retry_transient(
            &config.retry,
            ctl.clock(),
            "start-incremental-export",
            |e: &BackupError| e.is_transient(),
            || {
                ctl.backup().start_incremental_export(
                    &config.table_id,
                    window.export_from,
                    window.export_to,
                )
            },
        )
        .await;

        match started {
            Ok(job) => {
                // Advance the watermark before polling: the export is
                // running and its window is claimed either way.
                ctl.put_param(
                    ParamKey::LastIncrementalExportTime,
                    &encode_timestamp(window.export_to),
                )
                .await?;
                return finish(ctl, &job).await;
            }
            Err(BackupError::InvalidExportTime(reason))
                if export_time_attempt < EXPORT_TIME_RETRIES =>
            {
                export_time_attempt += 1;
                tracing::warn!(
                    table_id = %config.table_id,
                    reason = %reason,
                    attempt = export_time_attempt,
                    max_attempts = EXPORT_TIME_RETRIES,
                    "Export time rejected, waiting for the service clock to catch up"
                );
                ctl.clock().sleep(EXPORT_TIME_RETRY_DELAY).await;
            }
            Err(BackupError::InvalidExportTime(reason)) => {
                tracing::error!(
                    table_id = %config.table_id,
                    reason = %reason,
                    "Export time still rejected after retries, treating as a PITR gap"
                );
                return enter_pitr_gap(ctl).await;
            }
            Err(BackupError::OutsidePitrWindow(reason)) => {
                tracing::error!(
                    table_id = %config.table_id,
                    reason = %reason,
                    "Export start time outside the PITR window"
                );
                return enter_pitr_gap(ctl).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Record a PITR gap and report it
///
/// The gap marker makes every following cycle notify-only until an
/// operator requests a reset with a fresh full export.
async fn enter_pitr_gap(ctl: &LifecycleController) -> Result<CycleOutcome> {
    let table_id = &ctl.config().table_id;
    ctl.put_param(ParamKey::State, WorkflowState::PitrGap.as_str())
        .await?;
    ctl.notify_failed(format!(
        "PITR gap detected for table {}; incremental exports are suspended until a full-export reset",
        table_id
    ))
    .await;
    Ok(CycleOutcome::PitrGapEntered)
}

async fn finish(ctl: &LifecycleController, job: &ExportJob) -> Result<CycleOutcome> {
    let table_id = &ctl.config().table_id;
    let job = ctl.poll_job_to_terminal(&job.id).await?;

    if job.is_completed() {
        tracing::info!(
            table_id = %table_id,
            job_id = %job.id,
            "Incremental export completed"
        );
        ctl.notify_success(format!(
            "Incremental export completed for table {} (job {})",
            table_id, job.id
        ))
        .await;
        Ok(CycleOutcome::IncrementalExportCompleted)
    } else {
        tracing::error!(
            table_id = %table_id,
            job_id = %job.id,
            "Incremental export failed"
        );
        ctl.notify_failed(format!(
            "Incremental export failed for table {} (job {})",
            table_id, job.id
        ))
        .await;
        Ok(CycleOutcome::IncrementalExportFailed)
    }
}
