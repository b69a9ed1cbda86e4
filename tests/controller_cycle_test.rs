//! Integration tests for the export lifecycle controller
//!
//! Each test wires a controller against the in-memory adapters and the
//! manual clock, seeds the parameter store for a scenario and asserts on
//! the cycle outcome, the parameter writes and the published notifications.

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tidemark::adapters::{
    BackupService, Clock, ManualClock, MemoryBackupService, MemoryNotifier, MemoryParameterStore,
    NotificationStatus, Notifier, ParameterStore,
};
use tidemark::core::{
    encode_timestamp, ControllerConfig, CycleOutcome, CyclePath, LifecycleController, ParamKey,
    RetryPolicy, TableNamespace,
};
use tidemark::domain::{BackupError, ExportKind, JobStatus, TableId};

struct Harness {
    store: Arc<MemoryParameterStore>,
    backup: Arc<MemoryBackupService>,
    notifier: Arc<MemoryNotifier>,
    clock: Arc<ManualClock>,
    controller: LifecycleController,
    ns: TableNamespace,
}

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn harness() -> Harness {
    harness_with(false)
}

fn harness_with(dry_run: bool) -> Harness {
    let table_id = TableId::from_str("orders").unwrap();
    let store = Arc::new(MemoryParameterStore::new());
    let backup = Arc::new(MemoryBackupService::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let clock = Arc::new(ManualClock::new(start_time()));

    let controller = LifecycleController::new(
        ControllerConfig {
            table_id: table_id.clone(),
            window_minutes: 60,
            poll_interval: Duration::from_secs(30),
            retry: RetryPolicy {
                max_retries: 3,
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(100),
                backoff_multiplier: 2.0,
            },
            store_prefix: "/tidemark".to_string(),
            dry_run,
        },
        Arc::clone(&store) as Arc<dyn ParameterStore>,
        Arc::clone(&backup) as Arc<dyn BackupService>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    );

    Harness {
        store,
        backup,
        notifier,
        clock,
        controller,
        ns: TableNamespace::new("/tidemark", table_id),
    }
}

async fn seed(h: &Harness, key: ParamKey, value: &str) {
    h.store.put(&h.ns.key(key), value).await.unwrap();
}

async fn param(h: &Harness, key: ParamKey) -> Option<String> {
    match h.store.get(&h.ns.key(key)).await {
        Ok(v) => Some(v),
        Err(e) if e.is_not_found() => None,
        Err(e) => panic!("unexpected store error: {e}"),
    }
}

/// Seed an initiated workflow with a trusted incremental watermark
async fn seed_initiated(h: &Harness, watermark: DateTime<Utc>) {
    seed(h, ParamKey::Initiated, "true").await;
    seed(h, ParamKey::State, "NORMAL").await;
    seed(h, ParamKey::Action, "RUN").await;
    seed(
        h,
        ParamKey::LastIncrementalExportTime,
        &encode_timestamp(watermark),
    )
    .await;
}

#[tokio::test]
async fn first_cycle_runs_full_export_and_initiates() {
    let h = harness();

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::FullExportCompleted);

    assert_eq!(param(&h, ParamKey::Initiated).await.as_deref(), Some("true"));
    assert_eq!(param(&h, ParamKey::Action).await.as_deref(), Some("RUN"));
    assert_eq!(param(&h, ParamKey::State).await.as_deref(), Some("NORMAL"));
    assert!(param(&h, ParamKey::FullExportTime).await.is_some());
    assert!(param(&h, ParamKey::LastIncrementalExportTime).await.is_none());

    let started = h.backup.started_jobs();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].kind, ExportKind::Full);

    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, NotificationStatus::Success);
}

#[tokio::test]
async fn paused_workflow_does_nothing() {
    let h = harness();
    seed(&h, ParamKey::Action, "PAUSE").await;

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::Paused);

    assert!(h.backup.started_jobs().is_empty());
    assert!(h.notifier.events().is_empty());
}

#[tokio::test]
async fn pitr_disabled_notifies_and_fails() {
    let h = harness();
    h.backup.set_pitr(false, None);

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::PitrDisabled);

    assert!(h.backup.started_jobs().is_empty());
    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, NotificationStatus::Failed);
}

#[tokio::test]
async fn incremental_cycle_advances_watermark() {
    let h = harness();
    let watermark = start_time() - ChronoDuration::minutes(30);
    seed_initiated(&h, watermark).await;

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::IncrementalExportCompleted);

    let expected_to = watermark + ChronoDuration::minutes(60);
    assert_eq!(
        param(&h, ParamKey::LastIncrementalExportTime).await.as_deref(),
        Some(encode_timestamp(expected_to).as_str())
    );

    let started = h.backup.started_jobs();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].kind, ExportKind::Incremental);
    assert_eq!(started[0].export_from, Some(watermark));
    assert_eq!(started[0].export_to, Some(expected_to));

    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, NotificationStatus::Success);
}

#[tokio::test]
async fn missing_incremental_watermark_falls_back_to_full_export_time() {
    let h = harness();
    let full_time = start_time() - ChronoDuration::minutes(30);
    seed(&h, ParamKey::Initiated, "true").await;
    seed(&h, ParamKey::FullExportTime, &encode_timestamp(full_time)).await;

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::IncrementalExportCompleted);

    let started = h.backup.started_jobs();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].export_from, Some(full_time));
}

#[tokio::test]
async fn export_not_needed_when_window_end_elapsed() {
    let h = harness();
    // Window end = watermark + 60min = now - 60min, already behind now
    let watermark = start_time() - ChronoDuration::hours(2);
    seed_initiated(&h, watermark).await;

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::ExportNotNeeded);

    assert!(h.backup.started_jobs().is_empty());
    assert!(h.notifier.events().is_empty());
    // Watermark untouched
    assert_eq!(
        param(&h, ParamKey::LastIncrementalExportTime).await.as_deref(),
        Some(encode_timestamp(watermark).as_str())
    );
}

#[tokio::test]
async fn watermark_behind_pitr_window_enters_gap() {
    let h = harness();
    let watermark = start_time() - ChronoDuration::minutes(30);
    seed_initiated(&h, watermark).await;
    // Earliest restorable time is ahead of the watermark
    h.backup
        .set_pitr(true, Some(start_time() - ChronoDuration::minutes(10)));

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::PitrGapEntered);

    assert_eq!(param(&h, ParamKey::State).await.as_deref(), Some("PITR_GAP"));
    assert!(h.backup.started_jobs().is_empty());

    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, NotificationStatus::Failed);
}

#[tokio::test]
async fn invalid_export_time_beyond_retries_becomes_gap() {
    let h = harness();
    let watermark = start_time() - ChronoDuration::minutes(30);
    seed_initiated(&h, watermark).await;

    // First attempt plus both fixed-spacing retries all rejected
    for _ in 0..3 {
        h.backup
            .fail_next_incremental_start(BackupError::InvalidExportTime("future".to_string()));
    }

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::PitrGapEntered);

    assert_eq!(param(&h, ParamKey::State).await.as_deref(), Some("PITR_GAP"));
    assert!(h.backup.started_jobs().is_empty());
    // Two minutes of fixed-spacing waits went through the clock
    assert!(h.clock.now() >= start_time() + ChronoDuration::minutes(2));

    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, NotificationStatus::Failed);
}

#[tokio::test]
async fn invalid_export_time_recovers_within_retries() {
    let h = harness();
    let watermark = start_time() - ChronoDuration::minutes(30);
    seed_initiated(&h, watermark).await;

    h.backup
        .fail_next_incremental_start(BackupError::InvalidExportTime("future".to_string()));

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::IncrementalExportCompleted);
    assert_eq!(h.backup.started_jobs().len(), 1);
    assert_eq!(param(&h, ParamKey::State).await.as_deref(), Some("NORMAL"));
}

#[tokio::test]
async fn recorded_gap_without_reset_notifies_only() {
    let h = harness();
    seed(&h, ParamKey::Initiated, "true").await;
    seed(&h, ParamKey::State, "PITR_GAP").await;

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::PitrGapReported);

    assert!(h.backup.started_jobs().is_empty());
    assert_eq!(param(&h, ParamKey::State).await.as_deref(), Some("PITR_GAP"));

    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, NotificationStatus::Failed);
}

#[tokio::test]
async fn recorded_gap_with_cleared_initiated_flag_resets_via_full_export() {
    let h = harness();
    // The operator acknowledged the gap by clearing the initiated flag
    seed(&h, ParamKey::State, "PITR_GAP").await;
    let stale = start_time() - ChronoDuration::hours(3);
    seed(
        &h,
        ParamKey::LastIncrementalExportTime,
        &encode_timestamp(stale),
    )
    .await;

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::FullExportCompleted);

    assert_eq!(param(&h, ParamKey::State).await.as_deref(), Some("NORMAL"));
    assert_eq!(param(&h, ParamKey::Initiated).await.as_deref(), Some("true"));
    // The stale watermark was discarded with the reset
    assert!(param(&h, ParamKey::LastIncrementalExportTime).await.is_none());

    let started = h.backup.started_jobs();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].kind, ExportKind::Full);
}

#[tokio::test]
async fn resumes_full_export_left_running_by_earlier_cycle() {
    let h = harness();
    let table_id = TableId::from_str("orders").unwrap();
    h.backup.inject_running_full_export(&table_id);
    h.backup.set_polls_until_terminal(2);

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::FullExportCompleted);

    // No new export was started; the running one was polled to completion
    assert!(h.backup.started_jobs().is_empty());
    assert_eq!(param(&h, ParamKey::Initiated).await.as_deref(), Some("true"));

    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, NotificationStatus::Success);
}

#[tokio::test]
async fn failed_full_export_leaves_workflow_uninitiated_and_rerun_recovers() {
    let h = harness();
    h.backup.set_terminal_status(JobStatus::Failed);

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::FullExportFailed);
    assert!(param(&h, ParamKey::Initiated).await.is_none());

    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, NotificationStatus::Failed);

    // Re-running after the failure routes through the full export again
    h.backup.set_terminal_status(JobStatus::Completed);
    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::FullExportCompleted);
    assert_eq!(param(&h, ParamKey::Initiated).await.as_deref(), Some("true"));
    assert_eq!(h.backup.started_jobs().len(), 2);
}

#[tokio::test]
async fn unclassified_error_is_notified_exactly_once() {
    let h = harness();
    // Exhaust every retry with a non-transient failure on the full path
    h.backup
        .fail_next_full_start(BackupError::Other("internal error".to_string()));

    let err = h.controller.run_cycle().await.unwrap_err();
    assert!(err.to_string().contains("internal error"));

    let events = h.notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, NotificationStatus::Failed);
    assert!(events[0].message.contains("internal error"));
}

#[tokio::test]
async fn throttled_parameter_store_is_retried() {
    let h = harness();
    h.store.throttle_next(2);

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::FullExportCompleted);
}

#[tokio::test]
async fn dry_run_decides_without_side_effects() {
    let h = harness_with(true);

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::DryRun(CyclePath::FullExport));

    assert!(h.backup.started_jobs().is_empty());
    assert!(h.notifier.events().is_empty());
    assert!(param(&h, ParamKey::FullExportTime).await.is_none());
}

#[tokio::test]
async fn slow_export_job_is_polled_to_completion() {
    let h = harness();
    h.backup.set_polls_until_terminal(5);
    let before = h.clock.now();

    let outcome = h.controller.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::FullExportCompleted);

    // Five poll waits went through the manual clock
    assert!(h.clock.now() >= before + ChronoDuration::seconds(5 * 30));
}
