//! In-memory adapter implementations
//!
//! Deterministic implementations of the collaborator traits, used by the
//! test suite and by the CLI's simulation mode. The backup service is
//! scriptable: tests can queue start failures, control how many polls a job
//! takes to finish, and choose the terminal status.

use crate::adapters::traits::{
    BackupService, NotificationEvent, Notifier, ParameterStore, TableBackupStatus,
};
use crate::domain::errors::{BackupError, ParamStoreError};
use crate::domain::ids::{ExportJobId, TableId};
use crate::domain::job::{ExportJob, ExportKind, JobStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// In-memory parameter store
///
/// A HashMap behind a mutex. Supports throttling injection for retry tests.
#[derive(Debug, Default)]
pub struct MemoryParameterStore {
    values: Mutex<HashMap<String, String>>,
    throttle_remaining: Mutex<usize>,
}

impl MemoryParameterStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` operations fail with `Throttled`
    pub fn throttle_next(&self, count: usize) {
        *self.throttle_remaining.lock().expect("store mutex poisoned") = count;
    }

    /// Current contents, for assertions
    pub fn dump(&self) -> HashMap<String, String> {
        self.values.lock().expect("store mutex poisoned").clone()
    }

    fn check_throttle(&self, key: &str) -> Result<(), ParamStoreError> {
        let mut remaining = self.throttle_remaining.lock().expect("store mutex poisoned");
        if *remaining > 0 {
            *remaining -= 1;
            return Err(ParamStoreError::Throttled(format!(
                "synthetic throttle on {}",
                key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ParameterStore for MemoryParameterStore {
    async fn get(&self, key: &str) -> Result<String, ParamStoreError> {
        self.check_throttle(key)?;
        self.values
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| ParamStoreError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ParamStoreError> {
        self.check_throttle(key)?;
        self.values
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ParamStoreError> {
        self.check_throttle(key)?;
        self.values
            .lock()
            .expect("store mutex poisoned")
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ParamStoreError::NotFound(key.to_string()))
    }
}

#[derive(Debug)]
struct BackupInner {
    pitr_enabled: bool,
    earliest_restorable_time: Option<DateTime<Utc>>,
    running_full_export: Option<ExportJobId>,
    jobs: HashMap<ExportJobId, ExportJob>,
    polls: HashMap<ExportJobId, u32>,
    polls_until_terminal: u32,
    terminal_status: JobStatus,
    start_full_errors: VecDeque<BackupError>,
    start_incremental_errors: VecDeque<BackupError>,
    started: Vec<ExportJob>,
    next_job_seq: u64,
}

impl Default for BackupInner {
    fn default() -> Self {
        Self {
            pitr_enabled: true,
            earliest_restorable_time: None,
            running_full_export: None,
            jobs: HashMap::new(),
            polls: HashMap::new(),
            polls_until_terminal: 0,
            terminal_status: JobStatus::Completed,
            start_full_errors: VecDeque::new(),
            start_incremental_errors: VecDeque::new(),
            started: Vec::new(),
            next_job_seq: 1,
        }
    }
}

/// Scriptable in-memory backup service
#[derive(Debug, Default)]
pub struct MemoryBackupService {
    inner: Mutex<BackupInner>,
}

impl MemoryBackupService {
    /// Create a service with PITR enabled and no earliest-restorable bound
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure PITR status
    pub fn set_pitr(&self, enabled: bool, earliest_restorable_time: Option<DateTime<Utc>>) {
        let mut inner = self.inner.lock().expect("backup mutex poisoned");
        inner.pitr_enabled = enabled;
        inner.earliest_restorable_time = earliest_restorable_time;
    }

    /// Terminal status jobs reach after polling
    pub fn set_terminal_status(&self, status: JobStatus) {
        self.inner
            .lock()
            .expect("backup mutex poisoned")
            .terminal_status = status;
    }

    /// Number of describe calls before a job reports a terminal status
    pub fn set_polls_until_terminal(&self, polls: u32) {
        self.inner
            .lock()
            .expect("backup mutex poisoned")
            .polls_until_terminal = polls;
    }

    /// Queue an error for the next `start_full_export` call
    pub fn fail_next_full_start(&self, error: BackupError) {
        self.inner
            .lock()
            .expect("backup mutex poisoned")
            .start_full_errors
            .push_back(error);
    }

    /// Queue an error for the next `start_incremental_export` call
    pub fn fail_next_incremental_start(&self, error: BackupError) {
        self.inner
            .lock()
            .expect("backup mutex poisoned")
            .start_incremental_errors
            .push_back(error);
    }

    /// Register a full export that is already running when the cycle starts
    pub fn inject_running_full_export(&self, table_id: &TableId) -> ExportJobId {
        let mut inner = self.inner.lock().expect("backup mutex poisoned");
        let job = Self::new_job(&mut inner, table_id, ExportKind::Full, None, None, Utc::now());
        let id = job.id.clone();
        inner.jobs.insert(id.clone(), job);
        inner.running_full_export = Some(id.clone());
        id
    }

    /// Every export start accepted so far, in order
    pub fn started_jobs(&self) -> Vec<ExportJob> {
        self.inner
            .lock()
            .expect("backup mutex poisoned")
            .started
            .clone()
    }

    fn new_job(
        inner: &mut BackupInner,
        table_id: &TableId,
        kind: ExportKind,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> ExportJob {
        let seq = inner.next_job_seq;
        inner.next_job_seq += 1;
        ExportJob {
            id: ExportJobId::new(format!("export/{:08}", seq)).expect("job id"),
            table_id: table_id.clone(),
            kind,
            status: JobStatus::Running,
            started_at: at,
            export_from: from,
            export_to: to,
        }
    }
}

#[async_trait]
impl BackupService for MemoryBackupService {
    async fn describe_backup_status(
        &self,
        _table_id: &TableId,
    ) -> Result<TableBackupStatus, BackupError> {
        let inner = self.inner.lock().expect("backup mutex poisoned");
        Ok(TableBackupStatus {
            pitr_enabled: inner.pitr_enabled,
            earliest_restorable_time: inner.earliest_restorable_time,
            running_full_export: inner.running_full_export.clone(),
        })
    }

    async fn start_full_export(&self, table_id: &TableId) -> Result<ExportJob, BackupError> {
        let mut inner = self.inner.lock().expect("backup mutex poisoned");
        if let Some(error) = inner.start_full_errors.pop_front() {
            return Err(error);
        }
        if !inner.pitr_enabled {
            return Err(BackupError::PitrDisabled(table_id.to_string()));
        }
        let job = Self::new_job(&mut inner, table_id, ExportKind::Full, None, None, Utc::now());
        inner.jobs.insert(job.id.clone(), job.clone());
        inner.started.push(job.clone());
        Ok(job)
    }

    async fn start_incremental_export(
        &self,
        table_id: &TableId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ExportJob, BackupError> {
        let mut inner = self.inner.lock().expect("backup mutex poisoned");
        if let Some(error) = inner.start_incremental_errors.pop_front() {
            return Err(error);
        }
        if !inner.pitr_enabled {
            return Err(BackupError::PitrDisabled(table_id.to_string()));
        }
        if let Some(earliest) = inner.earliest_restorable_time {
            if from < earliest {
                return Err(BackupError::OutsidePitrWindow(format!(
                    "{} precedes earliest restorable time {}",
                    from, earliest
                )));
            }
        }
        let job = Self::new_job(
            &mut inner,
            table_id,
            ExportKind::Incremental,
            Some(from),
            Some(to),
            Utc::now(),
        );
        inner.jobs.insert(job.id.clone(), job.clone());
        inner.started.push(job.clone());
        Ok(job)
    }

    async fn describe_export_job(&self, job_id: &ExportJobId) -> Result<ExportJob, BackupError> {
        let mut inner = self.inner.lock().expect("backup mutex poisoned");
        let polls_until_terminal = inner.polls_until_terminal;
        let terminal_status = inner.terminal_status;

        let polls = inner.polls.entry(job_id.clone()).or_insert(0);
        *polls += 1;
        let done = *polls > polls_until_terminal;

        let job = inner
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| BackupError::JobNotFound(job_id.to_string()))?;
        if done && !job.status.is_terminal() {
            job.status = terminal_status;
        }
        let job = job.clone();

        // A finished full export is no longer "running"
        if job.is_terminal() && inner.running_full_export.as_ref() == Some(job_id) {
            inner.running_full_export = None;
        }
        Ok(job)
    }
}

/// Recording in-memory notifier
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    events: Mutex<Vec<NotificationEvent>>,
    fail_publishes: Mutex<bool>,
}

impl MemoryNotifier {
    /// Create a notifier that records every event
    pub fn new() -> Self {
        Self::default()
    }

    /// Make publishes fail, for catch-all tests
    pub fn set_failing(&self, failing: bool) {
        *self.fail_publishes.lock().expect("notifier mutex poisoned") = failing;
    }

    /// Events published so far, in order
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn publish(&self, event: &NotificationEvent) -> Result<(), String> {
        if *self.fail_publishes.lock().expect("notifier mutex poisoned") {
            return Err("synthetic publish failure".to_string());
        }
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(event.clone());
        Ok(())
    }
}
