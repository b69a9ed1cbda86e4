//! Export job model
//!
//! An export job is the in-flight invocation of a full or incremental export
//! inside the backup subsystem. Jobs are created when an export starts and
//! polled until they reach a terminal status; they are never persisted.

use crate::domain::ids::{ExportJobId, TableId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal and non-terminal states of an export job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Export is still in progress
    Running,
    /// Export completed successfully
    Completed,
    /// Export failed
    Failed,
}

impl JobStatus {
    /// Whether the job has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Kind of export a job performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    /// Full export of the entire table
    Full,
    /// Incremental export of a [from, to) time window
    Incremental,
}

/// An export invocation as reported by the backup subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    /// Opaque job identifier
    pub id: ExportJobId,

    /// Table the job exports
    pub table_id: TableId,

    /// Full or incremental
    pub kind: ExportKind,

    /// Current status
    pub status: JobStatus,

    /// When the job was started
    pub started_at: DateTime<Utc>,

    /// Export window, present for incremental jobs only
    pub export_from: Option<DateTime<Utc>>,

    /// Export window end, present for incremental jobs only
    pub export_to: Option<DateTime<Utc>>,
}

impl ExportJob {
    /// Whether the job has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the job completed successfully
    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_job(status: JobStatus) -> ExportJob {
        ExportJob {
            id: ExportJobId::from_str("export/1").unwrap(),
            table_id: TableId::from_str("orders").unwrap(),
            kind: ExportKind::Full,
            status,
            started_at: Utc::now(),
            export_from: None,
            export_to: None,
        }
    }

    #[test]
    fn test_status_terminality() {
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_job_completion() {
        assert!(sample_job(JobStatus::Completed).is_completed());
        assert!(!sample_job(JobStatus::Failed).is_completed());
        assert!(!sample_job(JobStatus::Running).is_terminal());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&JobStatus::Running).unwrap();
        assert_eq!(json, "\"RUNNING\"");
        let status: JobStatus = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(status, JobStatus::Completed);
    }
}
