//! Cycle decision machine
//!
//! The branch topology of the export lifecycle workflow, expressed as a pure
//! function from an observed snapshot to the single path the cycle takes.
//! Keeping this free of I/O means the branch coverage can be verified
//! exhaustively without touching any collaborator.

use crate::core::state::params::{WorkflowAction, WorkflowState};
use serde::{Deserialize, Serialize};

/// Everything the decision depends on, observed at the start of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSnapshot {
    /// Operator pause/run switch
    pub action: WorkflowAction,

    /// Whether PITR is enabled on the source table
    pub pitr_enabled: bool,

    /// Whether a full export from an earlier cycle is still running
    pub full_export_running: bool,

    /// Lifecycle phase recorded in the parameter store
    pub state: WorkflowState,

    /// Whether a full export has completed at least once
    pub initiated: bool,

    /// Whether the operator has requested a reset with a fresh full export
    pub reset_requested: bool,
}

/// The single path a cycle takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePath {
    /// Operator paused the workflow; do nothing
    Paused,
    /// PITR is disabled; notify and fail
    PitrDisabledFail,
    /// A full export is still running; poll it to a terminal status
    AwaitFullExport,
    /// Run a full export (first run, or reset after a PITR gap)
    FullExport,
    /// A PITR gap is recorded and no reset was requested; notify only
    PitrGapNotify,
    /// Run an incremental export from the current watermark
    IncrementalExport,
}

/// Decide the path for one cycle
///
/// Branches are evaluated in strict priority order:
///
/// 1. paused
/// 2. PITR disabled
/// 3. full export still running
/// 4. PITR gap with a reset requested -> full export
/// 5. PITR gap without a reset -> notify only
/// 6. never initiated -> full export
/// 7. otherwise -> incremental export
///
/// Exactly one path results for every snapshot.
pub fn decide(snapshot: &CycleSnapshot) -> CyclePath {
    if snapshot.action == WorkflowAction::Pause {
        return CyclePath::Paused;
    }
    if !snapshot.pitr_enabled {
        return CyclePath::PitrDisabledFail;
    }
    if snapshot.full_export_running {
        return CyclePath::AwaitFullExport;
    }
    if snapshot.state == WorkflowState::PitrGap {
        return if snapshot.reset_requested {
            CyclePath::FullExport
        } else {
            CyclePath::PitrGapNotify
        };
    }
    if !snapshot.initiated {
        return CyclePath::FullExport;
    }
    CyclePath::IncrementalExport
}
