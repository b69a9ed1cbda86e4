//! Core export lifecycle logic
//!
//! The heart of the crate: the per-cycle decision machine and parameter
//! model ([`state`]), the window arithmetic ([`window`]), the retry policy
//! ([`retry`]), the controller that executes one cycle ([`controller`]) and
//! the scheduler that drives it ([`schedule`]).

pub mod controller;
pub mod retry;
pub mod schedule;
pub mod state;
pub mod window;

// Re-export commonly used types
pub use controller::{ControllerConfig, CycleOutcome, LifecycleController};
pub use retry::{retry_transient, RetryPolicy};
pub use schedule::Scheduler;
pub use state::machine::{decide, CyclePath, CycleSnapshot};
pub use state::params::{
    encode_timestamp, ParamKey, ParamSnapshot, TableNamespace, WorkflowAction, WorkflowState,
};
pub use window::{next_export_window, ExportWindow};
