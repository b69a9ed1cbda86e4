//! Workflow state: durable parameters and the cycle decision machine
//!
//! [`params`] defines the per-table parameter keys and a typed snapshot of
//! them; [`machine`] is the pure decision function that picks the single
//! path a cycle takes from that snapshot.

pub mod machine;
pub mod params;

pub use machine::{decide, CyclePath, CycleSnapshot};
pub use params::{
    encode_timestamp, ParamKey, ParamSnapshot, TableNamespace, WorkflowAction, WorkflowState,
};
