//! External integrations
//!
//! The controller never talks to a concrete service directly; it is wired
//! against the traits in [`traits`]. This module also ships the bindings the
//! crate provides out of the box: a file-backed parameter store, a
//! log-based notifier, in-memory implementations for tests and simulation,
//! and the clock abstraction.

pub mod clock;
pub mod file;
pub mod log;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use file::FileParameterStore;
pub use log::LogNotifier;
pub use memory::{MemoryBackupService, MemoryNotifier, MemoryParameterStore};
pub use traits::{
    BackupService, NotificationEvent, NotificationStatus, Notifier, ParameterStore,
    TableBackupStatus,
};
