// Tidemark - Continuous Incremental Backup Export Controller
// Copyright (c) 2025 Tidemark Contributors
// Licensed under the MIT License

//! # Tidemark - Continuous Incremental Backup Export Controller
//!
//! Tidemark keeps a continuous, gap-free stream of table backups flowing:
//! a full export establishes a baseline, then fixed-size incremental windows
//! advance a durable watermark, with point-in-time-recovery (PITR) gap
//! detection forcing a full-export reset whenever continuity breaks.
//!
//! ## Overview
//!
//! Each scheduled trigger runs one cycle per table:
//!
//! - **Read** the table's workflow parameters (action, state, initiated
//!   flag, watermarks) from the parameter store
//! - **Decide** exactly one path with a pure decision function: paused,
//!   PITR-disabled failure, await a running full export, full export,
//!   gap notification, or incremental export
//! - **Execute** the path, advancing watermarks and polling export jobs to
//!   a terminal status
//! - **Notify** a structured SUCCESS/FAILED event; every unhandled fault is
//!   published exactly once before the cycle ends
//!
//! ## Architecture
//!
//! Tidemark follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (decision machine, controller, windows,
//!   retry, scheduling)
//! - [`adapters`] - Collaborator traits and bindings (parameter store,
//!   backup service, notifier, clock)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tidemark::adapters::{
//!     BackupService, Clock, FileParameterStore, LogNotifier, MemoryBackupService, Notifier,
//!     ParameterStore, SystemClock,
//! };
//! use tidemark::core::{ControllerConfig, LifecycleController, RetryPolicy};
//! use tidemark::domain::TableId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store: Arc<dyn ParameterStore> = Arc::new(FileParameterStore::new("params.json"));
//!     let backup: Arc<dyn BackupService> = Arc::new(MemoryBackupService::new());
//!     let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::new());
//!     let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//!
//!     let controller = LifecycleController::new(
//!         ControllerConfig {
//!             table_id: "orders".parse::<TableId>()?,
//!             window_minutes: 60,
//!             poll_interval: Duration::from_secs(30),
//!             retry: RetryPolicy::default(),
//!             store_prefix: "/tidemark".to_string(),
//!             dry_run: false,
//!         },
//!         store,
//!         backup,
//!         notifier,
//!         clock,
//!     );
//!
//!     let outcome = controller.run_cycle().await?;
//!     println!("Cycle outcome: {outcome:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Watermark Trust
//!
//! The incremental watermark is only trusted when a full export has
//! completed once (`workflow-initiated=true`) and the workflow is not in a
//! PITR gap; otherwise the next window falls back to the full-export time:
//!
//! ```rust,no_run
//! use tidemark::core::{ParamSnapshot, TableNamespace};
//! use tidemark::adapters::MemoryParameterStore;
//! use tidemark::domain::TableId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryParameterStore::new();
//! let ns = TableNamespace::new("/tidemark", "orders".parse::<TableId>()?);
//!
//! let snapshot = ParamSnapshot::load(&store, &ns).await?;
//! let watermark = snapshot.export_watermark();
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Tidemark uses the [`domain::TidemarkError`] type for all errors:
//!
//! ```rust,no_run
//! use tidemark::domain::TidemarkError;
//!
//! fn example() -> Result<(), TidemarkError> {
//!     let config = tidemark::config::load_config("tidemark.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Tidemark uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn, error};
//!
//! info!(table_id = "orders", "Starting export lifecycle cycle");
//! warn!(table_id = "orders", "Watermark fell behind the PITR window");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
