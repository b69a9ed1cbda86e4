//! Run command implementation
//!
//! Executes export cycles for the configured tables: one cycle per table by
//! default, or the cadence-driven scheduler loop with `--loop`. The local
//! binding wires the file-backed parameter store, the in-memory backup
//! service and the log notifier; a cloud adapter plugs in at the same seam.

use crate::adapters::clock::SystemClock;
use crate::adapters::file::FileParameterStore;
use crate::adapters::log::LogNotifier;
use crate::adapters::memory::MemoryBackupService;
use crate::adapters::traits::{BackupService, Notifier, ParameterStore};
use crate::adapters::Clock;
use crate::config::{load_config, TidemarkConfig};
use crate::core::controller::{ControllerConfig, LifecycleController};
use crate::core::schedule::Scheduler;
use crate::core::state::params::{ParamKey, TableNamespace};
use crate::domain::ids::TableId;
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Dry run mode - log decisions without exports or parameter writes
    #[arg(long)]
    pub dry_run: bool,

    /// Override table(s) to run cycles for (comma-separated)
    #[arg(long)]
    pub table: Option<String>,

    /// Keep running on the derived cadence instead of a single pass
    #[arg(long = "loop")]
    pub run_loop: bool,

    /// Acknowledge a PITR gap before running: clears the initiated flag so
    /// the next cycle resets with a full export
    #[arg(long)]
    pub reset: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        // Apply CLI overrides
        if let Some(tables) = &self.table {
            tracing::info!(tables = %tables, "Overriding tables from CLI");
            config.export.tables = tables.clone();
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        let tables = match config.export.table_ids() {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Invalid table list: {e}");
                return Ok(2);
            }
        };

        if config.application.dry_run {
            println!("DRY RUN MODE - decisions are logged, nothing is exported");
            println!();
        }

        // Confirmation prompt (unless --yes, dry-run or loop mode)
        if !self.yes && !config.application.dry_run && !self.run_loop {
            println!("Run Configuration:");
            println!("  Tables: {:?}", tables.iter().map(TableId::as_str).collect::<Vec<_>>());
            println!("  Window: {} minutes", config.export.window_minutes);
            println!("  Store: {}", config.store.path);
            println!();
            print!("Proceed with export cycles? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Run cancelled.");
                return Ok(0);
            }
        }

        let store: Arc<dyn ParameterStore> =
            Arc::new(FileParameterStore::new(&config.store.path));

        if self.reset {
            if let Err(e) = clear_initiated_flags(store.as_ref(), &config, &tables).await {
                eprintln!("Failed to request reset: {e}");
                return Ok(5); // Fatal error exit code
            }
        }

        let backup: Arc<dyn BackupService> = Arc::new(MemoryBackupService::new());
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let controllers: Vec<Arc<LifecycleController>> = tables
            .iter()
            .map(|table_id| {
                Arc::new(LifecycleController::new(
                    ControllerConfig {
                        table_id: table_id.clone(),
                        window_minutes: config.export.window_minutes,
                        poll_interval: config.export.poll_interval(),
                        retry: config.export.retry.policy(),
                        store_prefix: config.store.prefix.clone(),
                        dry_run: config.application.dry_run,
                    },
                    Arc::clone(&store),
                    Arc::clone(&backup),
                    Arc::clone(&notifier),
                    Arc::clone(&clock),
                ))
            })
            .collect();

        if self.run_loop {
            let scheduler = Scheduler::new(controllers, clock, config.export.window_minutes);
            scheduler.run_loop(shutdown_signal).await;
            return Ok(0);
        }

        let mut failures = 0;
        for controller in &controllers {
            match controller.run_cycle().await {
                Ok(outcome) => {
                    println!("{}: {:?}", controller.table_id(), outcome);
                }
                Err(e) => {
                    eprintln!("{}: cycle failed: {e}", controller.table_id());
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            println!();
            println!("{failures} cycle(s) failed");
            Ok(1) // Cycle failure exit code
        } else {
            Ok(0)
        }
    }
}

/// Clear the initiated flag for each table, the operator's acknowledgement
/// that a recorded PITR gap should reset with a full export
async fn clear_initiated_flags(
    store: &dyn ParameterStore,
    config: &TidemarkConfig,
    tables: &[TableId],
) -> anyhow::Result<()> {
    for table_id in tables {
        let ns = TableNamespace::new(config.store.prefix.clone(), table_id.clone());
        let key = ns.key(ParamKey::Initiated);
        match store.delete(&key).await {
            Ok(()) => {
                tracing::info!(table_id = %table_id, "Reset requested, initiated flag cleared");
                println!("{table_id}: reset requested");
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(table_id = %table_id, "Initiated flag already absent");
            }
            Err(e) => return Err(anyhow::anyhow!("{e}")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_defaults() {
        let args = RunArgs {
            yes: false,
            dry_run: false,
            table: None,
            run_loop: false,
            reset: false,
        };

        assert!(!args.yes);
        assert!(!args.dry_run);
        assert!(args.table.is_none());
        assert!(!args.run_loop);
        assert!(!args.reset);
    }

    #[test]
    fn test_run_args_with_overrides() {
        let args = RunArgs {
            yes: true,
            dry_run: true,
            table: Some("orders,customers".to_string()),
            run_loop: true,
            reset: true,
        };

        assert!(args.yes);
        assert!(args.dry_run);
        assert_eq!(args.table, Some("orders,customers".to_string()));
        assert!(args.run_loop);
        assert!(args.reset);
    }
}
