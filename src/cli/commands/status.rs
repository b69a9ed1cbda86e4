//! Status command implementation
//!
//! This module implements the `status` command for displaying each table's
//! workflow state and watermarks from the parameter store.

use crate::adapters::file::FileParameterStore;
use crate::config::load_config;
use crate::core::state::params::{ParamSnapshot, TableNamespace};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Filter by table
    #[arg(long)]
    pub table: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking workflow status");

        println!("Export Workflow Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let tables = match config.export.table_ids() {
            Ok(t) => t,
            Err(e) => {
                println!("Invalid table list: {e}");
                return Ok(2);
            }
        };

        let tables: Vec<_> = tables
            .into_iter()
            .filter(|t| match &self.table {
                Some(filter) => t.as_str() == filter,
                None => true,
            })
            .collect();

        if tables.is_empty() {
            println!("No tables match the specified filter.");
            return Ok(0);
        }

        let store = FileParameterStore::new(&config.store.path);

        println!(
            "{:<30} {:<8} {:<10} {:<11} {:<22} {:<22}",
            "Table", "Action", "State", "Initiated", "Incremental Watermark", "Full Export"
        );
        println!("{}", "-".repeat(105));

        for table_id in tables {
            let ns = TableNamespace::new(config.store.prefix.clone(), table_id.clone());
            let snapshot = match ParamSnapshot::load(&store, &ns).await {
                Ok(s) => s,
                Err(e) => {
                    println!("{:<30} failed to load: {e}", table_id.as_str());
                    continue;
                }
            };

            let incremental = snapshot
                .last_incremental_export_time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "Never".to_string());
            let full = snapshot
                .full_export_time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "Never".to_string());

            println!(
                "{:<30} {:<8} {:<10} {:<11} {:<22} {:<22}",
                table_id.as_str(),
                snapshot.action.as_str(),
                snapshot.state.as_str(),
                snapshot.initiated,
                incremental,
                full
            );
        }

        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_args_defaults() {
        let args = StatusArgs { table: None };
        assert!(args.table.is_none());
    }

    #[test]
    fn test_status_args_with_filter() {
        let args = StatusArgs {
            table: Some("orders".to_string()),
        };
        assert_eq!(args.table, Some("orders".to_string()));
    }
}
