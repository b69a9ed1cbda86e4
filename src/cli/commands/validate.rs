//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Tidemark configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        // load_config validates on load
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Tables: {}", config.export.tables);
        println!("  Window: {} minutes", config.export.window_minutes);
        println!(
            "  Poll Interval: {} seconds",
            config.export.poll_interval_seconds
        );
        println!("  Max Retries: {}", config.export.retry.max_retries);
        println!("  Store Prefix: {}", config.store.prefix);
        println!("  Store Path: {}", config.store.path);
        if let Some(topic) = &config.notification.topic_name {
            println!("  Notification Topic: {topic}");
        }
        println!();
        Ok(0)
    }
}
