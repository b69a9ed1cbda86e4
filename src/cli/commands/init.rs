//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "tidemark.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("Initializing Tidemark configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your table names", self.output);
                println!("  2. Pick an export window (15-1440 minutes)");
                println!("  3. Validate configuration: tidemark validate-config");
                println!("  4. Run a cycle: tidemark run");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Tidemark Configuration File
# Continuous incremental backup export controller

[application]
log_level = "info"
dry_run = false

[export]
# Comma-separated list of source tables
tables = "orders"
# Incremental export window size in minutes (15-1440)
window_minutes = 60
poll_interval_seconds = 30

[export.retry]
max_retries = 3
initial_delay_ms = 500
max_delay_ms = 30000
backoff_multiplier = 2.0

[store]
prefix = "/tidemark"
path = "tidemark-params.json"

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Tidemark Configuration File
# Continuous incremental backup export controller
#
# Environment variable substitution is supported with ${VAR_NAME} syntax,
# and any value can be overridden with TIDEMARK_<SECTION>_<KEY> variables
# (e.g. TIDEMARK_EXPORT_TABLES).

[application]
# Log level: trace, debug, info, warn, error
log_level = "info"
# Log the decision each cycle would take without exporting anything
dry_run = false

[export]
# Comma-separated list of source tables to manage
tables = "orders,customers"
# Incremental export window size in minutes (15-1440).
# The trigger cadence is derived as one third of this window.
window_minutes = 60
# Delay between export-job status polls
poll_interval_seconds = 30

[export.retry]
# Bounded retries with exponential backoff for transient failures
max_retries = 3
initial_delay_ms = 500
max_delay_ms = 30000
backoff_multiplier = 2.0

[notification]
# Reuse an existing topic instead of the controller's own channel
reuse_existing_topic = false
# topic_name = "backup-exports"
# email_endpoints = ["ops@example.com"]
# queue_endpoints = []

[store]
# Key prefix all per-table workflow parameters live under
prefix = "/tidemark"
# Path of the JSON file backing the local parameter store
path = "tidemark-params.json"

[logging]
# Rotated JSON file logging in addition to console output
local_enabled = true
local_path = "logs"
# Rotation policy: daily or hourly
local_rotation = "daily"
"#
        .to_string()
    }
}
