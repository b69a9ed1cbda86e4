//! Configuration management for Tidemark.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tidemark::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("tidemark.toml")?;
//!
//! println!("Tables: {}", config.export.tables);
//! println!("Window: {} minutes", config.export.window_minutes);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [export]
//! tables = "orders,customers"
//! window_minutes = 60
//!
//! [export.retry]
//! max_retries = 3
//! initial_delay_ms = 500
//!
//! [store]
//! prefix = "/tidemark"
//! path = "tidemark-params.json"
//! ```
//!
//! # Environment Variables
//!
//! Use `${VAR_NAME}` syntax inside the TOML file for substitution, and
//! `TIDEMARK_<SECTION>_<KEY>` variables (e.g. `TIDEMARK_EXPORT_TABLES`) for
//! overrides.
//!
//! # Validation
//!
//! Configuration is validated on load; in particular the export window size
//! must lie between 15 and 1440 minutes. Invalid configuration fails fast,
//! never at cycle time.

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, ExportConfig, LoggingConfig, NotificationConfig, RetryConfig, StoreConfig,
    TidemarkConfig, MAX_WINDOW_MINUTES, MIN_WINDOW_MINUTES,
};
