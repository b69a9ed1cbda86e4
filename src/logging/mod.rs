//! Logging and observability
//!
//! Structured logging for the export lifecycle controller:
//! - JSON-formatted file logs with rotation
//! - Console output for development
//! - Configurable log levels
//!
//! # Example
//!
//! ```no_run
//! use tidemark::logging::init_logging;
//! use tidemark::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};
