//! Domain models and types for Tidemark.
//!
//! This module contains the core domain models, types, and business rules
//! for the export lifecycle controller.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`TableId`], [`ExportJobId`])
//! - **Export job model** ([`ExportJob`], [`JobStatus`])
//! - **Error types** ([`TidemarkError`], [`ParamStoreError`], [`BackupError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Tidemark uses the newtype pattern for identifiers to prevent mixing
//! different ID types:
//!
//! ```rust
//! use tidemark::domain::{TableId, ExportJobId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let table_id = TableId::new("orders")?;
//! let job_id = ExportJobId::new("export/01HWJ4J9M8")?;
//!
//! // This won't compile - type safety prevents mixing IDs
//! // let wrong: TableId = job_id;  // Compile error!
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, TidemarkError>`]:
//!
//! ```rust
//! use tidemark::domain::{Result, TidemarkError};
//!
//! fn example() -> Result<()> {
//!     Err(TidemarkError::State("no watermark".to_string()))
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod job;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{BackupError, ParamStoreError, TidemarkError};
pub use ids::{ExportJobId, TableId};
pub use job::{ExportJob, ExportKind, JobStatus};
pub use result::Result;
