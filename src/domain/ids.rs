//! Domain identifier types with validation
//!
//! This module provides newtype wrappers for the identifiers Tidemark works
//! with. Each type ensures type safety and validates format on construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source table identifier newtype wrapper
///
/// Identifies the table whose exports a controller instance manages. Table
/// identifiers namespace every parameter-store key, so the allowed character
/// set is restricted to characters that are safe inside a key path.
///
/// # Examples
///
/// ```
/// use tidemark::domain::ids::TableId;
/// use std::str::FromStr;
///
/// let table_id = TableId::from_str("orders").unwrap();
/// assert_eq!(table_id.as_str(), "orders");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId(String);

impl TableId {
    /// Creates a new TableId from a string
    ///
    /// # Arguments
    ///
    /// * `id` - The table identifier string
    ///
    /// # Returns
    ///
    /// Returns `Ok(TableId)` if the ID is valid, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Table ID cannot be empty".to_string());
        }
        if id.len() > 255 {
            return Err(format!(
                "Table ID too long ({} characters, maximum 255)",
                id.len()
            ));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(format!(
                "Table ID may only contain alphanumerics, '.', '_' and '-', got: {}",
                id
            ));
        }
        Ok(Self(id))
    }

    /// Returns the table ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TableId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TableId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Export job identifier newtype wrapper
///
/// Identifies an in-flight full or incremental export invocation inside the
/// backup subsystem. Job IDs are opaque; they are only handed back to
/// `describe_export_job` while polling, never persisted.
///
/// # Examples
///
/// ```
/// use tidemark::domain::ids::ExportJobId;
/// use std::str::FromStr;
///
/// let job_id = ExportJobId::from_str("export/01HWJ4J9M8").unwrap();
/// assert_eq!(job_id.as_str(), "export/01HWJ4J9M8");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExportJobId(String);

impl ExportJobId {
    /// Creates a new ExportJobId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Export job ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the job ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ExportJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExportJobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ExportJobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_id_valid() {
        let id = TableId::new("orders-prod_v2.1").unwrap();
        assert_eq!(id.as_str(), "orders-prod_v2.1");
        assert_eq!(id.to_string(), "orders-prod_v2.1");
    }

    #[test]
    fn test_table_id_empty() {
        assert!(TableId::new("").is_err());
        assert!(TableId::new("   ").is_err());
    }

    #[test]
    fn test_table_id_invalid_characters() {
        assert!(TableId::new("orders/prod").is_err());
        assert!(TableId::new("orders prod").is_err());
    }

    #[test]
    fn test_table_id_too_long() {
        let long = "t".repeat(256);
        assert!(TableId::new(long).is_err());
    }

    #[test]
    fn test_table_id_from_str() {
        let id: TableId = "customers".parse().unwrap();
        assert_eq!(id.as_ref(), "customers");
    }

    #[test]
    fn test_export_job_id_valid() {
        let id = ExportJobId::new("export/01HWJ4J9M8").unwrap();
        assert_eq!(id.as_str(), "export/01HWJ4J9M8");
    }

    #[test]
    fn test_export_job_id_empty() {
        assert!(ExportJobId::new("").is_err());
    }

    #[test]
    fn test_ids_carry_distinct_types() {
        let table = TableId::new("orders").unwrap();
        let job = ExportJobId::new("orders").unwrap();
        // Same inner string, different types; mixing them up won't compile.
        assert_eq!(table.as_str(), job.as_str());
    }
}
