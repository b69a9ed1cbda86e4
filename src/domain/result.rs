//! Result type alias for Tidemark
//!
//! This module provides a convenient Result type alias that uses
//! TidemarkError as the error type.

use super::errors::TidemarkError;

/// Result type alias for Tidemark operations
///
/// This is a convenience type alias that uses `TidemarkError` as the error
/// type. Use this throughout the codebase for fallible operations.
///
/// # Examples
///
/// ```
/// use tidemark::domain::result::Result;
/// use tidemark::domain::errors::TidemarkError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(TidemarkError::State("watermark missing".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, TidemarkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::TidemarkError;

    #[test]
    fn test_result_ok() {
        let result: Result<i32> = Ok(42);
        assert!(result.is_ok());
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(TidemarkError::State("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
