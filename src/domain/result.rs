//! Result type alias for the pseudonymizer

use super::errors::PseudonymError;

/// Result type alias for pseudonymizer operations
///
/// # Examples
///
/// ```
/// use gdpr_pseudonymizer::domain::result::Result;
/// use gdpr_pseudonymizer::domain::errors::PseudonymError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(PseudonymError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, PseudonymError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(PseudonymError::Validation("test error".to_string()));
        assert!(result.is_err());
    }
}
