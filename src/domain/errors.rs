//! Domain error types
//!
//! This module defines the error hierarchy for the pseudonymizer. Errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main pseudonymizer error type
///
/// Every fallible library operation returns this error. The variants follow
/// the failure classes callers need to tell apart:
///
/// - [`Configuration`](Self::Configuration) is fatal and never retried
/// - [`Validation`](Self::Validation) is a caller error, raised before any state changes
/// - [`Exhaustion`](Self::Exhaustion) fails a single assignment and leaves state intact
/// - [`DetectionUnavailable`](Self::DetectionUnavailable) aborts one document only
/// - [`Internal`](Self::Internal) means a broken invariant and stops the run
#[derive(Debug, Error)]
pub enum PseudonymError {
    /// Missing or malformed library, pattern or configuration file
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid caller input (empty text, unknown entity type, bad span)
    #[error("Validation error: {0}")]
    Validation(String),

    /// No unused pseudonym remains for a component, even after fallback
    #[error("Pseudonym library exhausted for {entity_type} ({component})")]
    Exhaustion {
        entity_type: String,
        component: String,
    },

    /// A detector could not run (model missing, backend down)
    #[error("Detection unavailable: {0}")]
    DetectionUnavailable(String),

    /// Mapping repository lookup failed
    #[error("Mapping repository error: {0}")]
    Repository(String),

    /// Internal state can no longer be trusted (a lock was poisoned by a panic)
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PseudonymError {
    /// Builds an exhaustion error for an entity type and component label
    pub fn exhaustion(entity_type: impl Into<String>, component: impl Into<String>) -> Self {
        Self::Exhaustion {
            entity_type: entity_type.into(),
            component: component.into(),
        }
    }

    /// Whether the error only concerns the current document or call
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Exhaustion { .. } | Self::DetectionUnavailable(_)
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for PseudonymError {
    fn from(err: std::io::Error) -> Self {
        PseudonymError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PseudonymError {
    fn from(err: serde_json::Error) -> Self {
        PseudonymError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for PseudonymError {
    fn from(err: toml::de::Error) -> Self {
        PseudonymError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = PseudonymError::Configuration("theme mismatch".to_string());
        assert_eq!(err.to_string(), "Configuration error: theme mismatch");
    }

    #[test]
    fn test_exhaustion_error_display() {
        let err = PseudonymError::exhaustion("PERSON", "last_name");
        assert_eq!(
            err.to_string(),
            "Pseudonym library exhausted for PERSON (last_name)"
        );
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(PseudonymError::Validation("empty".to_string()).is_recoverable());
        assert!(PseudonymError::DetectionUnavailable("model".to_string()).is_recoverable());
        assert!(PseudonymError::exhaustion("ORG", "full").is_recoverable());
        assert!(!PseudonymError::Configuration("bad".to_string()).is_recoverable());
        assert!(!PseudonymError::Internal("poisoned".to_string()).is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: PseudonymError = io_err.into();
        assert!(matches!(err, PseudonymError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: PseudonymError = json_err.into();
        assert!(matches!(err, PseudonymError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: PseudonymError = toml_err.into();
        assert!(matches!(err, PseudonymError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let err = PseudonymError::Repository("locked".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
