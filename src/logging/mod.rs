//! Logging and observability
//!
//! Structured logging built on `tracing`:
//! - console output for interactive runs
//! - optional JSON log files with daily or hourly rotation
//!
//! Real entity names never appear in log fields at info level or above; the
//! audit trail stores them hashed.
//!
//! # Example
//!
//! ```no_run
//! use gdpr_pseudonymizer::logging::init_logging;
//! use gdpr_pseudonymizer::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of document processing
///
/// # Example
///
/// ```no_run
/// use gdpr_pseudonymizer::log_document_start;
///
/// log_document_start!("interview-07.txt", 18_204);
/// ```
#[macro_export]
macro_rules! log_document_start {
    ($document_id:expr, $bytes:expr) => {
        tracing::info!(
            document_id = %$document_id,
            bytes = $bytes,
            "Processing document"
        );
    };
}

/// Log the completion of document processing
///
/// # Example
///
/// ```no_run
/// use gdpr_pseudonymizer::log_document_complete;
/// use std::time::Duration;
///
/// log_document_complete!("interview-07.txt", 12, Duration::from_millis(40));
/// ```
#[macro_export]
macro_rules! log_document_complete {
    ($document_id:expr, $groups:expr, $duration:expr) => {
        tracing::info!(
            document_id = %$document_id,
            groups = $groups,
            duration_ms = $duration.as_millis(),
            "Document processed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use gdpr_pseudonymizer::log_error_with_context;
/// use gdpr_pseudonymizer::domain::PseudonymError;
///
/// let error = PseudonymError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log batch progress
///
/// # Example
///
/// ```no_run
/// use gdpr_pseudonymizer::log_batch_progress;
///
/// log_batch_progress!(3, 10);
/// ```
#[macro_export]
macro_rules! log_batch_progress {
    ($current:expr, $total:expr) => {
        tracing::debug!(
            current = $current,
            total = $total,
            progress_pct = ($current as f64 / $total as f64 * 100.0),
            "Processing batch"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::PseudonymError;
    use std::time::Duration;

    #[test]
    fn test_macros_expand_without_subscriber() {
        let error = PseudonymError::Validation("empty".to_string());
        crate::log_document_start!("doc-1", 10usize);
        crate::log_document_complete!("doc-1", 2usize, Duration::from_millis(5));
        crate::log_error_with_context!(&error, "processing doc-1");
        crate::log_batch_progress!(1usize, 4usize);
    }
}
