//! Audit logging module
//!
//! Records which pseudonym each real entity received, per processed
//! document. Real names are stored as SHA-256 hashes only.

pub mod logger;

pub use logger::AuditLogger;
