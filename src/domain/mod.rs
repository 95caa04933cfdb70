//! Domain types shared across the pseudonymizer.
//!
//! # Error Handling
//!
//! All fallible library operations return [`Result<T>`], which uses
//! [`PseudonymError`] as the error type:
//!
//! ```rust
//! use gdpr_pseudonymizer::domain::{PseudonymError, Result};
//!
//! fn example(text: &str) -> Result<()> {
//!     if text.trim().is_empty() {
//!         return Err(PseudonymError::Validation("empty text".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod result;

pub use errors::PseudonymError;
pub use result::Result;
