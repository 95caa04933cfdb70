//! Entity detection
//!
//! Detectors turn raw document text into [`Candidate`]s. The pipeline runs a
//! statistical tagger and the [`RegexDetector`] side by side and reconciles
//! their output with the merger.

pub mod patterns;
pub mod regex;

pub use self::regex::RegexDetector;
pub use patterns::{CompiledPattern, PatternRegistry};

use crate::domain::Result;
use crate::pseudonymization::models::{Candidate, DetectionSource};

/// Trait for named-entity detectors
///
/// Implementations must return candidates whose spans slice the input text
/// exactly, and report [`PseudonymError::DetectionUnavailable`] when their
/// backend cannot run.
///
/// [`PseudonymError::DetectionUnavailable`]: crate::domain::PseudonymError::DetectionUnavailable
pub trait EntityDetector: Send + Sync {
    /// Attribution stamped on every candidate
    fn source(&self) -> DetectionSource;

    /// Detect entity candidates in a document
    fn detect(&self, text: &str) -> Result<Vec<Candidate>>;
}
