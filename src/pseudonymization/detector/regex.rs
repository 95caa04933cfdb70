//! Regex-based entity detector

use super::patterns::{PatternRegistry, ENTITY_GROUP};
use super::EntityDetector;
use crate::domain::Result;
use crate::pseudonymization::models::{Candidate, DetectionSource};
use std::path::Path;
use std::sync::Arc;

/// Default minimum pattern confidence
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Regex-based entity detector
pub struct RegexDetector {
    pattern_registry: Arc<PatternRegistry>,
    confidence_threshold: f32,
}

impl RegexDetector {
    /// Create a new regex detector with the built-in patterns
    pub fn new() -> Result<Self> {
        Ok(Self::with_registry(PatternRegistry::default_patterns()?))
    }

    /// Create a regex detector from a custom pattern file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_registry(PatternRegistry::from_file(path)?))
    }

    /// Create a new regex detector with custom pattern registry
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            pattern_registry: Arc::new(registry),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Set the confidence threshold
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Run every pattern above the threshold over the text
    fn scan(&self, text: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for pattern in self.pattern_registry.all_patterns() {
            if pattern.confidence < self.confidence_threshold {
                continue;
            }

            for capture in pattern.regex.captures_iter(text) {
                let Some(matched) = capture.name(ENTITY_GROUP).or_else(|| capture.get(0)) else {
                    continue;
                };
                if matched.as_str().trim().is_empty() {
                    continue;
                }
                candidates.push(
                    Candidate::new(
                        matched.as_str(),
                        pattern.entity_type,
                        matched.start(),
                        matched.end(),
                        DetectionSource::Pattern,
                    )
                    .with_confidence(pattern.confidence),
                );
            }
        }

        candidates
    }
}

/// Drop candidates nested inside a longer candidate of the same type, and
/// exact duplicates
fn remove_nested(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    // Longest first at equal start, so containers precede what they contain
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let nested = kept.iter().any(|k| {
            k.entity_type == candidate.entity_type
                && k.start <= candidate.start
                && candidate.end <= k.end
        });
        if !nested {
            kept.push(candidate);
        }
    }
    kept
}

impl EntityDetector for RegexDetector {
    fn source(&self) -> DetectionSource {
        DetectionSource::Pattern
    }

    fn detect(&self, text: &str) -> Result<Vec<Candidate>> {
        let raw = self.scan(text);
        let raw_count = raw.len();
        let candidates = remove_nested(raw);

        tracing::debug!(
            matches = raw_count,
            candidates = candidates.len(),
            "Pattern detection complete"
        );

        Ok(candidates)
    }
}
