//! Entity candidate data models

use crate::domain::{PseudonymError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named-entity type handled by the pseudonymizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// Person names (first, last, compound)
    Person,
    /// Cities, countries, regions
    Location,
    /// Companies, agencies, institutions
    Org,
}

impl EntityType {
    /// All entity types, in reporting order
    pub const ALL: [EntityType; 3] = [Self::Person, Self::Location, Self::Org];

    /// Get the wire label for the type
    pub fn label(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Location => "LOCATION",
            Self::Org => "ORG",
        }
    }

    /// Prefix used when minting `"{Prefix}-{NNN}"` fallback names
    pub fn fallback_prefix(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Location => "Location",
            Self::Org => "Org",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityType {
    type Err = PseudonymError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "PERSON" | "PER" => Ok(Self::Person),
            "LOCATION" | "LOC" => Ok(Self::Location),
            "ORG" | "ORGANIZATION" => Ok(Self::Org),
            _ => Err(PseudonymError::Validation(format!(
                "Unknown entity type: {s}"
            ))),
        }
    }
}

/// Which detector produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    /// Statistical tagger (spaCy/Stanza-like model)
    Statistical,
    /// Regex pattern matcher
    Pattern,
}

/// One detected mention of an entity at a specific text span
///
/// Spans are half-open UTF-8 byte offsets into the source document, so
/// `&document[start..end] == text` for every candidate built through
/// [`Candidate::from_span`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Surface text of the mention
    pub text: String,
    /// Entity type
    pub entity_type: EntityType,
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
    /// Detector confidence, when the detector reports one
    pub confidence: Option<f32>,
    /// Detector attribution
    pub source: DetectionSource,
    /// Set by the merger when this candidate partially overlaps another
    #[serde(default)]
    pub is_ambiguous: bool,
}

impl Candidate {
    /// Create a new candidate
    pub fn new(
        text: impl Into<String>,
        entity_type: EntityType,
        start: usize,
        end: usize,
        source: DetectionSource,
    ) -> Self {
        Self {
            text: text.into(),
            entity_type,
            start,
            end,
            confidence: None,
            source,
            is_ambiguous: false,
        }
    }

    /// Create a candidate by slicing `document[start..end]`
    ///
    /// # Errors
    ///
    /// Returns a validation error if the span is empty, out of bounds or not
    /// on a character boundary.
    pub fn from_span(
        document: &str,
        start: usize,
        end: usize,
        entity_type: EntityType,
        source: DetectionSource,
    ) -> Result<Self> {
        if start >= end {
            return Err(PseudonymError::Validation(format!(
                "Empty or inverted span [{start}, {end})"
            )));
        }
        let text = document.get(start..end).ok_or_else(|| {
            PseudonymError::Validation(format!(
                "Span [{start}, {end}) is outside the document or splits a character"
            ))
        })?;
        Ok(Self::new(text, entity_type, start, end, source))
    }

    /// Set the confidence score
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    /// Length of the mention text in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the mention text is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Half-open interval overlap test
    pub fn overlaps(&self, other: &Candidate) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }

    /// Identical span
    pub fn same_span(&self, other: &Candidate) -> bool {
        self.start == other.start && self.end == other.end
    }

    /// Whether `document[start..end]` still equals the candidate text
    pub fn span_matches(&self, document: &str) -> bool {
        document.get(self.start..self.end) == Some(self.text.as_str())
    }

    /// Check the span invariant against the source document
    pub fn validate_span(&self, document: &str) -> Result<()> {
        if self.span_matches(document) {
            Ok(())
        } else {
            Err(PseudonymError::Validation(format!(
                "Candidate span [{}, {}) does not match its text",
                self.start, self.end
            )))
        }
    }
}
