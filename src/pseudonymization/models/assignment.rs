//! Pseudonym assignment data models

use super::candidate::EntityType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gender used to pick a first-name pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Neutral,
}

/// Kind of person-name component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    FirstName,
    LastName,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Components parsed from one PERSON mention
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameComponents {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// True when the split into first/last could not be made with certainty
    pub is_ambiguous: bool,
}

impl NameComponents {
    /// Only one component was found (a bare first name or surname)
    pub fn is_standalone(&self) -> bool {
        self.is_ambiguous && self.last_name.is_none()
    }
}

/// Result of one pseudonym assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PseudonymAssignment {
    /// Full pseudonym to substitute for the mention
    pub full: String,
    /// Pseudonym first-name component (PERSON only)
    pub first: Option<String>,
    /// Pseudonym last-name component (PERSON only)
    pub last: Option<String>,
    /// Theme of the library that produced the pseudonym
    pub theme: String,
    /// Library exhaustion ratio (0.0 - 1.0) at the time of assignment
    pub exhaustion_pct: f64,
    /// Whether a reviewer should double-check this assignment
    pub is_ambiguous: bool,
    /// Why the assignment was flagged
    pub ambiguity_reason: Option<String>,
}

impl PseudonymAssignment {
    /// Flag the assignment as ambiguous with a reason
    pub fn flagged(mut self, reason: impl Into<String>) -> Self {
        self.is_ambiguous = true;
        self.ambiguity_reason = Some(reason.into());
        self
    }

    /// Clear any ambiguity flag
    pub fn unflagged(mut self) -> Self {
        self.is_ambiguous = false;
        self.ambiguity_reason = None;
        self
    }
}

/// Entity record as persisted by the mapping repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedEntity {
    pub entity_type: EntityType,
    /// Real (normalized) full name
    pub full_name: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub pseudonym_full: String,
    #[serde(default)]
    pub pseudonym_first: Option<String>,
    #[serde(default)]
    pub pseudonym_last: Option<String>,
    pub theme: String,
}

impl PersistedEntity {
    /// Build a record from an assignment and the real components it covers
    pub fn from_assignment(
        entity_type: EntityType,
        full_name: impl Into<String>,
        components: &NameComponents,
        assignment: &PseudonymAssignment,
    ) -> Self {
        Self {
            entity_type,
            full_name: full_name.into(),
            first_name: components.first_name.clone(),
            last_name: components.last_name.clone(),
            pseudonym_full: assignment.full.clone(),
            pseudonym_first: assignment.first.clone(),
            pseudonym_last: assignment.last.clone(),
            theme: assignment.theme.clone(),
        }
    }

    /// Pseudonym recorded for a given component of this entity, if the real
    /// component matches
    pub fn pseudonym_for(&self, text: &str, kind: ComponentKind) -> Option<&str> {
        match kind {
            ComponentKind::FirstName if self.first_name.as_deref() == Some(text) => {
                self.pseudonym_first.as_deref()
            }
            ComponentKind::LastName if self.last_name.as_deref() == Some(text) => {
                self.pseudonym_last.as_deref()
            }
            _ => None,
        }
    }
}
