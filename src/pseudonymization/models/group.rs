//! Canonical group of entity occurrences

use super::candidate::{Candidate, EntityType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// All occurrences believed to denote one real-world entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalGroup {
    /// Representative occurrence (longest text)
    pub canonical: Candidate,
    /// Occurrences sorted by document position
    pub occurrences: Vec<Candidate>,
    /// Distinct surface forms in the group
    pub variant_texts: BTreeSet<String>,
}

impl CanonicalGroup {
    /// Build a group from its occurrences
    ///
    /// Returns `None` for an empty occurrence list.
    pub fn from_occurrences(mut occurrences: Vec<Candidate>) -> Option<Self> {
        occurrences.sort_by_key(|c| (c.start, c.end));

        // max_by_key returns the last maximum, so scan in reverse to keep the earliest
        let canonical = occurrences
            .iter()
            .rev()
            .max_by_key(|c| c.text.chars().count())?
            .clone();

        let variant_texts = occurrences.iter().map(|c| c.text.clone()).collect();

        Some(Self {
            canonical,
            occurrences,
            variant_texts,
        })
    }

    pub fn entity_type(&self) -> EntityType {
        self.canonical.entity_type
    }

    /// Position of the first occurrence
    pub fn first_position(&self) -> usize {
        self.occurrences.first().map(|c| c.start).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pseudonymization::models::DetectionSource;

    fn person(text: &str, start: usize) -> Candidate {
        Candidate::new(
            text,
            EntityType::Person,
            start,
            start + text.len(),
            DetectionSource::Statistical,
        )
    }

    #[test]
    fn test_canonical_is_longest_and_earliest_on_tie() {
        let group = CanonicalGroup::from_occurrences(vec![
            person("Dubois", 40),
            person("Marie Dubois", 20),
            person("Alain Dubois", 0),
        ])
        .unwrap();

        assert_eq!(group.canonical.text, "Alain Dubois");
        assert_eq!(group.first_position(), 0);
        assert_eq!(group.occurrences[2].text, "Dubois");
        assert_eq!(group.variant_texts.len(), 3);
    }

    #[test]
    fn test_empty_occurrences() {
        assert!(CanonicalGroup::from_occurrences(Vec::new()).is_none());
    }
}
