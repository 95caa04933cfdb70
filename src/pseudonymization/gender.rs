//! First-name gender lookup
//!
//! Loaded from a JSON file with `male`, `female` and `ambiguous` name lists.
//! Lookups are capitalization-insensitive and only the first hyphen segment
//! of a compound first name decides (`Jean-Marie` is looked up as `Jean`).

use crate::domain::{PseudonymError, Result};
use crate::pseudonymization::models::Gender;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct GenderLists {
    male: Vec<String>,
    female: Vec<String>,
    #[serde(default)]
    ambiguous: Vec<String>,
}

/// Capitalize a name: first letter upper case, the rest lower case
fn capitalize(name: &str) -> String {
    let mut chars = name.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Lookup key for a (possibly compound) first name
fn lookup_key(first_name: &str) -> String {
    let leading = first_name
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .split('-')
        .next()
        .unwrap_or_default();
    capitalize(leading)
}

/// Gender detector backed by French first-name lists
#[derive(Debug, Default)]
pub struct GenderDetector {
    male: HashSet<String>,
    female: HashSet<String>,
    ambiguous: HashSet<String>,
}

impl GenderDetector {
    /// Load the detector from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PseudonymError::Configuration(format!(
                "Failed to read gender lookup file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Build the detector from JSON content
    pub fn from_json(content: &str) -> Result<Self> {
        let lists: GenderLists = serde_json::from_str(content).map_err(|e| {
            PseudonymError::Configuration(format!("Invalid gender lookup file: {e}"))
        })?;

        let normalize = |names: Vec<String>| -> HashSet<String> {
            names
                .iter()
                .map(|n| capitalize(n))
                .filter(|n| !n.is_empty())
                .collect()
        };

        let detector = Self {
            male: normalize(lists.male),
            female: normalize(lists.female),
            ambiguous: normalize(lists.ambiguous),
        };

        tracing::debug!(
            male = detector.male.len(),
            female = detector.female.len(),
            ambiguous = detector.ambiguous.len(),
            "Loaded gender lookup"
        );

        Ok(detector)
    }

    /// Gender of a first name, `None` when unknown or ambiguous
    pub fn detect(&self, first_name: &str) -> Option<Gender> {
        let key = lookup_key(first_name);
        if key.is_empty() || self.ambiguous.contains(&key) {
            return None;
        }
        match (self.male.contains(&key), self.female.contains(&key)) {
            (true, false) => Some(Gender::Male),
            (false, true) => Some(Gender::Female),
            _ => None,
        }
    }

    /// Whether the name appears in any list
    pub fn is_known_first_name(&self, name: &str) -> bool {
        let key = lookup_key(name);
        self.male.contains(&key) || self.female.contains(&key) || self.ambiguous.contains(&key)
    }
}
