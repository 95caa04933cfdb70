//! Pattern library for entity detection

use crate::domain::{PseudonymError, Result};
use crate::pseudonymization::models::EntityType;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Name of the capture group that narrows a match to the entity itself
pub const ENTITY_GROUP: &str = "entity";

/// Pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    /// Regex patterns for this entry
    pub patterns: Vec<String>,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Entity type label (PERSON, LOCATION, ORG)
    pub entity_type: String,
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Name of the TOML entry the pattern comes from
    pub name: String,
    pub regex: Regex,
    pub entity_type: EntityType,
    pub confidence: f32,
}

impl CompiledPattern {
    /// Whether matches are narrowed to the `entity` group
    pub fn has_entity_group(&self) -> bool {
        self.regex.capture_names().flatten().any(|n| n == ENTITY_GROUP)
    }
}

/// Pattern library container
#[derive(Debug, Deserialize)]
struct PatternLibrary {
    // BTreeMap keeps compilation order stable across runs
    patterns: BTreeMap<String, PatternDefinition>,
}

/// Pattern registry for entity detection
#[derive(Debug)]
pub struct PatternRegistry {
    patterns: Vec<CompiledPattern>,
    patterns_by_type: HashMap<EntityType, Vec<CompiledPattern>>,
}

impl PatternRegistry {
    /// Create a pattern registry from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PseudonymError::Configuration(format!(
                "Failed to read pattern library {}: {e}",
                path.display()
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Create a pattern registry from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary = toml::from_str(content).map_err(|e| {
            PseudonymError::Configuration(format!("Failed to parse pattern library TOML: {e}"))
        })?;

        let mut patterns = Vec::new();
        let mut patterns_by_type: HashMap<EntityType, Vec<CompiledPattern>> = HashMap::new();

        for (name, def) in library.patterns {
            let entity_type: EntityType = def.entity_type.parse().map_err(|_| {
                PseudonymError::Configuration(format!(
                    "Invalid entity type in pattern '{name}': {}",
                    def.entity_type
                ))
            })?;

            if !(0.0..=1.0).contains(&def.confidence) {
                return Err(PseudonymError::Configuration(format!(
                    "Confidence of pattern '{name}' must be between 0.0 and 1.0"
                )));
            }

            for pattern_str in &def.patterns {
                let regex = Regex::new(pattern_str).map_err(|e| {
                    PseudonymError::Configuration(format!(
                        "Invalid regex in pattern '{name}': {e}"
                    ))
                })?;

                let compiled = CompiledPattern {
                    name: name.clone(),
                    regex,
                    entity_type,
                    confidence: def.confidence,
                };

                patterns.push(compiled.clone());
                patterns_by_type.entry(entity_type).or_default().push(compiled);
            }
        }

        tracing::debug!(patterns = patterns.len(), "Compiled entity patterns");

        Ok(Self {
            patterns,
            patterns_by_type,
        })
    }

    /// Create a registry with the built-in French patterns
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../../../patterns/fr_entity_patterns.toml");
        Self::from_toml(default_toml)
    }

    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Get patterns for a specific entity type
    pub fn patterns_for_type(&self, entity_type: EntityType) -> Option<&[CompiledPattern]> {
        self.patterns_by_type
            .get(&entity_type)
            .map(|v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_patterns() {
        let registry = PatternRegistry::default_patterns().unwrap();
        assert!(!registry.all_patterns().is_empty());
        for entity_type in EntityType::ALL {
            assert!(registry.patterns_for_type(entity_type).is_some());
        }
    }

    #[test]
    fn test_locative_pattern_narrows_to_entity() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let locations = registry.patterns_for_type(EntityType::Location).unwrap();
        let pattern = &locations[0];
        assert!(pattern.has_entity_group());

        let captures = pattern.regex.captures("Il habite à Lyon depuis 2019").unwrap();
        assert_eq!(&captures[ENTITY_GROUP], "Lyon");
    }

    #[test]
    fn test_invalid_entity_type_is_rejected() {
        let toml = r#"
            [patterns.dates]
            entity_type = "DATE"
            confidence = 0.9
            patterns = ['\d{4}']
        "#;
        let result = PatternRegistry::from_toml(toml);
        assert!(matches!(result, Err(PseudonymError::Configuration(msg)) if msg.contains("dates")));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let toml = r#"
            [patterns.broken]
            entity_type = "ORG"
            confidence = 0.9
            patterns = ['(unclosed']
        "#;
        assert!(matches!(
            PatternRegistry::from_toml(toml),
            Err(PseudonymError::Configuration(_))
        ));
    }

    #[test]
    fn test_out_of_range_confidence_is_rejected() {
        let toml = r#"
            [patterns.loud]
            entity_type = "ORG"
            confidence = 1.5
            patterns = ['Acme']
        "#;
        assert!(PatternRegistry::from_toml(toml).is_err());
    }
}
