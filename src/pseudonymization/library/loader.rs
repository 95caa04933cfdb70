//! Pseudonym library file loading and validation
//!
//! A library file is a JSON document named `{theme}.json`:
//!
//! ```json
//! {
//!   "theme": "neutral",
//!   "data_sources": { "first_names": "..." },
//!   "first_names": { "male": [], "female": [], "neutral": [] },
//!   "last_names": [],
//!   "locations": { "cities": [], "countries": [], "regions": [] },
//!   "organizations": { "companies": [], "agencies": [], "institutions": [] }
//! }
//! ```
//!
//! `countries` may also be spelled `planets` for fictional themes.

use super::fallback_suffix;
use crate::domain::{PseudonymError, Result};
use crate::pseudonymization::models::{EntityType, Gender};
use serde::Deserialize;
use std::path::Path;

/// Minimum number of first names across all gender categories
pub const MIN_FIRST_NAMES: usize = 500;

/// Minimum number of last names
pub const MIN_LAST_NAMES: usize = 500;

#[derive(Debug, Deserialize)]
struct LibraryFile {
    theme: String,
    #[allow(dead_code)]
    data_sources: serde_json::Value,
    first_names: FirstNamePools,
    last_names: Vec<String>,
    locations: LocationPools,
    organizations: OrganizationPools,
}

#[derive(Debug, Deserialize)]
struct FirstNamePools {
    #[serde(default)]
    male: Vec<String>,
    #[serde(default)]
    female: Vec<String>,
    #[serde(default)]
    neutral: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LocationPools {
    #[serde(default)]
    cities: Vec<String>,
    #[serde(default, alias = "planets")]
    countries: Vec<String>,
    #[serde(default)]
    regions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OrganizationPools {
    #[serde(default)]
    companies: Vec<String>,
    #[serde(default)]
    agencies: Vec<String>,
    #[serde(default)]
    institutions: Vec<String>,
}

/// Read-only name pools of one theme
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamePools {
    pub male_first_names: Vec<String>,
    pub female_first_names: Vec<String>,
    pub neutral_first_names: Vec<String>,
    pub last_names: Vec<String>,
    pub locations: Vec<String>,
    pub organizations: Vec<String>,
}

impl NamePools {
    /// First-name pool for a gender hint
    ///
    /// Falls back to the union of all categories when no hint is given or the
    /// matching category is empty.
    pub fn first_names_for(&self, gender: Option<Gender>) -> Vec<&str> {
        let pool = match gender {
            Some(Gender::Male) => &self.male_first_names,
            Some(Gender::Female) => &self.female_first_names,
            Some(Gender::Neutral) => &self.neutral_first_names,
            None => return self.all_first_names(),
        };
        if pool.is_empty() {
            return self.all_first_names();
        }
        pool.iter().map(String::as_str).collect()
    }

    pub fn all_first_names(&self) -> Vec<&str> {
        self.male_first_names
            .iter()
            .chain(&self.female_first_names)
            .chain(&self.neutral_first_names)
            .map(String::as_str)
            .collect()
    }

    pub fn last_names(&self) -> Vec<&str> {
        self.last_names.iter().map(String::as_str).collect()
    }

    /// Flat pool for an atomic entity type; empty for PERSON
    pub fn atomic_pool(&self, entity_type: EntityType) -> Vec<&str> {
        match entity_type {
            EntityType::Person => Vec::new(),
            EntityType::Location => self.locations.iter().map(String::as_str).collect(),
            EntityType::Org => self.organizations.iter().map(String::as_str).collect(),
        }
    }

    pub fn first_name_count(&self) -> usize {
        self.male_first_names.len() + self.female_first_names.len() + self.neutral_first_names.len()
    }

    /// Number of distinct full pseudonyms a type can produce from its pools
    pub fn capacity(&self, entity_type: EntityType) -> usize {
        match entity_type {
            EntityType::Person => self.first_name_count() * self.last_names.len(),
            EntityType::Location => self.locations.len(),
            EntityType::Org => self.organizations.len(),
        }
    }

    /// Pool entries that look like generated fallback names
    pub fn fallback_shaped(&self) -> Vec<&str> {
        self.male_first_names
            .iter()
            .chain(&self.female_first_names)
            .chain(&self.neutral_first_names)
            .chain(&self.last_names)
            .chain(&self.locations)
            .chain(&self.organizations)
            .map(String::as_str)
            .filter(|name| fallback_suffix(name).is_some())
            .collect()
    }
}

/// Load and validate `{directory}/{theme}.json`
pub fn load_library_file(directory: &Path, theme: &str) -> Result<NamePools> {
    let path = directory.join(format!("{theme}.json"));
    let content = std::fs::read_to_string(&path).map_err(|e| {
        PseudonymError::Configuration(format!(
            "Failed to read pseudonym library {}: {e}",
            path.display()
        ))
    })?;
    parse_library(&content, theme)
}

/// Parse and validate library JSON for the requested theme
pub fn parse_library(content: &str, theme: &str) -> Result<NamePools> {
    let file: LibraryFile = serde_json::from_str(content).map_err(|e| {
        PseudonymError::Configuration(format!("Invalid pseudonym library for theme '{theme}': {e}"))
    })?;

    if file.theme != theme {
        return Err(PseudonymError::Configuration(format!(
            "Library theme '{}' does not match requested theme '{theme}'",
            file.theme
        )));
    }

    let pools = NamePools {
        male_first_names: file.first_names.male,
        female_first_names: file.first_names.female,
        neutral_first_names: file.first_names.neutral,
        last_names: file.last_names,
        locations: [
            file.locations.cities,
            file.locations.countries,
            file.locations.regions,
        ]
        .concat(),
        organizations: [
            file.organizations.companies,
            file.organizations.agencies,
            file.organizations.institutions,
        ]
        .concat(),
    };

    if pools.first_name_count() < MIN_FIRST_NAMES {
        return Err(PseudonymError::Configuration(format!(
            "Library '{theme}' has {} first names, at least {MIN_FIRST_NAMES} required",
            pools.first_name_count()
        )));
    }
    if pools.last_names.len() < MIN_LAST_NAMES {
        return Err(PseudonymError::Configuration(format!(
            "Library '{theme}' has {} last names, at least {MIN_LAST_NAMES} required",
            pools.last_names.len()
        )));
    }

    let suspicious = pools.fallback_shaped();
    if !suspicious.is_empty() {
        tracing::warn!(
            theme,
            names = ?suspicious,
            "Library names look like fallback pseudonyms; counter restoration may skip them"
        );
    }

    tracing::info!(
        theme,
        first_names = pools.first_name_count(),
        last_names = pools.last_names.len(),
        locations = pools.locations.len(),
        organizations = pools.organizations.len(),
        "Loaded pseudonym library"
    );

    Ok(pools)
}
