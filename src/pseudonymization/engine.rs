//! Compositional assignment engine
//!
//! Produces one pseudonym per entity mention while keeping PERSON names
//! compositionally consistent: a real first name or surname that was already
//! pseudonymized keeps its pseudonym component wherever it recurs.
//!
//! ```text
//! "Marie Dubois"  -> "Luce Fabre"
//! "Marie Dupont"  -> "Luce Vidal"    (first name reused)
//! "Marie"         -> "Luce"          (standalone, flagged ambiguous)
//! ```
//!
//! Component lookups check the session cache first, then the
//! [`MappingRepository`]. Only records of the library's theme are reused.
//! LOCATION and ORG mentions are atomic and go straight to the
//! [`PseudonymLibrary`].

use crate::domain::{PseudonymError, Result};
use crate::pseudonymization::gender::GenderDetector;
use crate::pseudonymization::library::PseudonymLibrary;
use crate::pseudonymization::models::{
    ComponentKind, EntityType, Gender, NameComponents, PersistedEntity, PseudonymAssignment,
};
use crate::pseudonymization::normalizer::{normalize_entity_text, parse_person_name};
use crate::pseudonymization::repository::MappingRepository;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Ambiguity reason for a bare first name or surname
pub const STANDALONE_REASON: &str = "standalone component without full name context";

/// Ambiguity reason for names of three words or more
pub const MULTI_WORD_REASON: &str = "Multiple word name — parsing uncertain";

/// Mappings established during this session
#[derive(Debug, Default)]
struct SessionCache {
    components: HashMap<(String, ComponentKind), String>,
    entities: HashMap<(EntityType, String), PseudonymAssignment>,
}

/// Assignment engine shared by every document of a session
pub struct CompositionalAssignmentEngine {
    library: Arc<PseudonymLibrary>,
    repository: Arc<dyn MappingRepository>,
    gender_detector: Option<Arc<GenderDetector>>,
    cache: Mutex<SessionCache>,
}

impl CompositionalAssignmentEngine {
    /// Create an engine without gender detection
    ///
    /// The library is seeded with every record already in the repository so
    /// that no recorded pseudonym is handed out again.
    pub fn new(
        library: Arc<PseudonymLibrary>,
        repository: Arc<dyn MappingRepository>,
    ) -> Result<Self> {
        library.load_existing_mappings(&repository.all_entities()?)?;
        Ok(Self {
            library,
            repository,
            gender_detector: None,
            cache: Mutex::new(SessionCache::default()),
        })
    }

    /// Derive gender from first names when the caller gives no hint
    pub fn with_gender_detector(mut self, detector: Arc<GenderDetector>) -> Self {
        self.gender_detector = Some(detector);
        self
    }

    pub fn library(&self) -> &PseudonymLibrary {
        &self.library
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionCache>> {
        self.cache
            .lock()
            .map_err(|_| PseudonymError::Internal("assignment cache poisoned".into()))
    }

    /// Assign a pseudonym to one entity mention
    ///
    /// An explicit `gender_hint` always wins over the gender detector.
    /// Re-assigning the same normalized entity returns the same pseudonym.
    ///
    /// # Errors
    ///
    /// - [`PseudonymError::Validation`] for empty text or a bare title
    /// - [`PseudonymError::Exhaustion`] when the library cannot produce a name
    /// - [`PseudonymError::Repository`] when a lookup fails
    pub fn assign(
        &self,
        entity_text: &str,
        entity_type: EntityType,
        gender_hint: Option<Gender>,
    ) -> Result<PseudonymAssignment> {
        if entity_text.trim().is_empty() {
            return Err(PseudonymError::Validation("entity text is empty".into()));
        }
        let key = normalize_entity_text(entity_text, entity_type);
        if key.is_empty() {
            return Err(PseudonymError::Validation(format!(
                "entity text '{entity_text}' contains no name"
            )));
        }

        let mut cache = self.lock()?;

        if let Some(known) = self.lookup_entity(&mut cache, &key, entity_type)? {
            return Ok(known);
        }

        let assignment = match entity_type {
            EntityType::Location | EntityType::Org => {
                self.library.assign(entity_type, None, None, None)?
            }
            EntityType::Person => {
                let components = parse_person_name(entity_text);
                if components.is_standalone() {
                    self.assign_standalone(&mut cache, &components, gender_hint)?
                } else {
                    self.assign_full_name(&mut cache, &components, gender_hint)?
                }
            }
        };

        tracing::debug!(
            entity_type = %entity_type,
            ambiguous = assignment.is_ambiguous,
            exhaustion_pct = assignment.exhaustion_pct,
            "Assigned pseudonym"
        );

        cache
            .entities
            .insert((entity_type, key), assignment.clone());
        Ok(assignment)
    }

    /// Record describing an assignment, ready for the mapping store
    pub fn persisted_entity(
        &self,
        entity_text: &str,
        entity_type: EntityType,
        assignment: &PseudonymAssignment,
    ) -> PersistedEntity {
        let components = match entity_type {
            EntityType::Person => standalone_aware_components(entity_text, assignment),
            EntityType::Location | EntityType::Org => NameComponents::default(),
        };
        PersistedEntity::from_assignment(
            entity_type,
            normalize_entity_text(entity_text, entity_type),
            &components,
            assignment,
        )
    }

    /// Previously assigned pseudonym for an identical entity
    fn lookup_entity(
        &self,
        cache: &mut SessionCache,
        key: &str,
        entity_type: EntityType,
    ) -> Result<Option<PseudonymAssignment>> {
        if let Some(known) = cache.entities.get(&(entity_type, key.to_string())) {
            return Ok(Some(known.clone()));
        }

        let Some(record) = self
            .repository
            .find_entity(key, entity_type)?
            .filter(|record| record.theme == self.library.theme())
        else {
            return Ok(None);
        };

        let mut assignment = PseudonymAssignment {
            full: record.pseudonym_full.clone(),
            first: record.pseudonym_first.clone(),
            last: record.pseudonym_last.clone(),
            theme: record.theme.clone(),
            exhaustion_pct: self.library.check_exhaustion()?,
            is_ambiguous: false,
            ambiguity_reason: None,
        };
        if entity_type == EntityType::Person {
            let components = parse_person_name(key);
            if components.is_standalone() {
                assignment = assignment.flagged(STANDALONE_REASON);
            } else if components.is_ambiguous {
                assignment = assignment.flagged(MULTI_WORD_REASON);
            }
            cache_components(cache, &components, &assignment);
        }

        cache
            .entities
            .insert((entity_type, key.to_string()), assignment.clone());
        Ok(Some(assignment))
    }

    /// Pseudonym already given to a real component
    fn lookup_component(
        &self,
        cache: &mut SessionCache,
        text: &str,
        kind: ComponentKind,
    ) -> Result<Option<String>> {
        let key = (text.to_string(), kind);
        if let Some(pseudonym) = cache.components.get(&key) {
            return Ok(Some(pseudonym.clone()));
        }

        let found = self
            .repository
            .find_by_component(text, kind)?
            .into_iter()
            .filter(|entity| entity.theme == self.library.theme())
            .find_map(|entity| entity.pseudonym_for(text, kind).map(str::to_string));

        if let Some(pseudonym) = &found {
            cache.components.insert(key, pseudonym.clone());
        }
        Ok(found)
    }

    fn resolve_gender(&self, first_name: Option<&str>, hint: Option<Gender>) -> Option<Gender> {
        hint.or_else(|| {
            let detector = self.gender_detector.as_ref()?;
            detector.detect(first_name?)
        })
    }

    fn assign_standalone(
        &self,
        cache: &mut SessionCache,
        components: &NameComponents,
        gender_hint: Option<Gender>,
    ) -> Result<PseudonymAssignment> {
        let word = components.first_name.as_deref().ok_or_else(|| {
            PseudonymError::Validation("person mention has no name component".into())
        })?;

        for kind in [ComponentKind::FirstName, ComponentKind::LastName] {
            let Some(pseudonym) = self.lookup_component(cache, word, kind)? else {
                continue;
            };
            // The component becomes a full pseudonym of its own
            if !self.library.reserve(EntityType::Person, &pseudonym)? {
                tracing::debug!(
                    component = %kind,
                    "Reused component already taken as a full pseudonym, drawing a new one"
                );
                continue;
            }
            let (first, last) = match kind {
                ComponentKind::FirstName => (Some(pseudonym.clone()), None),
                ComponentKind::LastName => (None, Some(pseudonym.clone())),
            };
            return Ok(PseudonymAssignment {
                full: pseudonym,
                first,
                last,
                theme: self.library.theme().to_string(),
                exhaustion_pct: self.library.check_exhaustion()?,
                is_ambiguous: false,
                ambiguity_reason: None,
            }
            .flagged(STANDALONE_REASON));
        }

        let kind = match &self.gender_detector {
            Some(detector) if detector.is_known_first_name(word) => ComponentKind::FirstName,
            Some(_) => ComponentKind::LastName,
            None if gender_hint.is_some() => ComponentKind::FirstName,
            None => ComponentKind::LastName,
        };
        let gender = match kind {
            ComponentKind::FirstName => self.resolve_gender(Some(word), gender_hint),
            ComponentKind::LastName => None,
        };

        let assignment = self.library.assign_standalone(kind, gender)?;
        let component = match kind {
            ComponentKind::FirstName => assignment.first.clone(),
            ComponentKind::LastName => assignment.last.clone(),
        };
        if let Some(component) = component {
            cache
                .components
                .entry((word.to_string(), kind))
                .or_insert(component);
        }

        Ok(assignment.flagged(STANDALONE_REASON))
    }

    fn assign_full_name(
        &self,
        cache: &mut SessionCache,
        components: &NameComponents,
        gender_hint: Option<Gender>,
    ) -> Result<PseudonymAssignment> {
        let first = components.first_name.as_deref();
        let last = components.last_name.as_deref();

        let existing_first = match first {
            Some(first) => self.lookup_component(cache, first, ComponentKind::FirstName)?,
            None => None,
        };
        let existing_last = match last {
            Some(last) => self.lookup_component(cache, last, ComponentKind::LastName)?,
            None => None,
        };

        let gender = self.resolve_gender(first, gender_hint);
        let assignment = self.library.assign(
            EntityType::Person,
            gender,
            existing_first.as_deref(),
            existing_last.as_deref(),
        )?;

        cache_components(cache, components, &assignment);

        Ok(if components.is_ambiguous {
            assignment.flagged(MULTI_WORD_REASON)
        } else {
            assignment.unflagged()
        })
    }
}

/// Remember the components of an assignment, never overriding earlier ones
fn cache_components(
    cache: &mut SessionCache,
    components: &NameComponents,
    assignment: &PseudonymAssignment,
) {
    let pairs = [
        (
            components.first_name.as_ref(),
            assignment.first.as_ref(),
            ComponentKind::FirstName,
        ),
        (
            components.last_name.as_ref(),
            assignment.last.as_ref(),
            ComponentKind::LastName,
        ),
    ];
    for (real, pseudonym, kind) in pairs {
        if let (Some(real), Some(pseudonym)) = (real, pseudonym) {
            cache
                .components
                .entry((real.clone(), kind))
                .or_insert_with(|| pseudonym.clone());
        }
    }
}

/// Real components matching what an assignment actually covers
///
/// A standalone surname stores its pseudonym as `last`; the record then
/// carries the real word as `last_name` so later lookups find it.
fn standalone_aware_components(entity_text: &str, assignment: &PseudonymAssignment) -> NameComponents {
    let mut components = parse_person_name(entity_text);
    if components.is_standalone() && assignment.first.is_none() && assignment.last.is_some() {
        components.last_name = components.first_name.take();
    }
    components
}
