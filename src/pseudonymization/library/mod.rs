//! Pseudonym library
//!
//! Holds the themed name pools and the session state that keeps assignments
//! consistent: the used-pseudonym sets, the components already handed out,
//! and the per-type fallback counters.
//!
//! When no unused pseudonym can be built from the pools, the library mints a
//! deterministic fallback name `"{Prefix}-{NNN}"` (`Person-001`,
//! `Location-014`, `Org-002`). Counters never go backwards:
//! [`PseudonymLibrary::load_existing_mappings`] restores them from persisted
//! fallback names so a fresh instance never reissues one.

mod loader;

pub use loader::{load_library_file, parse_library, NamePools, MIN_FIRST_NAMES, MIN_LAST_NAMES};

use crate::domain::{PseudonymError, Result};
use crate::pseudonymization::models::{
    ComponentKind, EntityType, Gender, PersistedEntity, PseudonymAssignment,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Exhaustion ratio above which a warning is logged (once per library)
pub const EXHAUSTION_WARNING_THRESHOLD: f64 = 0.8;

/// Redraws of non-reused components before falling back
const MAX_REDRAWS: usize = 10;

/// Highest fallback counter value before the library reports exhaustion
const MAX_FALLBACK_COUNTER: u32 = 99_999;

const FALLBACK_PATTERN: &str = r"^(Person|Location|Org)-(\d+)$";

fn fallback_regex() -> &'static regex::Regex {
    static REGEX: OnceLock<regex::Regex> = OnceLock::new();
    REGEX.get_or_init(|| regex::Regex::new(FALLBACK_PATTERN).expect("fallback pattern is valid"))
}

/// Parse a fallback name into its entity type and counter value
pub(crate) fn fallback_suffix(name: &str) -> Option<(EntityType, u32)> {
    let captures = fallback_regex().captures(name)?;
    let entity_type = match &captures[1] {
        "Person" => EntityType::Person,
        "Location" => EntityType::Location,
        _ => EntityType::Org,
    };
    let value = captures[2].parse().ok()?;
    Some((entity_type, value))
}

/// Mutable library state, guarded as a whole
#[derive(Debug)]
struct LibraryState {
    used: HashMap<EntityType, HashSet<String>>,
    used_first_names: HashSet<String>,
    used_last_names: HashSet<String>,
    fallback_counters: HashMap<EntityType, u32>,
    exhaustion_warned: bool,
    rng: StdRng,
}

impl LibraryState {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            used: HashMap::new(),
            used_first_names: HashSet::new(),
            used_last_names: HashSet::new(),
            fallback_counters: HashMap::new(),
            exhaustion_warned: false,
            rng,
        }
    }

    fn is_used(&self, entity_type: EntityType, full: &str) -> bool {
        self.used
            .get(&entity_type)
            .is_some_and(|names| names.contains(full))
    }

    fn used_count(&self, entity_type: EntityType) -> usize {
        self.used.get(&entity_type).map_or(0, HashSet::len)
    }

    /// Next free fallback name and the counter value that produced it
    fn next_fallback(&self, entity_type: EntityType) -> Result<(String, u32)> {
        let mut counter = self
            .fallback_counters
            .get(&entity_type)
            .copied()
            .unwrap_or(0);

        loop {
            counter += 1;
            if counter > MAX_FALLBACK_COUNTER {
                return Err(PseudonymError::exhaustion(entity_type.label(), "fallback"));
            }
            let name = format!("{}-{counter:03}", entity_type.fallback_prefix());
            if !self.is_used(entity_type, &name) {
                return Ok((name, counter));
            }
        }
    }

    fn mark_used(&mut self, entity_type: EntityType, full: &str) {
        let inserted = self.used.entry(entity_type).or_default().insert(full.to_string());
        assert!(
            inserted,
            "pseudonym {full} handed out twice for {entity_type}"
        );
    }
}

/// Draw a component, preferring ones not yet handed out
fn draw(rng: &mut StdRng, pool: &[&str], used: &HashSet<String>) -> Option<String> {
    let unused: Vec<&str> = pool.iter().copied().filter(|n| !used.contains(*n)).collect();
    if let Some(name) = unused.choose(rng) {
        return Some((*name).to_string());
    }
    pool.choose(rng).map(|name| (*name).to_string())
}

/// Draft of an assignment, committed to the state only once complete
struct Draft {
    full: String,
    first: Option<String>,
    last: Option<String>,
    fallback_counter: Option<u32>,
}

/// Themed pseudonym pools plus session state
#[derive(Debug)]
pub struct PseudonymLibrary {
    theme: String,
    pools: NamePools,
    state: Mutex<LibraryState>,
}

impl PseudonymLibrary {
    /// Load and validate the library `{directory}/{theme}.json`
    pub fn load<P: AsRef<Path>>(directory: P, theme: &str, seed: Option<u64>) -> Result<Self> {
        let pools = load_library_file(directory.as_ref(), theme)?;
        Ok(Self::from_pools(theme, pools, seed))
    }

    /// Build a library from JSON content, with full validation
    pub fn from_json(content: &str, theme: &str, seed: Option<u64>) -> Result<Self> {
        let pools = parse_library(content, theme)?;
        Ok(Self::from_pools(theme, pools, seed))
    }

    /// Build a library from pools without size validation
    ///
    /// Small pools are useful to exercise collision and fallback paths.
    pub fn from_pools(theme: impl Into<String>, pools: NamePools, seed: Option<u64>) -> Self {
        Self {
            theme: theme.into(),
            pools,
            state: Mutex::new(LibraryState::new(seed)),
        }
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn pools(&self) -> &NamePools {
        &self.pools
    }

    fn lock(&self) -> Result<MutexGuard<'_, LibraryState>> {
        self.state
            .lock()
            .map_err(|_| PseudonymError::Internal("pseudonym library state poisoned".into()))
    }

    /// Assign a pseudonym
    ///
    /// For PERSON, `existing_first`/`existing_last` are reused verbatim and the
    /// missing components are drawn from the pools (first names by gender
    /// when the gender pool is non-empty). LOCATION and ORG draw atomically
    /// from their flat pools and ignore every hint.
    ///
    /// A full pseudonym that is already in use is redrawn a bounded number of
    /// times, then replaced by the next fallback name.
    ///
    /// # Errors
    ///
    /// [`PseudonymError::Exhaustion`] when a PERSON component pool is empty
    /// and no existing component was given, or the fallback counter is spent.
    /// The library state is unchanged on error.
    pub fn assign(
        &self,
        entity_type: EntityType,
        gender: Option<Gender>,
        existing_first: Option<&str>,
        existing_last: Option<&str>,
    ) -> Result<PseudonymAssignment> {
        let mut state = self.lock()?;

        let draft = match entity_type {
            EntityType::Person => {
                self.draft_person(&mut state, gender, existing_first, existing_last)?
            }
            EntityType::Location | EntityType::Org => self.draft_atomic(&mut state, entity_type)?,
        };

        Ok(self.commit(&mut state, entity_type, draft))
    }

    /// Assign a single PERSON component for a standalone mention
    ///
    /// The full pseudonym is the component itself.
    pub fn assign_standalone(
        &self,
        kind: ComponentKind,
        gender: Option<Gender>,
    ) -> Result<PseudonymAssignment> {
        let mut state = self.lock()?;
        let pool = match kind {
            ComponentKind::FirstName => self.pools.first_names_for(gender),
            ComponentKind::LastName => self.pools.last_names(),
        };

        let mut candidate = None;
        for _ in 0..=MAX_REDRAWS {
            let used = match kind {
                ComponentKind::FirstName => &state.used_first_names,
                ComponentKind::LastName => &state.used_last_names,
            };
            let mut rng = state.rng.clone();
            let drawn = draw(&mut rng, &pool, used)
                .ok_or_else(|| PseudonymError::exhaustion(EntityType::Person.label(), kind.as_str()))?;
            state.rng = rng;

            let collides = state.is_used(EntityType::Person, &drawn);
            candidate = Some(drawn);
            if !collides {
                break;
            }
        }

        let component = candidate
            .ok_or_else(|| PseudonymError::exhaustion(EntityType::Person.label(), kind.as_str()))?;
        let draft = if state.is_used(EntityType::Person, &component) {
            let (full, counter) = state.next_fallback(EntityType::Person)?;
            self.component_draft(kind, component, full, Some(counter))
        } else {
            let full = component.clone();
            self.component_draft(kind, component, full, None)
        };

        Ok(self.commit(&mut state, EntityType::Person, draft))
    }

    fn component_draft(
        &self,
        kind: ComponentKind,
        component: String,
        full: String,
        fallback_counter: Option<u32>,
    ) -> Draft {
        let (first, last) = match kind {
            ComponentKind::FirstName => (Some(component), None),
            ComponentKind::LastName => (None, Some(component)),
        };
        Draft {
            full,
            first,
            last,
            fallback_counter,
        }
    }

    fn draft_person(
        &self,
        state: &mut LibraryState,
        gender: Option<Gender>,
        existing_first: Option<&str>,
        existing_last: Option<&str>,
    ) -> Result<Draft> {
        let first_pool = self.pools.first_names_for(gender);
        let last_pool = self.pools.last_names();
        let mut rng = state.rng.clone();

        let mut last_attempt = None;
        for attempt in 0..=MAX_REDRAWS {
            let first = match existing_first {
                Some(first) => first.to_string(),
                None => draw(&mut rng, &first_pool, &state.used_first_names).ok_or_else(|| {
                    PseudonymError::exhaustion(EntityType::Person.label(), "first_name")
                })?,
            };
            let last = match existing_last {
                Some(last) => last.to_string(),
                None => draw(&mut rng, &last_pool, &state.used_last_names).ok_or_else(|| {
                    PseudonymError::exhaustion(EntityType::Person.label(), "last_name")
                })?,
            };

            let full = format!("{first} {last}");
            if !state.is_used(EntityType::Person, &full) {
                state.rng = rng;
                return Ok(Draft {
                    full,
                    first: Some(first),
                    last: Some(last),
                    fallback_counter: None,
                });
            }

            tracing::debug!(attempt, "Person pseudonym collision, redrawing");
            last_attempt = Some((first, last));
            if existing_first.is_some() && existing_last.is_some() {
                break;
            }
        }

        let (first, last) = last_attempt
            .ok_or_else(|| PseudonymError::exhaustion(EntityType::Person.label(), "full_name"))?;
        let (full, counter) = state.next_fallback(EntityType::Person)?;
        state.rng = rng;

        tracing::warn!(
            entity_type = %EntityType::Person,
            fallback = %full,
            "No unused person pseudonym left, using fallback name"
        );

        Ok(Draft {
            full,
            first: Some(first),
            last: Some(last),
            fallback_counter: Some(counter),
        })
    }

    fn draft_atomic(&self, state: &mut LibraryState, entity_type: EntityType) -> Result<Draft> {
        let pool: Vec<&str> = self
            .pools
            .atomic_pool(entity_type)
            .into_iter()
            .filter(|name| !state.is_used(entity_type, name))
            .collect();

        if let Some(name) = pool.choose(&mut state.rng) {
            return Ok(Draft {
                full: (*name).to_string(),
                first: None,
                last: None,
                fallback_counter: None,
            });
        }

        let (full, counter) = state.next_fallback(entity_type)?;
        tracing::warn!(
            entity_type = %entity_type,
            fallback = %full,
            "Pseudonym pool exhausted, using fallback name"
        );

        Ok(Draft {
            full,
            first: None,
            last: None,
            fallback_counter: Some(counter),
        })
    }

    fn commit(
        &self,
        state: &mut LibraryState,
        entity_type: EntityType,
        draft: Draft,
    ) -> PseudonymAssignment {
        state.mark_used(entity_type, &draft.full);
        if let Some(first) = &draft.first {
            state.used_first_names.insert(first.clone());
        }
        if let Some(last) = &draft.last {
            state.used_last_names.insert(last.clone());
        }
        if let Some(counter) = draft.fallback_counter {
            state.fallback_counters.insert(entity_type, counter);
        }

        let exhaustion_pct = self.exhaustion(state);

        PseudonymAssignment {
            full: draft.full,
            first: draft.first,
            last: draft.last,
            theme: self.theme.clone(),
            exhaustion_pct,
            is_ambiguous: false,
            ambiguity_reason: None,
        }
    }

    /// Usage-weighted exhaustion ratio, warning once past the threshold
    fn exhaustion(&self, state: &mut LibraryState) -> f64 {
        let mut weighted = 0.0;
        let mut total_used = 0usize;

        for entity_type in EntityType::ALL {
            let used = state.used_count(entity_type);
            if used == 0 {
                continue;
            }
            let capacity = self.pools.capacity(entity_type);
            let ratio = if capacity == 0 {
                1.0
            } else {
                (used as f64 / capacity as f64).min(1.0)
            };
            weighted += ratio * used as f64;
            total_used += used;
        }

        if total_used == 0 {
            return 0.0;
        }

        let pct = weighted / total_used as f64;
        if pct > EXHAUSTION_WARNING_THRESHOLD && !state.exhaustion_warned {
            state.exhaustion_warned = true;
            tracing::warn!(
                theme = %self.theme,
                exhaustion_pct = pct,
                "Pseudonym library above {:.0}% usage",
                EXHAUSTION_WARNING_THRESHOLD * 100.0
            );
        }
        pct
    }

    /// Current exhaustion ratio in `[0, 1]`
    pub fn check_exhaustion(&self) -> Result<f64> {
        let mut state = self.lock()?;
        Ok(self.exhaustion(&mut state))
    }

    /// Number of full pseudonyms handed out for a type
    pub fn used_count(&self, entity_type: EntityType) -> Result<usize> {
        Ok(self.lock()?.used_count(entity_type))
    }

    /// Claim a full pseudonym built outside the pools
    ///
    /// Used when a component already handed out becomes the full pseudonym
    /// of a standalone mention. Returns `false`, leaving the state untouched,
    /// when the name is already in use for this type.
    pub fn reserve(&self, entity_type: EntityType, full: &str) -> Result<bool> {
        let mut state = self.lock()?;
        if state.is_used(entity_type, full) {
            return Ok(false);
        }
        state.mark_used(entity_type, full);
        Ok(true)
    }

    /// Seed the session state from previously persisted assignments
    ///
    /// Records from other themes are ignored. Returns the number of records
    /// applied.
    pub fn load_existing_mappings(&self, entities: &[PersistedEntity]) -> Result<usize> {
        let mut state = self.lock()?;
        let mut applied = 0usize;

        for entity in entities.iter().filter(|e| e.theme == self.theme) {
            state
                .used
                .entry(entity.entity_type)
                .or_default()
                .insert(entity.pseudonym_full.clone());
            if let Some(first) = &entity.pseudonym_first {
                state.used_first_names.insert(first.clone());
            }
            if let Some(last) = &entity.pseudonym_last {
                state.used_last_names.insert(last.clone());
            }

            if let Some((entity_type, value)) = fallback_suffix(&entity.pseudonym_full) {
                if entity_type == entity.entity_type {
                    let counter = state.fallback_counters.entry(entity_type).or_insert(0);
                    *counter = (*counter).max(value);
                }
            }
            applied += 1;
        }

        tracing::info!(
            theme = %self.theme,
            applied,
            skipped = entities.len() - applied,
            person_counter = state.fallback_counters.get(&EntityType::Person).copied().unwrap_or(0),
            location_counter = state.fallback_counters.get(&EntityType::Location).copied().unwrap_or(0),
            org_counter = state.fallback_counters.get(&EntityType::Org).copied().unwrap_or(0),
            "Restored library state from existing mappings"
        );

        Ok(applied)
    }
}
