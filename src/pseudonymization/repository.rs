//! Mapping repository abstraction
//!
//! The engine looks up previously assigned pseudonyms through
//! [`MappingRepository`]; persistence itself belongs to the caller. Every
//! implementation must return matches in a stable order (insertion order
//! for [`InMemoryMappingRepository`]) because the engine reuses the first
//! match when several entities share a component.

use crate::domain::{PseudonymError, Result};
use crate::pseudonymization::models::{ComponentKind, EntityType, PersistedEntity};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Read access to persisted entity mappings
pub trait MappingRepository: Send + Sync {
    /// Entities whose real component of `kind` equals `text`, in stable order
    fn find_by_component(&self, text: &str, kind: ComponentKind) -> Result<Vec<PersistedEntity>>;

    /// Entity whose real full name equals `text`
    fn find_by_full_name(&self, text: &str) -> Result<Option<PersistedEntity>>;

    /// Every record, in stable order, used to seed a fresh library
    fn all_entities(&self) -> Result<Vec<PersistedEntity>>;

    /// Entity with this full name and entity type
    fn find_entity(&self, text: &str, entity_type: EntityType) -> Result<Option<PersistedEntity>> {
        Ok(self
            .find_by_full_name(text)?
            .filter(|e| e.entity_type == entity_type))
    }
}

/// Insertion-ordered in-memory repository with JSON import/export
#[derive(Debug, Default)]
pub struct InMemoryMappingRepository {
    entities: RwLock<Vec<PersistedEntity>>,
}

impl InMemoryMappingRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with existing records
    pub fn with_entities(entities: Vec<PersistedEntity>) -> Self {
        Self {
            entities: RwLock::new(entities),
        }
    }

    /// Load records from a JSON mapping store; a missing file yields an empty repository
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No mapping store yet, starting empty");
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)?;
        let entities: Vec<PersistedEntity> = serde_json::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            entities = entities.len(),
            "Loaded mapping store"
        );
        Ok(Self::with_entities(entities))
    }

    /// Write all records to a JSON mapping store
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&*self.read()?)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Record an entity unless the same `(type, full name)` is already stored
    ///
    /// Returns `true` when the record was added.
    pub fn record(&self, entity: PersistedEntity) -> Result<bool> {
        let mut entities = self.write()?;
        let exists = entities
            .iter()
            .any(|e| e.entity_type == entity.entity_type && e.full_name == entity.full_name);
        if exists {
            return Ok(false);
        }
        entities.push(entity);
        Ok(true)
    }

    /// Snapshot of every record, in insertion order
    pub fn all(&self) -> Result<Vec<PersistedEntity>> {
        Ok(self.read()?.clone())
    }

    pub fn len(&self) -> usize {
        self.entities.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<PersistedEntity>>> {
        self.entities
            .read()
            .map_err(|_| PseudonymError::Internal("mapping store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<PersistedEntity>>> {
        self.entities
            .write()
            .map_err(|_| PseudonymError::Internal("mapping store lock poisoned".to_string()))
    }
}

impl MappingRepository for InMemoryMappingRepository {
    fn find_by_component(&self, text: &str, kind: ComponentKind) -> Result<Vec<PersistedEntity>> {
        Ok(self
            .read()?
            .iter()
            .filter(|e| e.entity_type == EntityType::Person && e.pseudonym_for(text, kind).is_some())
            .cloned()
            .collect())
    }

    fn find_by_full_name(&self, text: &str) -> Result<Option<PersistedEntity>> {
        Ok(self.read()?.iter().find(|e| e.full_name == text).cloned())
    }

    fn all_entities(&self) -> Result<Vec<PersistedEntity>> {
        self.all()
    }

    fn find_entity(&self, text: &str, entity_type: EntityType) -> Result<Option<PersistedEntity>> {
        Ok(self
            .read()?
            .iter()
            .find(|e| e.full_name == text && e.entity_type == entity_type)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn person(full: &str, first: &str, last: &str, p_first: &str, p_last: &str) -> PersistedEntity {
        PersistedEntity {
            entity_type: EntityType::Person,
            full_name: full.to_string(),
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            pseudonym_full: format!("{p_first} {p_last}"),
            pseudonym_first: Some(p_first.to_string()),
            pseudonym_last: Some(p_last.to_string()),
            theme: "neutral".to_string(),
        }
    }

    fn location(full: &str, pseudonym: &str) -> PersistedEntity {
        PersistedEntity {
            entity_type: EntityType::Location,
            full_name: full.to_string(),
            first_name: None,
            last_name: None,
            pseudonym_full: pseudonym.to_string(),
            pseudonym_first: None,
            pseudonym_last: None,
            theme: "neutral".to_string(),
        }
    }

    #[test]
    fn test_find_by_component_in_insertion_order() {
        let repo = InMemoryMappingRepository::with_entities(vec![
            person("Marie Dubois", "Marie", "Dubois", "Luce", "Fabre"),
            person("Marie Dupont", "Marie", "Dupont", "Luce", "Vidal"),
            person("Jean Dubois", "Jean", "Dubois", "Paul", "Fabre"),
        ]);

        let marie = repo.find_by_component("Marie", ComponentKind::FirstName).unwrap();
        assert_eq!(marie.len(), 2);
        assert_eq!(marie[0].full_name, "Marie Dubois");

        let dubois = repo.find_by_component("Dubois", ComponentKind::LastName).unwrap();
        assert_eq!(dubois.len(), 2);
        assert_eq!(dubois[1].full_name, "Jean Dubois");

        assert!(repo
            .find_by_component("Dubois", ComponentKind::FirstName)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_find_entity_respects_type() {
        let repo = InMemoryMappingRepository::with_entities(vec![location("Orléans", "Valcourt")]);
        assert!(repo.find_by_full_name("Orléans").unwrap().is_some());
        assert!(repo
            .find_entity("Orléans", EntityType::Location)
            .unwrap()
            .is_some());
        assert!(repo.find_entity("Orléans", EntityType::Org).unwrap().is_none());
    }

    #[test]
    fn test_record_skips_duplicates() {
        let repo = InMemoryMappingRepository::new();
        assert!(repo.record(location("Paris", "Belrive")).unwrap());
        assert!(!repo.record(location("Paris", "Sorbiac")).unwrap());
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.all().unwrap()[0].pseudonym_full, "Belrive");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store").join("mappings.json");

        let repo = InMemoryMappingRepository::new();
        repo.record(person("Marie Dubois", "Marie", "Dubois", "Luce", "Fabre"))
            .unwrap();
        repo.record(location("Paris", "Belrive")).unwrap();
        repo.save(&path).unwrap();

        let loaded = InMemoryMappingRepository::load(&path).unwrap();
        assert_eq!(loaded.all().unwrap(), repo.all().unwrap());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let repo = InMemoryMappingRepository::load(dir.path().join("absent.json")).unwrap();
        assert!(repo.is_empty());
    }
}
