//! Pseudonymization data models

pub mod assignment;
pub mod candidate;
pub mod group;

pub use assignment::{ComponentKind, Gender, NameComponents, PersistedEntity, PseudonymAssignment};
pub use candidate::{Candidate, DetectionSource, EntityType};
pub use group::CanonicalGroup;
