//! Pseudonymization of French documents
//!
//! Replaces personal names, locations and organizations with consistent,
//! realistic pseudonyms drawn from a themed library.
//!
//! # Architecture
//!
//! - **Detection**: pattern detector plus an optional statistical tagger,
//!   merged so that each span is reported once
//! - **Clustering**: variants of one entity (titles, prepositions, surname
//!   only) are grouped under a canonical form
//! - **Assignment**: the compositional engine reuses pseudonym components for
//!   shared first or last names and keeps mappings stable across documents
//! - **Audit**: one entry per document with hashed real names
//!
//! # Usage
//!
//! ```rust,ignore
//! use gdpr_pseudonymizer::pseudonymization::{
//!     CompositionalAssignmentEngine, DocumentPipeline, InMemoryMappingRepository,
//!     PseudonymLibrary, RegexDetector,
//! };
//! use std::sync::Arc;
//!
//! let library = Arc::new(PseudonymLibrary::load("data/pseudonyms", "neutral", None)?);
//! let engine = CompositionalAssignmentEngine::new(library, Arc::new(InMemoryMappingRepository::new()))?;
//! let pipeline = DocumentPipeline::new(Arc::new(RegexDetector::new()?), Arc::new(engine));
//! let processed = pipeline.process_document("doc-1", "Dr. Marie Dubois habite à Lyon.")?;
//! ```

pub mod audit;
pub mod clustering;
pub mod detector;
pub mod engine;
pub mod gender;
pub mod library;
pub mod merger;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod repository;

// Re-export main types
pub use audit::AuditLogger;
pub use detector::{EntityDetector, PatternRegistry, RegexDetector};
pub use engine::CompositionalAssignmentEngine;
pub use gender::GenderDetector;
pub use library::PseudonymLibrary;
pub use models::{
    Candidate, CanonicalGroup, ComponentKind, DetectionSource, EntityType, Gender,
    PersistedEntity, PseudonymAssignment,
};
pub use pipeline::{DocumentPipeline, ProcessedDocument, SourceDocument};
pub use report::BatchReport;
pub use repository::{InMemoryMappingRepository, MappingRepository};
