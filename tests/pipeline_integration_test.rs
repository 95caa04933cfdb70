//! Integration tests for batch processing, audit trail and mapping persistence

use gdpr_pseudonymizer::pseudonymization::audit::logger::hash_value;
use gdpr_pseudonymizer::pseudonymization::{
    AuditLogger, CompositionalAssignmentEngine, DocumentPipeline, EntityType, GenderDetector,
    InMemoryMappingRepository, ProcessedDocument, PseudonymLibrary, RegexDetector,
    SourceDocument,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

const LIBRARY_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/pseudonyms");
const GENDER_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/french_gender_names.json");

const LETTER: &str = "Madame,\n\nDr. Marie Dubois vous recevra à Lyon le 3 mars. \
                      Mme Dubois travaille avec la Société Horizon depuis 2019.\n";
const MEMO: &str = "Réunion à Lyon avec Dr. Marie Dubois et Jean MARTIN.";

fn pipeline_with(
    repository: Arc<InMemoryMappingRepository>,
    seed: u64,
    audit_path: Option<&Path>,
) -> DocumentPipeline {
    let library = Arc::new(PseudonymLibrary::load(LIBRARY_DIR, "neutral", Some(seed)).unwrap());
    let engine = CompositionalAssignmentEngine::new(library, repository)
        .unwrap()
        .with_gender_detector(Arc::new(GenderDetector::from_file(GENDER_FILE).unwrap()));
    let pipeline = DocumentPipeline::new(Arc::new(RegexDetector::new().unwrap()), Arc::new(engine));

    match audit_path {
        Some(path) => pipeline.with_audit_logger(AuditLogger::new(path, true).unwrap()),
        None => pipeline,
    }
}

fn pseudonym_of<'a>(document: &'a ProcessedDocument, entity_type: EntityType, canonical: &str) -> &'a str {
    document
        .assignments
        .iter()
        .find(|a| a.entity_type == entity_type && a.canonical_text == canonical)
        .map(|a| a.assignment.full.as_str())
        .unwrap_or_else(|| panic!("no {entity_type} group for {canonical}"))
}

fn record_all(
    pipeline: &DocumentPipeline,
    repository: &InMemoryMappingRepository,
    documents: &[ProcessedDocument],
) {
    for document in documents {
        for group in &document.assignments {
            let entity = pipeline.engine().persisted_entity(
                &group.canonical_text,
                group.entity_type,
                &group.assignment,
            );
            repository.record(entity).unwrap();
        }
    }
}

#[tokio::test]
async fn test_batch_is_consistent_across_documents() {
    let pipeline = pipeline_with(Arc::new(InMemoryMappingRepository::new()), 21, None);
    let (documents, report) = pipeline
        .process_batch(vec![
            SourceDocument::new("letter", LETTER),
            SourceDocument::new("memo", MEMO),
        ])
        .await;

    assert_eq!(documents.len(), 2);
    assert!(!report.has_failures());
    assert_eq!(
        pseudonym_of(&documents[0], EntityType::Location, "Lyon"),
        pseudonym_of(&documents[1], EntityType::Location, "Lyon")
    );
    assert_eq!(
        pseudonym_of(&documents[0], EntityType::Person, "Dr. Marie Dubois"),
        pseudonym_of(&documents[1], EntityType::Person, "Dr. Marie Dubois")
    );

    // "Mme Dubois" joins the full name in the letter
    let letter_people = documents[0]
        .groups
        .iter()
        .filter(|g| g.entity_type() == EntityType::Person)
        .count();
    assert_eq!(letter_people, 1);
}

#[tokio::test]
async fn test_audit_trail_hashes_real_names() {
    let dir = tempdir().unwrap();
    let audit_path = dir.path().join("audit").join("run.log");
    let pipeline = pipeline_with(Arc::new(InMemoryMappingRepository::new()), 22, Some(&audit_path));

    let (documents, report) = pipeline
        .process_batch(vec![
            SourceDocument::new("letter", LETTER),
            SourceDocument::new("blank", "   "),
        ])
        .await;
    assert_eq!(documents.len(), 1);
    assert_eq!(report.failures.len(), 1);

    let content = std::fs::read_to_string(&audit_path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(!content.contains("Dr. Marie Dubois"));
    assert!(content.contains(&hash_value("Dr. Marie Dubois")));
    assert!(content.contains(pseudonym_of(&documents[0], EntityType::Location, "Lyon")));
}

#[tokio::test]
async fn test_mappings_are_reused_after_restart() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("mappings.json");

    let repository = Arc::new(InMemoryMappingRepository::new());
    let first_run = pipeline_with(repository.clone(), 31, None);
    let (first_documents, _) = first_run
        .process_batch(vec![SourceDocument::new("letter", LETTER)])
        .await;
    record_all(&first_run, &repository, &first_documents);
    repository.save(&store).unwrap();

    // Different seed: reuse must come from the store, not from the draw order
    let restored = Arc::new(InMemoryMappingRepository::load(&store).unwrap());
    assert_eq!(restored.len(), repository.len());
    let second_run = pipeline_with(restored, 99, None);
    let (second_documents, _) = second_run
        .process_batch(vec![SourceDocument::new("memo", MEMO)])
        .await;

    assert_eq!(
        pseudonym_of(&first_documents[0], EntityType::Location, "Lyon"),
        pseudonym_of(&second_documents[0], EntityType::Location, "Lyon")
    );
    assert_eq!(
        pseudonym_of(&first_documents[0], EntityType::Person, "Dr. Marie Dubois"),
        pseudonym_of(&second_documents[0], EntityType::Person, "Dr. Marie Dubois")
    );

    // New people never receive a pseudonym already handed out
    let reused: Vec<&str> = first_documents[0]
        .assignments
        .iter()
        .map(|a| a.assignment.full.as_str())
        .collect();
    let martin = pseudonym_of(&second_documents[0], EntityType::Person, "Jean MARTIN");
    assert!(!reused.contains(&martin));
}
