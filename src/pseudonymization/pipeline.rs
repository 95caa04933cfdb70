//! Document pipeline
//!
//! Runs the whole flow for one document:
//!
//! ```text
//! text ─┬─ tagger ──┐
//!       └─ pattern ─┴─ merge ─ span check ─ cluster ─ assign per group
//! ```
//!
//! Detection has no shared state, so [`DocumentPipeline::process_batch`]
//! runs it for every document concurrently on the blocking pool. Assignment
//! goes through the shared engine one document at a time, in input order.

use crate::domain::{PseudonymError, Result};
use crate::pseudonymization::audit::AuditLogger;
use crate::pseudonymization::clustering::cluster_variants;
use crate::pseudonymization::detector::EntityDetector;
use crate::pseudonymization::engine::CompositionalAssignmentEngine;
use crate::pseudonymization::merger::merge_detections;
use crate::pseudonymization::normalizer::strip_titles;
use crate::pseudonymization::models::{
    Candidate, CanonicalGroup, EntityType, PseudonymAssignment,
};
use crate::pseudonymization::report::BatchReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Reason attached when a group contains a partially overlapping detection
pub const OVERLAP_REASON: &str = "overlapping detections from different detectors";

/// A document to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub id: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Pseudonym chosen for one canonical group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAssignment {
    /// Index of the group in [`ProcessedDocument::groups`]
    pub group_index: usize,
    pub entity_type: EntityType,
    pub canonical_text: String,
    pub occurrences: usize,
    pub assignment: PseudonymAssignment,
}

/// Result of processing one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub document_id: String,
    /// Merged candidates, sorted by position
    pub candidates: Vec<Candidate>,
    pub groups: Vec<CanonicalGroup>,
    pub assignments: Vec<GroupAssignment>,
    pub processed_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

impl ProcessedDocument {
    /// Assignments flagged for human review
    pub fn ambiguous_assignments(&self) -> impl Iterator<Item = &GroupAssignment> {
        self.assignments.iter().filter(|a| a.assignment.is_ambiguous)
    }

    /// Rewrite `text` with every grouped mention replaced by its pseudonym
    ///
    /// Person titles are kept in front of the pseudonym. When mentions
    /// overlap the earliest one wins.
    pub fn pseudonymized_text(&self, text: &str) -> String {
        let mut replacements: Vec<(&Candidate, &str)> = self
            .assignments
            .iter()
            .filter_map(|a| self.groups.get(a.group_index).map(|group| (group, a)))
            .flat_map(|(group, a)| {
                group
                    .occurrences
                    .iter()
                    .map(move |c| (c, a.assignment.full.as_str()))
            })
            .collect();
        replacements.sort_by_key(|(c, _)| (c.start, std::cmp::Reverse(c.end)));

        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;
        for (candidate, pseudonym) in replacements {
            if candidate.start < cursor {
                continue;
            }
            let Some(before) = text.get(cursor..candidate.start) else {
                continue;
            };
            output.push_str(before);
            if candidate.entity_type == EntityType::Person {
                let bare = strip_titles(&candidate.text);
                output.push_str(candidate.text.strip_suffix(bare.as_str()).unwrap_or(""));
            }
            output.push_str(pseudonym);
            cursor = candidate.end;
        }
        output.push_str(text.get(cursor..).unwrap_or(""));
        output
    }
}

/// Detection, clustering and assignment for documents
pub struct DocumentPipeline {
    tagger: Option<Arc<dyn EntityDetector>>,
    pattern_detector: Arc<dyn EntityDetector>,
    engine: Arc<CompositionalAssignmentEngine>,
    audit_logger: Option<AuditLogger>,
}

impl DocumentPipeline {
    /// Create a pipeline with a pattern detector only
    pub fn new(
        pattern_detector: Arc<dyn EntityDetector>,
        engine: Arc<CompositionalAssignmentEngine>,
    ) -> Self {
        Self {
            tagger: None,
            pattern_detector,
            engine,
            audit_logger: None,
        }
    }

    /// Add a statistical tagger whose detections win on exact matches
    pub fn with_tagger(mut self, tagger: Arc<dyn EntityDetector>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    pub fn with_audit_logger(mut self, logger: AuditLogger) -> Self {
        self.audit_logger = Some(logger);
        self
    }

    pub fn engine(&self) -> &CompositionalAssignmentEngine {
        &self.engine
    }

    /// Process one document
    ///
    /// # Errors
    ///
    /// - [`PseudonymError::Validation`] for empty text or a candidate whose
    ///   span does not slice the document
    /// - [`PseudonymError::DetectionUnavailable`] when a detector fails
    /// - any assignment error from the engine
    pub fn process_document(&self, document_id: &str, text: &str) -> Result<ProcessedDocument> {
        let start = Instant::now();
        crate::log_document_start!(document_id, text.len());

        let candidates = detect_all(self.tagger.as_deref(), self.pattern_detector.as_ref(), text)?;
        self.assign_document(document_id, text, candidates, start)
    }

    /// Process documents with concurrent detection and serialized assignment
    ///
    /// A failing document is logged and counted in the report; the others are
    /// unaffected.
    pub async fn process_batch(
        &self,
        documents: Vec<SourceDocument>,
    ) -> (Vec<ProcessedDocument>, BatchReport) {
        let total = documents.len();
        let detections = futures::future::join_all(documents.into_iter().map(|document| {
            let tagger = self.tagger.clone();
            let pattern_detector = Arc::clone(&self.pattern_detector);
            async move {
                let start = Instant::now();
                let id = document.id.clone();
                let detected = tokio::task::spawn_blocking(move || {
                    detect_all(tagger.as_deref(), pattern_detector.as_ref(), &document.text)
                        .map(|candidates| (document, candidates))
                })
                .await
                .map_err(|e| {
                    PseudonymError::DetectionUnavailable(format!("detection task failed: {e}"))
                })
                .and_then(|result| result);
                (id, start, detected)
            }
        }))
        .await;

        let mut results = Vec::with_capacity(total);
        let mut report = BatchReport::new();

        for (index, (id, start, detected)) in detections.into_iter().enumerate() {
            crate::log_batch_progress!(index + 1, total);

            let processed = detected.and_then(|(document, candidates)| {
                crate::log_document_start!(document.id, document.text.len());
                self.assign_document(&document.id, &document.text, candidates, start)
            });

            match processed {
                Ok(document) => {
                    report.add_document(&document);
                    results.push(document);
                }
                Err(e) => {
                    crate::log_error_with_context!(&e, id.as_str());
                    report.add_failure(&id, &e);
                }
            }
        }

        match self.engine.library().check_exhaustion() {
            Ok(pct) => report.set_exhaustion(pct),
            Err(e) => {
                crate::log_error_with_context!(&e, "reading library exhaustion");
            }
        }

        (results, report)
    }

    fn assign_document(
        &self,
        document_id: &str,
        text: &str,
        candidates: Vec<Candidate>,
        start: Instant,
    ) -> Result<ProcessedDocument> {
        for candidate in &candidates {
            candidate.validate_span(text)?;
        }

        let groups = cluster_variants(&candidates);
        let mut assignments = Vec::with_capacity(groups.len());

        for (group_index, group) in groups.iter().enumerate() {
            let mut assignment =
                self.engine
                    .assign(&group.canonical.text, group.entity_type(), None)?;
            if !assignment.is_ambiguous && group.occurrences.iter().any(|c| c.is_ambiguous) {
                assignment = assignment.flagged(OVERLAP_REASON);
            }

            assignments.push(GroupAssignment {
                group_index,
                entity_type: group.entity_type(),
                canonical_text: group.canonical.text.clone(),
                occurrences: group.len(),
                assignment,
            });
        }

        let elapsed = start.elapsed();
        let processed = ProcessedDocument {
            document_id: document_id.to_string(),
            candidates,
            groups,
            assignments,
            processed_at: Utc::now(),
            processing_time_ms: elapsed.as_millis() as u64,
        };

        if let Some(logger) = &self.audit_logger {
            logger.log_document(&processed)?;
        }

        crate::log_document_complete!(document_id, processed.groups.len(), elapsed);
        Ok(processed)
    }
}

/// Run both detectors and merge their output
fn detect_all(
    tagger: Option<&dyn EntityDetector>,
    pattern_detector: &dyn EntityDetector,
    text: &str,
) -> Result<Vec<Candidate>> {
    if text.trim().is_empty() {
        return Err(PseudonymError::Validation("document text is empty".into()));
    }

    let tagged = match tagger {
        Some(tagger) => tagger.detect(text).map_err(as_detection_failure)?,
        None => Vec::new(),
    };
    let patterned = pattern_detector.detect(text).map_err(as_detection_failure)?;

    Ok(merge_detections(tagged, patterned))
}

fn as_detection_failure(error: PseudonymError) -> PseudonymError {
    match error {
        PseudonymError::DetectionUnavailable(_) => error,
        other => PseudonymError::DetectionUnavailable(other.to_string()),
    }
}
