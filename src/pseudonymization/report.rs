//! Batch reporting
//!
//! Summarizes a batch run: entity counts, assignments that need review,
//! failed documents and final library exhaustion.

use crate::domain::PseudonymError;
use crate::pseudonymization::library::EXHAUSTION_WARNING_THRESHOLD;
use crate::pseudonymization::models::EntityType;
use crate::pseudonymization::pipeline::ProcessedDocument;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Most review entries rendered on the console
const MAX_CONSOLE_REVIEW_ENTRIES: usize = 20;

/// Assignment flagged for human review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub document_id: String,
    pub entity_type: EntityType,
    pub pseudonym: String,
    pub reason: String,
}

/// Document that could not be processed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub document_id: String,
    pub error: String,
    /// Whether other documents could still be processed after this failure
    pub recoverable: bool,
}

/// Summary of a batch run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub documents_processed: usize,

    /// Mentions detected, by entity type
    pub candidates_by_type: BTreeMap<EntityType, usize>,

    /// Distinct entities (canonical groups), by entity type
    pub groups_by_type: BTreeMap<EntityType, usize>,

    pub review: Vec<ReviewEntry>,

    pub failures: Vec<DocumentFailure>,

    /// Library exhaustion once the batch finished
    pub exhaustion_pct: f64,

    pub total_processing_time_ms: u64,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add results from a processed document
    pub fn add_document(&mut self, document: &ProcessedDocument) {
        self.documents_processed += 1;
        self.total_processing_time_ms += document.processing_time_ms;

        for candidate in &document.candidates {
            *self.candidates_by_type.entry(candidate.entity_type).or_insert(0) += 1;
        }
        for group in &document.groups {
            *self.groups_by_type.entry(group.entity_type()).or_insert(0) += 1;
        }

        for flagged in document.ambiguous_assignments() {
            self.review.push(ReviewEntry {
                document_id: document.document_id.clone(),
                entity_type: flagged.entity_type,
                pseudonym: flagged.assignment.full.clone(),
                reason: flagged
                    .assignment
                    .ambiguity_reason
                    .clone()
                    .unwrap_or_else(|| "unspecified".to_string()),
            });
        }
    }

    /// Record a failed document
    pub fn add_failure(&mut self, document_id: &str, error: &PseudonymError) {
        self.failures.push(DocumentFailure {
            document_id: document_id.to_string(),
            error: error.to_string(),
            recoverable: error.is_recoverable(),
        });
    }

    pub fn set_exhaustion(&mut self, pct: f64) {
        self.exhaustion_pct = pct;
    }

    /// Fold a later report into this one; exhaustion takes the later value
    pub fn merge(&mut self, other: BatchReport) {
        self.documents_processed += other.documents_processed;
        self.total_processing_time_ms += other.total_processing_time_ms;
        for (entity_type, count) in other.candidates_by_type {
            *self.candidates_by_type.entry(entity_type).or_insert(0) += count;
        }
        for (entity_type, count) in other.groups_by_type {
            *self.groups_by_type.entry(entity_type).or_insert(0) += count;
        }
        self.review.extend(other.review);
        self.failures.extend(other.failures);
        self.exhaustion_pct = other.exhaustion_pct;
    }

    pub fn total_groups(&self) -> usize {
        self.groups_by_type.values().sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                 PSEUDONYMIZATION BATCH REPORT                 \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n\n");

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "  Documents Processed:   {}\n",
            self.documents_processed
        ));
        output.push_str(&format!("  Documents Failed:      {}\n", self.failures.len()));
        output.push_str(&format!("  Distinct Entities:     {}\n", self.total_groups()));
        output.push_str(&format!("  Flagged for Review:    {}\n", self.review.len()));
        output.push_str(&format!(
            "  Library Exhaustion:    {:.1}%\n",
            self.exhaustion_pct * 100.0
        ));
        output.push_str(&format!(
            "  Total Processing Time: {} ms\n\n",
            self.total_processing_time_ms
        ));

        if !self.groups_by_type.is_empty() {
            output.push_str("🔍 ENTITIES BY TYPE\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            output.push_str(&format!("  {:12} {:>10} {:>10}\n", "Type", "Mentions", "Entities"));
            for entity_type in EntityType::ALL {
                let mentions = self.candidates_by_type.get(&entity_type).copied().unwrap_or(0);
                let entities = self.groups_by_type.get(&entity_type).copied().unwrap_or(0);
                output.push_str(&format!(
                    "  {:12} {:>10} {:>10}\n",
                    entity_type.label(),
                    mentions,
                    entities
                ));
            }
            output.push('\n');
        }

        if !self.review.is_empty() {
            output.push_str("📝 NEEDS REVIEW\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for entry in self.review.iter().take(MAX_CONSOLE_REVIEW_ENTRIES) {
                output.push_str(&format!(
                    "  [{}] {} \"{}\": {}\n",
                    entry.document_id,
                    entry.entity_type.label(),
                    entry.pseudonym,
                    entry.reason
                ));
            }
            if self.review.len() > MAX_CONSOLE_REVIEW_ENTRIES {
                output.push_str(&format!(
                    "  ... and {} more\n",
                    self.review.len() - MAX_CONSOLE_REVIEW_ENTRIES
                ));
            }
            output.push('\n');
        }

        let exhausted = self.exhaustion_pct > EXHAUSTION_WARNING_THRESHOLD;
        if !self.failures.is_empty() || exhausted {
            output.push_str("⚠️  WARNINGS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for failure in &self.failures {
                output.push_str(&format!("  • {}: {}\n", failure.document_id, failure.error));
            }
            if exhausted {
                output.push_str(&format!(
                    "  • Pseudonym library is {:.1}% used; consider a larger theme\n",
                    self.exhaustion_pct * 100.0
                ));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n\n");

        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pseudonymization::models::{
        Candidate, CanonicalGroup, DetectionSource, PseudonymAssignment,
    };
    use crate::pseudonymization::pipeline::GroupAssignment;
    use chrono::Utc;

    fn assignment(full: &str, reason: Option<&str>) -> PseudonymAssignment {
        PseudonymAssignment {
            full: full.to_string(),
            first: None,
            last: None,
            theme: "neutral".to_string(),
            exhaustion_pct: 0.1,
            is_ambiguous: reason.is_some(),
            ambiguity_reason: reason.map(str::to_string),
        }
    }

    fn document() -> ProcessedDocument {
        let durand = Candidate::new("Mme Durand", EntityType::Person, 0, 10, DetectionSource::Pattern);
        let lyon = Candidate::new("Lyon", EntityType::Location, 20, 24, DetectionSource::Pattern);
        let lyon_again = Candidate::new("Lyon", EntityType::Location, 40, 44, DetectionSource::Pattern);

        ProcessedDocument {
            document_id: "doc-7".to_string(),
            candidates: vec![durand.clone(), lyon.clone(), lyon_again.clone()],
            groups: vec![
                CanonicalGroup::from_occurrences(vec![durand]).unwrap(),
                CanonicalGroup::from_occurrences(vec![lyon, lyon_again]).unwrap(),
            ],
            assignments: vec![
                GroupAssignment {
                    group_index: 0,
                    entity_type: EntityType::Person,
                    canonical_text: "Mme Durand".to_string(),
                    occurrences: 1,
                    assignment: assignment("Fabre", Some("standalone component without full name context")),
                },
                GroupAssignment {
                    group_index: 1,
                    entity_type: EntityType::Location,
                    canonical_text: "Lyon".to_string(),
                    occurrences: 2,
                    assignment: assignment("Valbrune", None),
                },
            ],
            processed_at: Utc::now(),
            processing_time_ms: 12,
        }
    }

    #[test]
    fn test_add_document_counts() {
        let mut report = BatchReport::new();
        report.add_document(&document());

        assert_eq!(report.documents_processed, 1);
        assert_eq!(report.candidates_by_type.get(&EntityType::Location), Some(&2));
        assert_eq!(report.groups_by_type.get(&EntityType::Location), Some(&1));
        assert_eq!(report.total_groups(), 2);
        assert_eq!(report.review.len(), 1);
        assert_eq!(report.review[0].pseudonym, "Fabre");
        assert_eq!(report.total_processing_time_ms, 12);
    }

    #[test]
    fn test_add_failure() {
        let mut report = BatchReport::new();
        report.add_failure("doc-9", &PseudonymError::DetectionUnavailable("model".into()));
        assert!(report.has_failures());
        assert!(report.failures[0].recoverable);
        assert!(report.failures[0].error.contains("model"));
    }

    #[test]
    fn test_merge_accumulates() {
        let mut first = BatchReport::new();
        first.add_document(&document());
        first.set_exhaustion(0.1);

        let mut second = BatchReport::new();
        second.add_document(&document());
        second.add_failure("doc-9", &PseudonymError::Validation("document text is empty".into()));
        second.set_exhaustion(0.2);

        first.merge(second);
        assert_eq!(first.documents_processed, 2);
        assert_eq!(first.groups_by_type.get(&EntityType::Person), Some(&2));
        assert_eq!(first.review.len(), 2);
        assert_eq!(first.failures.len(), 1);
        assert_eq!(first.exhaustion_pct, 0.2);
    }

    #[test]
    fn test_format_console() {
        let mut report = BatchReport::new();
        report.add_document(&document());
        report.add_failure("doc-9", &PseudonymError::Validation("document text is empty".into()));
        report.set_exhaustion(0.85);

        let output = report.format_console();
        assert!(output.contains("PSEUDONYMIZATION BATCH REPORT"));
        assert!(output.contains("Documents Processed:   1"));
        assert!(output.contains("Documents Failed:      1"));
        assert!(output.contains("Library Exhaustion:    85.0%"));
        assert!(output.contains("NEEDS REVIEW"));
        assert!(output.contains("doc-9"));
        assert!(!output.contains("Mme Durand"));
    }

    #[test]
    fn test_format_json_round_trip() {
        let mut report = BatchReport::new();
        report.add_document(&document());
        let json = report.format_json().unwrap();
        let parsed: BatchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.documents_processed, 1);
        assert_eq!(parsed.groups_by_type, report.groups_by_type);
    }
}
