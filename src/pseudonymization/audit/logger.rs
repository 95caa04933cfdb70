//! Audit logger for pseudonymization runs

use crate::domain::Result;
use crate::pseudonymization::pipeline::{GroupAssignment, ProcessedDocument};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One audit line per processed document
#[derive(Debug, Serialize)]
struct AuditLogEntry<'a> {
    timestamp: String,
    run_id: String,
    document_id: &'a str,
    candidates_count: usize,
    groups_count: usize,
    ambiguous_count: usize,
    processing_time_ms: u64,
    entities: Vec<AuditEntity<'a>>,
}

/// Audit record of one group (real name hashed)
#[derive(Debug, Serialize)]
struct AuditEntity<'a> {
    entity_type: &'a str,
    /// SHA-256 of the canonical real text; plaintext names are never logged
    value_hash: String,
    pseudonym: &'a str,
    occurrences: usize,
    is_ambiguous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ambiguity_reason: Option<&'a str>,
}

/// Append-only audit trail
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    run_id: Uuid,
}

impl AuditLogger {
    /// Create a logger appending to `log_path`, creating its directory
    pub fn new(log_path: impl Into<PathBuf>, json_format: bool) -> Result<Self> {
        let log_path = log_path.into();
        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let run_id = Uuid::new_v4();
        tracing::debug!(path = %log_path.display(), %run_id, "Audit logging enabled");

        Ok(Self {
            log_path,
            json_format,
            run_id,
        })
    }

    /// Identifier shared by every entry of this run
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Append the audit entry of a processed document
    pub fn log_document(&self, document: &ProcessedDocument) -> Result<()> {
        let entry = AuditLogEntry {
            timestamp: document.processed_at.to_rfc3339(),
            run_id: self.run_id.to_string(),
            document_id: &document.document_id,
            candidates_count: document.candidates.len(),
            groups_count: document.groups.len(),
            ambiguous_count: document.ambiguous_assignments().count(),
            processing_time_ms: document.processing_time_ms,
            entities: document.assignments.iter().map(audit_entity).collect(),
        };

        self.write_entry(&entry)
    }

    fn write_entry(&self, entry: &AuditLogEntry<'_>) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        if self.json_format {
            let json_line = serde_json::to_string(entry)?;
            writeln!(file, "{json_line}")?;
        } else {
            writeln!(
                file,
                "[{}] Run: {} | Document: {} | Candidates: {} | Groups: {} | Ambiguous: {} | Time: {}ms",
                entry.timestamp,
                entry.run_id,
                entry.document_id,
                entry.candidates_count,
                entry.groups_count,
                entry.ambiguous_count,
                entry.processing_time_ms
            )?;
        }

        Ok(())
    }
}

fn audit_entity(group: &GroupAssignment) -> AuditEntity<'_> {
    AuditEntity {
        entity_type: group.entity_type.label(),
        value_hash: hash_value(&group.canonical_text),
        pseudonym: &group.assignment.full,
        occurrences: group.occurrences,
        is_ambiguous: group.assignment.is_ambiguous,
        ambiguity_reason: group.assignment.ambiguity_reason.as_deref(),
    }
}

/// Hash a real entity name using SHA-256
pub fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}
