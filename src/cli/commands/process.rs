//! Process command implementation
//!
//! This module implements the `process` command: pseudonymize text files,
//! write one JSON result per document and update the mapping store.

use crate::config::{load_config, PseudonymizerConfig};
use crate::domain::PseudonymError;
use crate::pseudonymization::{
    AuditLogger, BatchReport, CompositionalAssignmentEngine, DocumentPipeline, GenderDetector,
    InMemoryMappingRepository, ProcessedDocument, PseudonymLibrary, RegexDetector,
    SourceDocument,
};
use anyhow::Context;
use clap::Args;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Text files to pseudonymize
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Directory receiving `{document}.pseudonymized.json` files
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Override the library theme
    #[arg(long)]
    pub theme: Option<String>,

    /// Seed for reproducible pseudonym draws
    #[arg(long)]
    pub seed: Option<u64>,

    /// Documents processed between two mapping store saves
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,
}

/// Pseudonymized document written to the output directory
///
/// Real names are not part of this file; they live in the mapping store.
#[derive(Debug, Serialize)]
struct DocumentOutput<'a> {
    document_id: &'a str,
    source: String,
    processed_at: String,
    theme: &'a str,
    pseudonymized_text: String,
    entities: Vec<EntityOutput<'a>>,
}

#[derive(Debug, Serialize)]
struct EntityOutput<'a> {
    entity_type: &'a str,
    pseudonym: &'a str,
    occurrences: usize,
    is_ambiguous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ambiguity_reason: Option<&'a str>,
}

struct Runtime {
    pipeline: DocumentPipeline,
    repository: Arc<InMemoryMappingRepository>,
    theme: String,
}

impl ProcessArgs {
    /// Execute the process command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(files = self.files.len(), "Starting process command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        if let Some(theme) = &self.theme {
            tracing::info!(theme = %theme, "Overriding library theme from CLI");
            config.library.theme = theme.clone();
        }
        if let Some(seed) = self.seed {
            tracing::info!(seed, "Overriding library seed from CLI");
            config.library.seed = Some(seed);
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let runtime = match build_runtime(&config) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize pseudonymizer");
                eprintln!("Failed to initialize pseudonymizer: {e}");
                return Ok(match e {
                    PseudonymError::Configuration(_) => 2,
                    _ => 5, // Fatal error exit code
                });
            }
        };

        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;

        println!("🚀 Pseudonymizing {} document(s)...", self.files.len());
        println!();

        let mut report = BatchReport::new();
        let mut interrupted = false;

        for chunk in self.files.chunks(self.batch_size.max(1)) {
            if *shutdown_signal.borrow() {
                interrupted = true;
                break;
            }

            let mut documents = Vec::with_capacity(chunk.len());
            for path in chunk {
                let id = document_id(path);
                match std::fs::read_to_string(path) {
                    Ok(text) => documents.push(SourceDocument::new(id, text)),
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = %e, "Failed to read document");
                        report.add_failure(&id, &PseudonymError::from(e));
                    }
                }
            }

            let texts: HashMap<String, String> = documents
                .iter()
                .map(|d| (d.id.clone(), d.text.clone()))
                .collect();

            let (processed, chunk_report) = runtime.pipeline.process_batch(documents).await;
            report.merge(chunk_report);

            for (document, path) in processed.iter().filter_map(|d| {
                chunk
                    .iter()
                    .find(|path| document_id(path) == d.document_id)
                    .map(|path| (d, path))
            }) {
                let text = texts
                    .get(&document.document_id)
                    .map(String::as_str)
                    .unwrap_or_default();
                write_output(&self.output_dir, &runtime.theme, path, document, text)?;
                record_mappings(&runtime, document)?;
            }

            runtime
                .repository
                .save(&config.mapping.store_path)
                .with_context(|| {
                    format!(
                        "Failed to save mapping store {}",
                        config.mapping.store_path.display()
                    )
                })?;
        }

        print!("{}", report.format_console());

        let exit_code = if interrupted {
            println!("⚠️  Processing interrupted. Mappings saved for completed documents.");
            println!("   Run the command again on the remaining files.");
            println!();
            tracing::info!("Processing interrupted by user signal");
            130 // SIGINT exit code (standard Unix convention)
        } else if report.has_failures() {
            println!("⚠️  Processing completed with failures");
            1 // Partial success
        } else {
            println!("✅ Processing completed successfully!");
            0
        };

        Ok(exit_code)
    }
}

/// Wire library, repository, detectors and audit trail from configuration
fn build_runtime(config: &PseudonymizerConfig) -> crate::domain::Result<Runtime> {
    let library = Arc::new(PseudonymLibrary::load(
        &config.library.directory,
        &config.library.theme,
        config.library.seed,
    )?);

    let repository = Arc::new(InMemoryMappingRepository::load(&config.mapping.store_path)?);

    let mut engine = CompositionalAssignmentEngine::new(Arc::clone(&library), repository.clone())?;
    if let Some(gender_file) = &config.library.gender_file {
        if gender_file.exists() {
            engine = engine.with_gender_detector(Arc::new(GenderDetector::from_file(gender_file)?));
        } else {
            tracing::warn!(path = %gender_file.display(), "Gender lookup file not found, gender detection disabled");
        }
    }

    let detector = match &config.detection.pattern_library {
        Some(path) => RegexDetector::from_file(path)?,
        None => RegexDetector::new()?,
    }
    .with_confidence_threshold(config.detection.confidence_threshold);

    let mut pipeline = DocumentPipeline::new(Arc::new(detector), Arc::new(engine));
    if config.audit.enabled {
        pipeline = pipeline.with_audit_logger(AuditLogger::new(
            &config.audit.log_path,
            config.audit.json_format,
        )?);
    }

    Ok(Runtime {
        pipeline,
        repository,
        theme: config.library.theme.clone(),
    })
}

/// Document id derived from the file name
fn document_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn write_output(
    output_dir: &Path,
    theme: &str,
    source: &Path,
    document: &ProcessedDocument,
    text: &str,
) -> anyhow::Result<()> {
    let output = DocumentOutput {
        document_id: &document.document_id,
        source: source.display().to_string(),
        processed_at: document.processed_at.to_rfc3339(),
        theme,
        pseudonymized_text: document.pseudonymized_text(text),
        entities: document
            .assignments
            .iter()
            .map(|a| EntityOutput {
                entity_type: a.entity_type.label(),
                pseudonym: &a.assignment.full,
                occurrences: a.occurrences,
                is_ambiguous: a.assignment.is_ambiguous,
                ambiguity_reason: a.assignment.ambiguity_reason.as_deref(),
            })
            .collect(),
    };

    let path = output_dir.join(format!("{}.pseudonymized.json", document.document_id));
    let json = serde_json::to_string_pretty(&output)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Wrote pseudonymized document");
    Ok(())
}

/// Store every group assignment so later runs reuse it
fn record_mappings(runtime: &Runtime, document: &ProcessedDocument) -> anyhow::Result<()> {
    let engine = runtime.pipeline.engine();
    for group in &document.assignments {
        let entity =
            engine.persisted_entity(&group.canonical_text, group.entity_type, &group.assignment);
        runtime.repository.record(entity)?;
    }
    Ok(())
}
