// GDPR Pseudonymizer - Consistent pseudonymization of French documents
// Copyright (c) 2025 GDPR Pseudonymizer Contributors
// Licensed under the MIT License

//! # GDPR Pseudonymizer
//!
//! Replaces the names of people, places and organizations in French text with
//! realistic pseudonyms, consistently across a whole corpus.
//!
//! ## Overview
//!
//! - **Detecting** entity mentions with French patterns and an optional tagger
//! - **Grouping** the variants of one entity ("Dr. Marie Dubois", "Mme Dubois")
//! - **Assigning** pseudonyms compositionally, so that two people sharing a
//!   surname keep sharing a pseudonymous surname
//! - **Persisting** mappings so later runs reuse earlier pseudonyms
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`pseudonymization`] - Detection, clustering, library and assignment
//! - [`domain`] - Error type and result alias
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gdpr_pseudonymizer::pseudonymization::{
//!     CompositionalAssignmentEngine, EntityType, InMemoryMappingRepository, PseudonymLibrary,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let library = Arc::new(PseudonymLibrary::load("data/pseudonyms", "neutral", Some(7))?);
//! let engine = CompositionalAssignmentEngine::new(
//!     library,
//!     Arc::new(InMemoryMappingRepository::new()),
//! )?;
//!
//! let marie = engine.assign("Marie Dubois", EntityType::Person, None)?;
//! let jean = engine.assign("Jean Dubois", EntityType::Person, None)?;
//! assert_eq!(marie.last, jean.last);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`] with [`domain::PseudonymError`]:
//!
//! ```rust,no_run
//! use gdpr_pseudonymizer::domain::PseudonymError;
//!
//! fn example() -> Result<(), PseudonymError> {
//!     let config = gdpr_pseudonymizer::config::load_config("pseudonymizer.toml")?;
//!     println!("theme: {}", config.library.theme);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
pub mod pseudonymization;
