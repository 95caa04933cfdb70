//! Configuration management
//!
//! TOML-based configuration with:
//! - `${VAR_NAME}` environment variable substitution
//! - `PSEUDO_<SECTION>_<KEY>` environment overrides
//! - defaults for every setting
//! - validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [library]
//! directory = "data/pseudonyms"
//! theme = "neutral"
//! gender_file = "data/french_gender_names.json"
//!
//! [detection]
//! confidence_threshold = 0.5
//!
//! [mapping]
//! store_path = "${PSEUDO_HOME}/mappings.json"
//!
//! [audit]
//! enabled = true
//! log_path = "audit/pseudonymization.log"
//! ```
//!
//! ```rust,no_run
//! use gdpr_pseudonymizer::config::load_config;
//!
//! match load_config("pseudonymizer.toml") {
//!     Ok(config) => println!("Using theme {}", config.library.theme),
//!     Err(e) => eprintln!("Configuration error: {e}"),
//! }
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, AuditConfig, DetectionConfig, LibraryConfig, LoggingConfig, MappingConfig,
    PseudonymizerConfig,
};
