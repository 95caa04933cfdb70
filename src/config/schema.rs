//! Configuration schema types
//!
//! Every section has defaults, so an empty TOML file is a valid
//! configuration that uses the bundled `neutral` library.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, mapped from `pseudonymizer.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PseudonymizerConfig {
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Pseudonym library selection
    #[serde(default)]
    pub library: LibraryConfig,

    /// Pattern detector settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Mapping store location
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Audit trail settings
    #[serde(default)]
    pub audit: AuditConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PseudonymizerConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.library.validate()?;
        self.detection.validate()?;
        self.mapping.validate()?;
        self.audit.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "application.log_level must be one of: {}",
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Pseudonym library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directory holding `{theme}.json` library files
    #[serde(default = "default_library_directory")]
    pub directory: PathBuf,

    /// Library theme (file stem)
    #[serde(default = "default_theme")]
    pub theme: String,

    /// French first-name gender lookup file
    #[serde(default = "default_gender_file")]
    pub gender_file: Option<PathBuf>,

    /// Seed for reproducible draws; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl LibraryConfig {
    fn validate(&self) -> Result<(), String> {
        let theme = self.theme.trim();
        if theme.is_empty() {
            return Err("library.theme cannot be empty".to_string());
        }
        if theme.contains(['/', '\\']) || theme.contains("..") {
            return Err(format!("library.theme '{theme}' must be a plain file stem"));
        }
        if self.directory.as_os_str().is_empty() {
            return Err("library.directory cannot be empty".to_string());
        }
        Ok(())
    }

    /// Path of the library file for the configured theme
    pub fn library_path(&self) -> PathBuf {
        self.directory.join(format!("{}.json", self.theme))
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            directory: default_library_directory(),
            theme: default_theme(),
            gender_file: default_gender_file(),
            seed: None,
        }
    }
}

/// Pattern detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Custom pattern library; the built-in French patterns are used when absent
    #[serde(default)]
    pub pattern_library: Option<PathBuf>,

    /// Minimum pattern confidence (0.0 - 1.0)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

impl DetectionConfig {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err("detection.confidence_threshold must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            pattern_library: None,
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

/// Mapping store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// JSON file holding every persisted entity mapping
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl MappingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.store_path.as_os_str().is_empty() {
            return Err("mapping.store_path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// JSON lines when true, one plain-text line per document otherwise
    #[serde(default = "default_true")]
    pub json_format: bool,
}

impl AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err("audit.log_path is required when audit is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_path: default_audit_log_path(),
            json_format: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON log files in addition to the console
    #[serde(default)]
    pub local_enabled: bool,

    #[serde(default = "default_local_path")]
    pub local_path: PathBuf,

    /// daily, hourly or never
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.to_lowercase().as_str()) {
            return Err(format!(
                "logging.local_rotation must be one of: {}",
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.as_os_str().is_empty() {
            return Err("logging.local_path is required when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_library_directory() -> PathBuf {
    PathBuf::from("data/pseudonyms")
}

fn default_theme() -> String {
    "neutral".to_string()
}

fn default_gender_file() -> Option<PathBuf> {
    Some(PathBuf::from("data/french_gender_names.json"))
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_store_path() -> PathBuf {
    PathBuf::from("output/mappings.json")
}

fn default_true() -> bool {
    true
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("audit/pseudonymization.log")
}

fn default_local_path() -> PathBuf {
    PathBuf::from("logs")
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: PseudonymizerConfig = toml::from_str("").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.library.theme, "neutral");
        assert_eq!(
            config.library.library_path(),
            PathBuf::from("data/pseudonyms/neutral.json")
        );
        assert!(config.audit.enabled);
        assert!(!config.logging.local_enabled);
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());
        config.log_level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_library_theme_validation() {
        let mut config = LibraryConfig::default();
        config.theme = " ".to_string();
        assert!(config.validate().is_err());
        config.theme = "../secrets".to_string();
        assert!(config.validate().is_err());
        config.theme = "star_wars".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_confidence_threshold_range() {
        let mut config = DetectionConfig::default();
        config.confidence_threshold = 1.2;
        assert!(config.validate().is_err());
        config.confidence_threshold = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_rotation_validation() {
        let mut config = LoggingConfig::default();
        config.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_audit_requires_path_when_enabled() {
        let mut config = AuditConfig::default();
        config.log_path = PathBuf::new();
        assert!(config.validate().is_err());
        config.enabled = false;
        assert!(config.validate().is_ok());
    }
}
