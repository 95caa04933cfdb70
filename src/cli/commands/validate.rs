//! Validation command implementations
//!
//! `validate-config` checks the configuration file; `validate-library` also
//! loads the configured pseudonym library and gender lookup.

use crate::config::load_config;
use crate::pseudonymization::library::load_library_file;
use crate::pseudonymization::{EntityType, GenderDetector};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                println!();
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Library: {}", config.library.library_path().display());
        println!(
            "  Seed: {}",
            config
                .library
                .seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "random".to_string())
        );
        println!(
            "  Patterns: {}",
            config
                .detection
                .pattern_library
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string())
        );
        println!(
            "  Confidence Threshold: {}",
            config.detection.confidence_threshold
        );
        println!("  Mapping Store: {}", config.mapping.store_path.display());
        println!(
            "  Audit: {}",
            if config.audit.enabled {
                config.audit.log_path.display().to_string()
            } else {
                "disabled".to_string()
            }
        );
        println!();
        Ok(0)
    }
}

/// Arguments for the validate-library command
#[derive(Args, Debug)]
pub struct ValidateLibraryArgs {
    /// Theme to check instead of the configured one
    #[arg(long)]
    pub theme: Option<String>,
}

impl ValidateLibraryArgs {
    /// Execute the validate-library command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let theme = self.theme.as_deref().unwrap_or(&config.library.theme);
        tracing::info!(theme = %theme, "Validating pseudonym library");
        println!(
            "🔍 Validating library '{theme}' in {}",
            config.library.directory.display()
        );
        println!();

        let pools = match load_library_file(&config.library.directory, theme) {
            Ok(p) => p,
            Err(e) => {
                println!("❌ Library is invalid");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        println!("✅ Library loaded successfully");
        println!();
        println!("Library Summary:");
        println!("  Male First Names: {}", pools.male_first_names.len());
        println!("  Female First Names: {}", pools.female_first_names.len());
        println!("  Neutral First Names: {}", pools.neutral_first_names.len());
        println!("  Last Names: {}", pools.last_names.len());
        for entity_type in EntityType::ALL {
            println!(
                "  {} Capacity: {}",
                entity_type.label(),
                pools.capacity(entity_type)
            );
        }

        let fallback_shaped = pools.fallback_shaped();
        if !fallback_shaped.is_empty() {
            println!();
            println!("⚠️  Names shaped like fallback pseudonyms:");
            for name in &fallback_shaped {
                println!("    - {name}");
            }
        }

        if let Some(gender_file) = &config.library.gender_file {
            println!();
            match GenderDetector::from_file(gender_file) {
                Ok(_) => println!("✅ Gender lookup loaded: {}", gender_file.display()),
                Err(e) => {
                    println!("⚠️  Gender lookup unavailable: {e}");
                    println!("   Standalone first names will be drawn as surnames.");
                }
            }
        }
        println!();

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_validate_config_exit_codes() {
        let valid = config_file("[library]\ntheme = \"neutral\"\n");
        let code = ValidateArgs {}
            .execute(valid.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);

        let invalid = config_file("[detection]\nconfidence_threshold = 2.0\n");
        let code = ValidateArgs {}
            .execute(invalid.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_validate_library_bundled_theme() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/data/pseudonyms");
        let file = config_file(&format!("[library]\ndirectory = \"{dir}\"\ngender_file = \"{}\"\n",
            concat!(env!("CARGO_MANIFEST_DIR"), "/data/french_gender_names.json")));
        let code = ValidateLibraryArgs { theme: None }
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);

        let code = ValidateLibraryArgs {
            theme: Some("missing_theme".to_string()),
        }
        .execute(file.path().to_str().unwrap())
        .await
        .unwrap();
        assert_eq!(code, 2);
    }
}
