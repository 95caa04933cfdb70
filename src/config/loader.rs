//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::PseudonymizerConfig;
use crate::domain::{PseudonymError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Prefix of environment variables overriding file values
pub const ENV_PREFIX: &str = "PSEUDO_";

/// Loads configuration from a TOML file
///
/// 1. Reads the TOML file
/// 2. Substitutes `${VAR}` placeholders outside comments
/// 3. Parses the TOML into [`PseudonymizerConfig`]
/// 4. Applies `PSEUDO_<SECTION>_<KEY>` environment overrides
/// 5. Validates the result
///
/// # Errors
///
/// Returns [`PseudonymError::Configuration`] if the file is missing or
/// unreadable, a placeholder names an unset variable, parsing fails, or
/// validation fails.
///
/// # Examples
///
/// ```no_run
/// use gdpr_pseudonymizer::config::load_config;
///
/// let config = load_config("pseudonymizer.toml").expect("Failed to load config");
/// println!("theme: {}", config.library.theme);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<PseudonymizerConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PseudonymError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        PseudonymError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    parse_config(&contents)
}

/// Parse configuration from TOML content, with substitution, overrides and validation
pub fn parse_config(contents: &str) -> Result<PseudonymizerConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: PseudonymizerConfig = toml::from_str(&contents)
        .map_err(|e| PseudonymError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        PseudonymError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid"))
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied untouched. Every missing variable is reported at
/// once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut missing_vars: Vec<String> = Vec::new();
    let mut lines = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let processed = placeholder_regex().replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        lines.push(processed.into_owned());
    }

    if !missing_vars.is_empty() {
        return Err(PseudonymError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok()
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        PseudonymError::Configuration(format!("Invalid value for {ENV_PREFIX}{key}: {value}"))
    })
}

/// Applies environment variable overrides using the `PSEUDO_` prefix
///
/// For example `PSEUDO_LIBRARY_THEME=star_wars` or
/// `PSEUDO_DETECTION_CONFIDENCE_THRESHOLD=0.7`.
fn apply_env_overrides(config: &mut PseudonymizerConfig) -> Result<()> {
    if let Some(val) = env_override("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Some(val) = env_override("LIBRARY_DIRECTORY") {
        config.library.directory = PathBuf::from(val);
    }
    if let Some(val) = env_override("LIBRARY_THEME") {
        config.library.theme = val;
    }
    if let Some(val) = env_override("LIBRARY_GENDER_FILE") {
        config.library.gender_file = (!val.is_empty()).then(|| PathBuf::from(val));
    }
    if let Some(val) = env_override("LIBRARY_SEED") {
        config.library.seed = Some(parse_override("LIBRARY_SEED", &val)?);
    }

    if let Some(val) = env_override("DETECTION_PATTERN_LIBRARY") {
        config.detection.pattern_library = Some(PathBuf::from(val));
    }
    if let Some(val) = env_override("DETECTION_CONFIDENCE_THRESHOLD") {
        config.detection.confidence_threshold =
            parse_override("DETECTION_CONFIDENCE_THRESHOLD", &val)?;
    }

    if let Some(val) = env_override("MAPPING_STORE_PATH") {
        config.mapping.store_path = PathBuf::from(val);
    }

    if let Some(val) = env_override("AUDIT_ENABLED") {
        config.audit.enabled = parse_override("AUDIT_ENABLED", &val)?;
    }
    if let Some(val) = env_override("AUDIT_LOG_PATH") {
        config.audit.log_path = PathBuf::from(val);
    }

    if let Some(val) = env_override("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env_override("LOGGING_LOCAL_PATH") {
        config.logging.local_path = PathBuf::from(val);
    }
    if let Some(val) = env_override("LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
