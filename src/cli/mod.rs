//! CLI interface and argument parsing
//!
//! This module provides the command-line interface using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// GDPR Pseudonymizer - consistent pseudonymization of French documents
#[derive(Parser, Debug)]
#[command(name = "gdpr-pseudonymizer")]
#[command(version, about, long_about = None)]
#[command(author = "GDPR Pseudonymizer Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "pseudonymizer.toml", env = "PSEUDO_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PSEUDO_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pseudonymize text documents and update the mapping store
    Process(commands::process::ProcessArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Load and check the configured pseudonym library
    ValidateLibrary(commands::validate::ValidateLibraryArgs),
}
