use std::path::PathBuf;
use thiserror::Error;

use crate::email::EmailError;
use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Email(#[from] EmailError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("No filters found in configuration")]
    NoFilters,

    #[error("Invalid glob pattern '{pattern}' in rule '{rule}': {reason}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        reason: String,
    },

    #[error("Invalid rule '{name}': {reason}")]
    InvalidRule { name: String, reason: String },

    #[error("Missing required setting '{0}' (pass the flag, set the env var, or add it to the config file)")]
    MissingSetting(&'static str),

    #[error("Failed to resolve IMAP password: {0}")]
    Password(#[from] SecretError),
}

pub type Result<T> = std::result::Result<T, FilterError>;
