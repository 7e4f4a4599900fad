//! Error types for mimir-provision.
//!
//! Each concern has its own error enum; [`Error`] wraps them so the CLI can
//! match on the failure and print a hint.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("aborted: existing secrets left untouched")]
    Aborted,

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Template lookup and rendering failures.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unresolved placeholders in {}: {}", path.display(), placeholders.join(", "))]
    Unresolved {
        path: PathBuf,
        placeholders: Vec<String>,
    },

    #[error("required placeholders not present in {}: {}", path.display(), placeholders.join(", "))]
    Missing {
        path: PathBuf,
        placeholders: Vec<String>,
    },

    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("rendered {} is not valid YAML: {source}", path.display())]
    InvalidYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Failures reading a pre-populated environment file.
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("environment variables still hold template placeholders: {}", .0.join(", "))]
    PlaceholderValues(Vec<String>),

    #[error("failed to read env file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Filesystem failures while preparing or writing outputs.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("failed to create directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Token signing and verification failures.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("signing key is empty")]
    EmptyKey,

    #[error("signing key is too short: {len} bytes (need at least {min})")]
    KeyTooShort { len: usize, min: usize },

    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("failed to verify token: {0}")]
    Decode(#[source] jsonwebtoken::errors::Error),
}

/// Secret generation failures.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("secret length must be at least one byte")]
    InvalidLength,
}

/// Configuration file failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, Error>;
