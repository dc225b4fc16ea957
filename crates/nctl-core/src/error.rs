//! Error types for the nctl core library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or validating the environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The environment file does not exist
    #[error("Environment file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The environment file could not be read
    #[error("Failed to read environment file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The environment file could not be parsed
    #[error("Failed to parse environment file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// The environment file suffix is not one we know how to read
    #[error(
        "Unsupported format for environment file {}, can be one of (.env, .txt, .text, .json, .toml, .yaml, .yml or no suffix)",
        path.display()
    )]
    UnsupportedFormat { path: PathBuf },

    /// One or more fields failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(FieldErrors),
}

impl ConfigError {
    /// Field violations carried by an [`ConfigError::Invalid`] error.
    pub fn fields(&self) -> &[FieldError] {
        match self {
            Self::Invalid(errors) => &errors.0,
            _ => &[],
        }
    }
}

/// A single violated configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field violation found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.0.len() == 1 { "error" } else { "errors" };
        write!(f, "{} {noun}", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n\t* {error}")?;
        }
        Ok(())
    }
}
