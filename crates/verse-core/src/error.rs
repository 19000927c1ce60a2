//! Error types for verse image generation

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for verse operations
#[derive(Debug, Error)]
pub enum VerseError {
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid theme name '{0}': use only lowercase letters, numbers, and hyphens")]
    InvalidThemeName(String),

    #[error("Invalid output id '{0}': expected a plain file name such as verse-01.png")]
    InvalidOutputId(String),

    #[error("Invalid value for {field}: {value} is not one of {allowed:?}")]
    InvalidParameter {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Conflicting options: {0}")]
    ConflictingOptions(String),

    #[error("API key not found: {0}")]
    MissingApiKey(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),

    #[error("YAML parse error: {0}")]
    YamlParseError(String),
}

/// Result type alias for verse operations
pub type Result<T> = std::result::Result<T, VerseError>;

impl From<toml::de::Error> for VerseError {
    fn from(err: toml::de::Error) -> Self {
        VerseError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for VerseError {
    fn from(err: toml::ser::Error) -> Self {
        VerseError::TomlSerError(err.to_string())
    }
}

impl From<serde_yaml::Error> for VerseError {
    fn from(err: serde_yaml::Error) -> Self {
        VerseError::YamlParseError(err.to_string())
    }
}
