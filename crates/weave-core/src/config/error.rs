//! # Weave Core Configuration Errors
//!
//! Errors raised while building, merging or (de)serializing configuration
//! documents.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration document must be a mapping, found {found}")]
    NotAMapping { found: String },

    #[error("Failed to serialize configuration to {format}: {message}")]
    SerializationError { format: String, message: String },

    #[error("Failed to deserialize configuration from {format}: {message}")]
    DeserializationError { format: String, message: String },

    #[error("Unknown or unsupported configuration format for path: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("I/O error reading configuration '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for configuration key '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
