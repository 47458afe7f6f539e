//! Error types for the KGX loaders

use thiserror::Error;

/// Result type alias for KGX operations
pub type Result<T> = std::result::Result<T, KgxError>;

/// Main error type for KGX loaders
///
/// Only conditions that must abort a run are represented here. Skippable row
/// and group defects are reported through outcome enums and counters instead.
#[derive(Error, Debug)]
pub enum KgxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Delimited file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown identifier source tag: '{0}'")]
    UnknownSourceTag(String),

    #[error("Invalid affinity value '{value}': {reason}")]
    InvalidAffinity { value: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl KgxError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Whether this error stems from loader configuration rather than input data
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::UnknownSourceTag(_) | Self::Config(_))
    }
}
