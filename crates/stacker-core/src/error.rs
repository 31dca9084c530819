//! Error types for recipe stacking.

use thiserror::Error;

/// Top-level result type for stacker operations.
pub type Result<T> = std::result::Result<T, StackError>;

/// Top-level error type for stacker.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("remote merge failed ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("index error: {0}")]
    Index(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StackError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
