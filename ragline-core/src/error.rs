//! Error types shared across ragline crates.

use thiserror::Error;

/// Errors raised by model, tool and template operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The generation model failed or returned something unusable.
    #[error("Model error: {0}")]
    Model(String),

    /// A tool failed to execute.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Invalid configuration detected before any I/O.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A prompt template could not be parsed or rendered.
    #[error("Template error: {0}")]
    Template(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A convenience result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
