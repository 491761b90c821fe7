//! Unified error types for cwm

use thiserror::Error;

/// Unified error type for all cwm operations
#[derive(Error, Debug)]
pub enum CwmError {
    // Caller-contract errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Generator errors
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Result type alias using CwmError
pub type Result<T> = std::result::Result<T, CwmError>;
