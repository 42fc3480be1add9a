//! Error types for SalesSight
//!
//! This module provides error handling using thiserror for structured
//! error definitions and anyhow for propagation at the binary boundary.

use thiserror::Error;

/// Main error type for SalesSight operations
#[derive(Error, Debug)]
pub enum SalesSightError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// No user exists for the given username
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Username is already taken
    #[error("Username already exists: {0}")]
    AlreadyExists(String),

    /// Score outside the accepted 1-5 range
    #[error("Invalid rating score: {0} (expected 1-5)")]
    InvalidRating(i64),

    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Sales data could not be loaded
    #[error("Data import error: {0}")]
    DataImport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for SalesSight operations
pub type Result<T> = std::result::Result<T, SalesSightError>;

/// Convert anyhow::Error to SalesSightError
impl From<anyhow::Error> for SalesSightError {
    fn from(err: anyhow::Error) -> Self {
        SalesSightError::Other(err.to_string())
    }
}
