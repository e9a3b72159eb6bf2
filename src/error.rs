//! Error types for the memebot
//!
//! This module provides error handling using thiserror for structured error
//! definitions and anyhow for error propagation at the binary edge.

use thiserror::Error;

/// Main error type for memebot operations
#[derive(Error, Debug)]
pub enum MemebotError {
    /// Message is shorter than the configured minimum
    #[error("Not enough words to mutate: {words} < {minimum}")]
    InsufficientInput { words: usize, minimum: usize },

    /// Mutation pass left the message untouched
    #[error("Mutation produced no change")]
    NoChange,

    /// Server or word record missing where it was expected
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Administrative setting failed validation
    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: String, reason: String },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Hyphenation dictionary could not be loaded
    #[error("Hyphenation error: {0}")]
    Hyphenation(String),

    /// Chat gateway call failed (send, react, collect)
    #[error("Gateway error: {0}")]
    Gateway(String),

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

impl MemebotError {
    /// Shorthand for building an `InvalidSetting` error
    pub fn invalid_setting(name: impl Into<String>, reason: impl Into<String>) -> Self {
        MemebotError::InvalidSetting {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Errors that mean "nothing to do" rather than "something broke"
    pub fn is_silent_skip(&self) -> bool {
        matches!(
            self,
            MemebotError::InsufficientInput { .. } | MemebotError::NoChange
        )
    }
}

/// Result type alias for memebot operations
pub type Result<T> = std::result::Result<T, MemebotError>;

/// Convert anyhow::Error to MemebotError
impl From<anyhow::Error> for MemebotError {
    fn from(err: anyhow::Error) -> Self {
        MemebotError::Other(err.to_string())
    }
}
