//! Error types for the workout_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for workout_core operations
///
/// Every variant is recoverable. Callers surface the message and carry on
/// with the state they had before the failing call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Malformed generation input or an operation the session cannot accept.
    /// Raised before any session state is touched.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Substitution filters eliminated every candidate
    #[error("No alternative found: {0}")]
    NoAlternative(String),

    /// Persisted session failed shape validation
    #[error("Corrupted session state: {0}")]
    CorruptedSession(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
