//! Global error types for the Flock application.
//!
//! Every failure the store, query layer, import pipeline, and notification
//! job can report is one `FlockError` variant. Absence of a row is not an
//! error for most lookups (they return `Option`/empty results); `NotFound` is
//! reserved for operations whose caller asked for something that must exist.

use thiserror::Error;

/// Convenience type alias for Results using FlockError.
pub type FlockResult<T> = Result<T, FlockError>;

/// Unified error type covering all error categories in Flock.
#[derive(Error, Debug)]
pub enum FlockError {
    // -- Domain taxonomy --
    /// The requested row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness or referential integrity rule was broken.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// The underlying store failed (I/O, locked file, malformed SQL).
    #[error("storage error: {0}")]
    Storage(String),

    /// The messaging provider rejected or failed a single send.
    #[error("delivery to {recipient} failed: {message}")]
    Delivery {
        /// Phone number the message was addressed to.
        recipient: String,
        /// Provider or transport error text.
        message: String,
    },

    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Database lifecycle errors --
    /// Database migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// Database integrity check failed.
    #[error("database integrity check failed: {0}")]
    IntegrityCheck(String),

    // -- Input errors --
    /// A value could not be turned into a domain type (enum label, date, count).
    #[error("invalid value: {0}")]
    Validation(String),

    /// A member import could not be read.
    #[error("import error: {0}")]
    Import(String),

    // -- Network errors --
    /// HTTP request failed before a delivery could be attempted.
    #[error("http error: {0}")]
    Http(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FlockError {
    /// Whether this error reports absence rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FlockError::NotFound(_))
    }

    /// Whether this error is an integrity rule rejection.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, FlockError::ConstraintViolation(_))
    }
}

impl From<serde_json::Error> for FlockError {
    fn from(e: serde_json::Error) -> Self {
        FlockError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for FlockError {
    fn from(e: toml::de::Error) -> Self {
        FlockError::Config(e.to_string())
    }
}

impl From<chrono::ParseError> for FlockError {
    fn from(e: chrono::ParseError) -> Self {
        FlockError::Validation(e.to_string())
    }
}
