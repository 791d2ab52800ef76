//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for persistence operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Domain-level error.
///
/// Operations that address a missing order or item index do not fail; they
/// return `None`/`false` because the UI may race slightly ahead of the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input was rejected before any mutation took place.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A business invariant would be broken by the operation.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Persisting a change failed; the change was not applied.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Failure of the persistence collaborator.
///
/// Reads never surface this (a corrupt or missing blob degrades to empty
/// state); writes always do.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The document could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The backing store rejected the operation.
    #[error("storage backend failed: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}
