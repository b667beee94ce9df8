//! CoreError - Service-Level Failure Taxonomy
//!
//! Three domain variants - validation, not-found, integrity - plus a
//! passthrough for backend infrastructure failures. Every failure is
//! returned to the caller; nothing is swallowed and nothing retries. The
//! HTTP collaborator owns the status mapping (`NotFound` → 404,
//! `Validation` → 400).

use thiserror::Error;

use crate::storage::StorageError;

/// Result type alias for service operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors returned by the author, book and collection services.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required field is missing, empty or over its limit.
    #[error("validation error: {field}: {reason}")]
    Validation {
        /// The offending field
        field: &'static str,
        /// What the field violated
        reason: String,
    },

    /// A referenced id does not resolve to a record.
    #[error("not found: {entity} {id}")]
    NotFound {
        /// Entity kind ("author" or "book")
        entity: &'static str,
        /// The id that failed to resolve
        id: i64,
    },

    /// Observed inconsistency that the invariants should have prevented.
    ///
    /// Defensive: never expected in normal operation.
    #[error("integrity error: {message}")]
    Integrity {
        /// Description of the inconsistency
        message: String,
    },

    /// Infrastructure failure in the storage backend.
    #[error(transparent)]
    Storage(StorageError),
}

impl CoreError {
    /// A field that failed validation.
    #[must_use]
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation { field, reason: reason.into() }
    }

    /// An id that failed to resolve.
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// A detected invariant violation.
    #[must_use]
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity { message: message.into() }
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            // A dangling reference surfaces to callers as the missing author
            StorageError::ForeignKey { author_id } => {
                CoreError::NotFound { entity: "author", id: author_id }
            }
            other => CoreError::Storage(other),
        }
    }
}
