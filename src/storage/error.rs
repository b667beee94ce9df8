//! StorageError - Adapter-Level Failures
//!
//! TigerStyle: one error type per layer, constructor helpers, no stringly
//! matching at call sites.

use thiserror::Error;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced by a [`StorageBackend`](super::StorageBackend).
///
/// `NotFound` and `ForeignKey` carry domain meaning and are mapped to typed
/// service errors; the remaining variants are infrastructure failures from a
/// real backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested record does not exist.
    #[error("not found: {entity} {id}")]
    NotFound {
        /// Entity kind ("author" or "book")
        entity: &'static str,
        /// The id that failed to resolve
        id: i64,
    },

    /// A write referenced an author that does not exist.
    #[error("foreign key violation: author {author_id} does not exist")]
    ForeignKey {
        /// The dangling author id
        author_id: i64,
    },

    /// Backend connection or communication failure.
    #[error("connection error: {message}")]
    Connection {
        /// Backend-reported detail
        message: String,
    },

    /// A read against the backend failed.
    #[error("read error: {message}")]
    Read {
        /// Backend-reported detail
        message: String,
    },

    /// A write against the backend failed.
    #[error("write error: {message}")]
    Write {
        /// Backend-reported detail
        message: String,
    },

    /// Internal invariant violation in the storage layer.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the violation
        message: String,
    },
}

impl StorageError {
    /// A record lookup that failed to resolve.
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// A write that referenced a missing author.
    #[must_use]
    pub fn foreign_key(author_id: i64) -> Self {
        Self::ForeignKey { author_id }
    }

    /// Connection failure.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into() }
    }

    /// Read failure.
    #[must_use]
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read { message: message.into() }
    }

    /// Write failure.
    #[must_use]
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write { message: message.into() }
    }

    /// Internal invariant violation.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}
