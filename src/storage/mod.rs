//! Storage - Backend Trait and Implementations
//!
//! TigerStyle: abstract storage, injectable everywhere.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    StorageBackend Trait                      │
//! └─────────────────────────────────────────────────────────────┘
//!          ↑                              ↑
//!          │                              │
//! ┌────────┴────────┐           ┌────────┴────────┐
//! │  MemoryBackend  │           │ PostgresBackend │
//! │ (tests/default) │           │  (production)   │
//! └─────────────────┘           └─────────────────┘
//! ```
//!
//! The backend is handed to each service explicitly (no module-level
//! singleton), so tests substitute [`MemoryBackend`] freely. Whatever must
//! be atomic - the foreign-key check on book writes, the author-delete
//! cascade - is atomic inside the backend, not above it.

mod backend;
mod error;
mod memory;

#[cfg(feature = "postgres")]
mod postgres;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;

#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;
