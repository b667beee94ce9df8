//! Biblio - Author/Book Relational Core
//!
//! TigerStyle: the data-integrity layer is the product; everything else is
//! a thin wrapper.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             CollectionBuilder                │  read-only join view
//! ├──────────────────────┬──────────────────────┤
//! │    AuthorService     │     BookService      │  validation + CRUD
//! ├──────────────────────┴──────────────────────┤
//! │          StorageBackend (injected)           │  ids, timestamps,
//! │      MemoryBackend / PostgresBackend         │  FK check, cascade
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The storage adapter owns all mutable state and everything that must be
//! atomic: book writes are foreign-key-checked in the same critical section
//! that persists them, and deleting an author removes its books in the same
//! unit - no orphan book is ever observable, even under concurrency.
//!
//! The HTTP/templating layer is an external collaborator: it parses raw
//! input into the draft types, calls these services, and maps
//! [`CoreError`] variants to status codes.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use biblio::{AuthorService, BookService, CollectionBuilder, MemoryBackend, NewAuthor, NewBook};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), biblio::CoreError> {
//! let storage = Arc::new(MemoryBackend::new());
//! let authors = AuthorService::new(storage.clone());
//! let books = BookService::new(storage);
//!
//! let ada = authors
//!     .create(NewAuthor {
//!         name: "Ada Lovelace".to_string(),
//!         birthdate: "1815-12-10".parse().unwrap(),
//!     })
//!     .await?;
//! books
//!     .create(NewBook {
//!         title: "Notes".to_string(),
//!         author_id: ada.id,
//!         description: None,
//!         release_date: None,
//!     })
//!     .await?;
//!
//! let view = CollectionBuilder::new(authors, books);
//! assert_eq!(view.build().await?.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod author;
pub mod book;
pub mod collection;
pub mod constants;
pub mod error;
pub mod model;
pub mod storage;

// Re-export common types
pub use author::AuthorService;
pub use book::BookService;
pub use collection::{CollectionBuilder, CollectionEntry};
pub use constants::*;
pub use error::{CoreError, CoreResult};
pub use model::{Author, Book, BookWithAuthor, NewAuthor, NewBook};
pub use storage::{MemoryBackend, StorageBackend, StorageError, StorageResult};

#[cfg(feature = "postgres")]
pub use storage::PostgresBackend;
