//! StorageBackend Trait - Injected Storage Capability
//!
//! TigerStyle: all I/O goes through injectable interfaces.
//!
//! The backend owns every piece of mutable state: id assignment, timestamps,
//! the referential check on book writes, and the author-delete cascade. The
//! last two MUST execute inside a single critical section (or transaction),
//! so that a book-create racing an author cascade either fully precedes or
//! fully follows it - no orphan book is ever observable.

use async_trait::async_trait;

use crate::model::{Author, Book, NewAuthor, NewBook};

use super::error::StorageResult;

/// Durable persistence for author and book records.
///
/// Implementations hold no business logic beyond what atomicity forces into
/// them: id assignment, `updated_at` stamping, the synchronous foreign-key
/// check on book writes, and the cascade on author deletion. Field
/// validation lives in the services.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Insert a new author, assigning a fresh id and `updated_at`.
    async fn create_author(&self, draft: NewAuthor) -> StorageResult<Author>;

    /// Fetch an author by id.
    async fn get_author(&self, id: i64) -> StorageResult<Option<Author>>;

    /// List all authors, ascending by id.
    async fn list_authors(&self) -> StorageResult<Vec<Author>>;

    /// Replace an author's mutable fields, refreshing `updated_at`.
    ///
    /// Fails with `StorageError::NotFound` if the id does not exist.
    async fn update_author(&self, id: i64, draft: NewAuthor) -> StorageResult<Author>;

    /// Delete an author and, atomically, every book referencing it.
    ///
    /// Returns the number of cascaded books. Fails with
    /// `StorageError::NotFound` if the author does not exist; on any failure
    /// the author and its books remain untouched.
    async fn delete_author(&self, id: i64) -> StorageResult<u64>;

    /// Insert a new book, assigning a fresh id and `updated_at`.
    ///
    /// Fails with `StorageError::ForeignKey` if `draft.author_id` does not
    /// resolve; the check and the insert share one critical section, and no
    /// record is persisted on failure.
    async fn create_book(&self, draft: NewBook) -> StorageResult<Book>;

    /// Fetch a book by id.
    async fn get_book(&self, id: i64) -> StorageResult<Option<Book>>;

    /// List all books, ascending by id.
    async fn list_books(&self) -> StorageResult<Vec<Book>>;

    /// Replace a book's mutable fields, refreshing `updated_at`.
    ///
    /// Fails with `StorageError::NotFound` for a missing book and
    /// `StorageError::ForeignKey` for a dangling `draft.author_id`.
    async fn update_book(&self, id: i64, draft: NewBook) -> StorageResult<Book>;

    /// Delete a book by id.
    ///
    /// Fails with `StorageError::NotFound` if absent.
    async fn delete_book(&self, id: i64) -> StorageResult<()>;

    /// Delete every book referencing `author_id`, returning the count.
    ///
    /// Idempotent: zero matches is success, not an error.
    async fn delete_books_by_author(&self, author_id: i64) -> StorageResult<u64>;
}
