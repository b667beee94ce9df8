//! BookService - Book CRUD and the Author Relationship
//!
//! Every write is checked against the author table before (and atomically
//! with) persistence - no book with a dangling `author_id` is ever stored.
//! The bulk delete used by the author cascade lives here as the
//! crate-internal surface, backed by the same adapter operation.

use std::sync::Arc;

use crate::constants::{BOOK_DESCRIPTION_BYTES_MAX, BOOK_TITLE_CHARS_MAX};
use crate::error::{CoreError, CoreResult};
use crate::model::{Book, BookWithAuthor, NewBook};
use crate::storage::StorageBackend;

/// CRUD service over [`Book`] records.
#[derive(Debug)]
pub struct BookService<S> {
    storage: Arc<S>,
}

impl<S> Clone for BookService<S> {
    fn clone(&self) -> Self {
        Self { storage: self.storage.clone() }
    }
}

impl<S: StorageBackend> BookService<S> {
    /// Create a service over the given backend.
    #[must_use]
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// List all books, ascending by id. An empty set is not an error.
    pub async fn list(&self) -> CoreResult<Vec<Book>> {
        Ok(self.storage.list_books().await?)
    }

    /// List all books joined with their author, ascending by book id.
    ///
    /// # Errors
    /// `CoreError::Integrity` if a book's author cannot be resolved.
    /// Invariant enforcement makes this unreachable in normal operation;
    /// the check is defensive.
    pub async fn list_with_authors(&self) -> CoreResult<Vec<BookWithAuthor>> {
        let books = self.storage.list_books().await?;

        let mut joined = Vec::with_capacity(books.len());
        for book in books {
            let author = match self.storage.get_author(book.author_id).await? {
                Some(author) => author,
                None => {
                    tracing::warn!(
                        book_id = book.id,
                        author_id = book.author_id,
                        "book references missing author"
                    );
                    return Err(CoreError::integrity(format!(
                        "book {} references missing author {}",
                        book.id, book.author_id
                    )));
                }
            };
            joined.push(BookWithAuthor { book, author });
        }

        Ok(joined)
    }

    /// Fetch a single book.
    ///
    /// # Errors
    /// `CoreError::NotFound` if no book with that id exists.
    pub async fn get(&self, id: i64) -> CoreResult<Book> {
        self.storage
            .get_book(id)
            .await?
            .ok_or_else(|| CoreError::not_found("book", id))
    }

    /// Create a new book.
    ///
    /// # Errors
    /// `CoreError::Validation` for title/description limits;
    /// `CoreError::NotFound` (for the author) if `draft.author_id` does not
    /// resolve. Nothing is persisted on failure.
    pub async fn create(&self, draft: NewBook) -> CoreResult<Book> {
        validate_book(&draft)?;

        let book = self.storage.create_book(draft).await?;
        tracing::info!(
            book_id = book.id,
            author_id = book.author_id,
            title = %book.title,
            "created book"
        );

        Ok(book)
    }

    /// Replace a book's mutable fields.
    ///
    /// # Errors
    /// `CoreError::NotFound` if the book id is absent or the new
    /// `author_id` does not resolve; `CoreError::Validation` for field
    /// constraints.
    pub async fn update(&self, id: i64, draft: NewBook) -> CoreResult<Book> {
        validate_book(&draft)?;

        let book = self.storage.update_book(id, draft).await?;
        tracing::info!(book_id = book.id, "updated book");

        Ok(book)
    }

    /// Delete a book.
    ///
    /// # Errors
    /// `CoreError::NotFound` if absent.
    pub async fn delete(&self, id: i64) -> CoreResult<()> {
        self.storage.delete_book(id).await?;
        tracing::info!(book_id = id, "deleted book");

        Ok(())
    }

    /// Delete every book referencing `author_id`, returning the count.
    ///
    /// The bulk-delete surface behind the author cascade; idempotent,
    /// deleting zero matching books is not an error. The atomic
    /// author-plus-books unit itself runs inside the backend's
    /// `delete_author`, so callers that want the cascade should delete the
    /// author instead.
    pub async fn delete_all_by_author(&self, author_id: i64) -> CoreResult<u64> {
        let removed = self.storage.delete_books_by_author(author_id).await?;
        if removed > 0 {
            tracing::info!(author_id, removed, "bulk-deleted books by author");
        }

        Ok(removed)
    }
}

fn validate_book(draft: &NewBook) -> CoreResult<()> {
    if draft.title.is_empty() {
        return Err(CoreError::validation("title", "must not be empty"));
    }
    if draft.title.chars().count() > BOOK_TITLE_CHARS_MAX {
        return Err(CoreError::validation(
            "title",
            format!("exceeds {BOOK_TITLE_CHARS_MAX} characters"),
        ));
    }
    if let Some(description) = &draft.description {
        if description.len() > BOOK_DESCRIPTION_BYTES_MAX {
            return Err(CoreError::validation(
                "description",
                format!("exceeds {BOOK_DESCRIPTION_BYTES_MAX} bytes"),
            ));
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
