//! CollectionBuilder - Denormalized Display View
//!
//! Read-only aggregation joining every book with its author. Computed on
//! demand against the services' current state - no caching across calls, so
//! the view is never stale. Author fields come from a live lookup rather
//! than denormalized storage, keeping a single source of truth.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::author::AuthorService;
use crate::book::BookService;
use crate::error::CoreResult;
use crate::storage::StorageBackend;

/// One row of the collection view: a book with its author's name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    /// Id of the book (stable key for display links)
    pub book_id: i64,
    /// Book title
    pub title: String,
    /// Id of the book's author
    pub author_id: i64,
    /// Author name at the time of the call
    pub author_name: String,
    /// Optional book description
    pub description: Option<String>,
    /// Optional publication date
    pub release_date: Option<NaiveDate>,
}

/// Builder for the joined author/book collection view.
#[derive(Debug)]
pub struct CollectionBuilder<S> {
    authors: AuthorService<S>,
    books: BookService<S>,
}

impl<S> Clone for CollectionBuilder<S> {
    fn clone(&self) -> Self {
        Self { authors: self.authors.clone(), books: self.books.clone() }
    }
}

impl<S: StorageBackend> CollectionBuilder<S> {
    /// Create a builder over the two read paths it aggregates.
    #[must_use]
    pub fn new(authors: AuthorService<S>, books: BookService<S>) -> Self {
        Self { authors, books }
    }

    /// Build the collection: one entry per book, ordered by book id
    /// ascending, each with its author resolved via the author service.
    ///
    /// # Errors
    /// `CoreError::Integrity` if a book's author cannot be resolved
    /// (defensive; prevented by the write-path invariants).
    pub async fn build(&self) -> CoreResult<Vec<CollectionEntry>> {
        let joined = self.books.list_with_authors().await?;

        let entries: Vec<CollectionEntry> = joined
            .into_iter()
            .map(|entry| CollectionEntry {
                book_id: entry.book.id,
                title: entry.book.title,
                author_id: entry.author.id,
                author_name: entry.author.name,
                description: entry.book.description,
                release_date: entry.book.release_date,
            })
            .collect();

        // Postcondition: book order is preserved from the ascending list
        assert!(
            entries.windows(2).all(|w| w[0].book_id < w[1].book_id),
            "collection must be ordered by book id"
        );

        Ok(entries)
    }

    /// The author service this builder reads from.
    #[must_use]
    pub fn authors(&self) -> &AuthorService<S> {
        &self.authors
    }

    /// The book service this builder reads from.
    #[must_use]
    pub fn books(&self) -> &BookService<S> {
        &self.books
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use crate::model::{NewAuthor, NewBook};
    use crate::storage::MemoryBackend;

    use super::*;

    fn builder() -> CollectionBuilder<MemoryBackend> {
        let storage = Arc::new(MemoryBackend::new());
        CollectionBuilder::new(
            AuthorService::new(storage.clone()),
            BookService::new(storage),
        )
    }

    fn author_draft(name: &str) -> NewAuthor {
        NewAuthor {
            name: name.to_string(),
            birthdate: NaiveDate::from_ymd_opt(1815, 12, 10).unwrap(),
        }
    }

    fn book_draft(title: &str, author_id: i64) -> NewBook {
        NewBook {
            title: title.to_string(),
            author_id,
            description: None,
            release_date: None,
        }
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let view = builder();
        assert!(view.build().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_length_matches_book_count_and_fields_match() {
        let view = builder();

        let ada = view.authors().create(author_draft("Ada Lovelace")).await.unwrap();
        let mary = view.authors().create(author_draft("Mary Shelley")).await.unwrap();

        view.books().create(book_draft("Notes", ada.id)).await.unwrap();
        view.books().create(book_draft("Frankenstein", mary.id)).await.unwrap();
        view.books().create(book_draft("Sketches", ada.id)).await.unwrap();

        let entries = view.build().await.unwrap();
        assert_eq!(entries.len(), view.books().list().await.unwrap().len());

        for entry in &entries {
            let author = view.authors().get(entry.author_id).await.unwrap();
            assert_eq!(entry.author_name, author.name);
        }
    }

    #[tokio::test]
    async fn test_view_is_never_stale() {
        let view = builder();

        let ada = view.authors().create(author_draft("Ada")).await.unwrap();
        view.books().create(book_draft("Notes", ada.id)).await.unwrap();

        let entries = view.build().await.unwrap();
        assert_eq!(entries[0].author_name, "Ada");

        // A rename is visible on the very next build
        view.authors()
            .update(ada.id, author_draft("Ada Lovelace"))
            .await
            .unwrap();
        let entries = view.build().await.unwrap();
        assert_eq!(entries[0].author_name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_ordered_by_book_id() {
        let view = builder();

        let ada = view.authors().create(author_draft("Ada")).await.unwrap();
        for i in 0..5 {
            view.books()
                .create(book_draft(&format!("Book {i}"), ada.id))
                .await
                .unwrap();
        }

        let entries = view.build().await.unwrap();
        let ids: Vec<i64> = entries.iter().map(|e| e.book_id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
