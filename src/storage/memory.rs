//! MemoryBackend - In-Memory Storage
//!
//! TigerStyle: the default backend is the test backend.
//!
//! All state lives behind a single `tokio::sync::RwLock`, so every mutation
//! is serialized and the foreign-key check / author cascade each run inside
//! one write critical section. `BTreeMap` keys give ascending-id listing
//! without a sort. Id counters only move forward; ids are never reused
//! within the backend's lifetime, including after deletes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::model::{bump_timestamp, Author, Book, NewAuthor, NewBook};

use super::backend::StorageBackend;
use super::error::{StorageError, StorageResult};

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Default)]
struct StoreState {
    authors: BTreeMap<i64, Author>,
    books: BTreeMap<i64, Book>,
    next_author_id: i64,
    next_book_id: i64,
}

impl StoreState {
    fn fresh_author_id(&mut self) -> i64 {
        self.next_author_id += 1;
        self.next_author_id
    }

    fn fresh_book_id(&mut self) -> i64 {
        self.next_book_id += 1;
        self.next_book_id
    }
}

// =============================================================================
// MemoryBackend
// =============================================================================

/// In-memory storage backend.
///
/// The default adapter for tests and single-process use; substitute
/// `PostgresBackend` (feature `postgres`) for durable storage.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<StoreState>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn create_author(&self, draft: NewAuthor) -> StorageResult<Author> {
        let mut state = self.state.write().await;

        let author = Author {
            id: state.fresh_author_id(),
            name: draft.name,
            birthdate: draft.birthdate,
            updated_at: Utc::now(),
        };

        // Postcondition: fresh id must be unoccupied
        assert!(
            !state.authors.contains_key(&author.id),
            "author id {} already in use",
            author.id
        );

        state.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn get_author(&self, id: i64) -> StorageResult<Option<Author>> {
        let state = self.state.read().await;
        Ok(state.authors.get(&id).cloned())
    }

    async fn list_authors(&self) -> StorageResult<Vec<Author>> {
        let state = self.state.read().await;
        Ok(state.authors.values().cloned().collect())
    }

    async fn update_author(&self, id: i64, draft: NewAuthor) -> StorageResult<Author> {
        let mut state = self.state.write().await;

        let author = state
            .authors
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found("author", id))?;

        author.name = draft.name;
        author.birthdate = draft.birthdate;
        author.updated_at = bump_timestamp(author.updated_at, Utc::now());

        Ok(author.clone())
    }

    async fn delete_author(&self, id: i64) -> StorageResult<u64> {
        // One write lock spans the cascade and the author delete: a racing
        // book-create fully precedes or fully follows this block.
        let mut state = self.state.write().await;

        if !state.authors.contains_key(&id) {
            return Err(StorageError::not_found("author", id));
        }

        let doomed: Vec<i64> = state
            .books
            .values()
            .filter(|book| book.author_id == id)
            .map(|book| book.id)
            .collect();
        for book_id in &doomed {
            state.books.remove(book_id);
        }
        state.authors.remove(&id);

        // Postcondition: no orphan may survive the cascade
        assert!(
            state.books.values().all(|book| book.author_id != id),
            "cascade left orphan books for author {id}"
        );

        Ok(doomed.len() as u64)
    }

    async fn create_book(&self, draft: NewBook) -> StorageResult<Book> {
        let mut state = self.state.write().await;

        // Referential check and insert share this critical section; no book
        // is ever persisted with a dangling author_id.
        if !state.authors.contains_key(&draft.author_id) {
            return Err(StorageError::foreign_key(draft.author_id));
        }

        let book = Book {
            id: state.fresh_book_id(),
            title: draft.title,
            author_id: draft.author_id,
            description: draft.description,
            release_date: draft.release_date,
            updated_at: Utc::now(),
        };

        assert!(
            !state.books.contains_key(&book.id),
            "book id {} already in use",
            book.id
        );

        state.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn get_book(&self, id: i64) -> StorageResult<Option<Book>> {
        let state = self.state.read().await;
        Ok(state.books.get(&id).cloned())
    }

    async fn list_books(&self) -> StorageResult<Vec<Book>> {
        let state = self.state.read().await;
        Ok(state.books.values().cloned().collect())
    }

    async fn update_book(&self, id: i64, draft: NewBook) -> StorageResult<Book> {
        let mut state = self.state.write().await;

        if !state.authors.contains_key(&draft.author_id) {
            return Err(StorageError::foreign_key(draft.author_id));
        }

        let book = state
            .books
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found("book", id))?;

        book.title = draft.title;
        book.author_id = draft.author_id;
        book.description = draft.description;
        book.release_date = draft.release_date;
        book.updated_at = bump_timestamp(book.updated_at, Utc::now());

        Ok(book.clone())
    }

    async fn delete_book(&self, id: i64) -> StorageResult<()> {
        let mut state = self.state.write().await;

        state
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found("book", id))
    }

    async fn delete_books_by_author(&self, author_id: i64) -> StorageResult<u64> {
        let mut state = self.state.write().await;

        let doomed: Vec<i64> = state
            .books
            .values()
            .filter(|book| book.author_id == author_id)
            .map(|book| book.id)
            .collect();
        for book_id in &doomed {
            state.books.remove(book_id);
        }

        Ok(doomed.len() as u64)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn author_draft(name: &str) -> NewAuthor {
        NewAuthor { name: name.to_string(), birthdate: date("1815-12-10") }
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
    async fn test_ids_never_reused_after_delete() {
        let backend = MemoryBackend::new();

        let a1 = backend.create_author(author_draft("Ada")).await.unwrap();
        backend.delete_author(a1.id).await.unwrap();
        let a2 = backend.create_author(author_draft("Mary")).await.unwrap();

        assert_ne!(a1.id, a2.id);
        assert!(a2.id > a1.id);
    }

    #[tokio::test]
    async fn test_list_ascending_by_id() {
        let backend = MemoryBackend::new();

        for name in ["Ada", "Mary", "Emily"] {
            backend.create_author(author_draft(name)).await.unwrap();
        }

        let authors = backend.list_authors().await.unwrap();
        let ids: Vec<i64> = authors.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_create_book_rejects_dangling_author() {
        let backend = MemoryBackend::new();

        let err = backend.create_book(book_draft("Notes", 42)).await.unwrap_err();
        assert!(matches!(err, StorageError::ForeignKey { author_id: 42 }));

        // Nothing was persisted
        assert!(backend.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cascade_removes_all_books() {
        let backend = MemoryBackend::new();

        let ada = backend.create_author(author_draft("Ada")).await.unwrap();
        let mary = backend.create_author(author_draft("Mary")).await.unwrap();

        for i in 0..3 {
            backend
                .create_book(book_draft(&format!("Ada {i}"), ada.id))
                .await
                .unwrap();
        }
        let kept = backend
            .create_book(book_draft("Frankenstein", mary.id))
            .await
            .unwrap();

        let removed = backend.delete_author(ada.id).await.unwrap();
        assert_eq!(removed, 3);

        let books = backend.list_books().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_delete_books_by_author_idempotent() {
        let backend = MemoryBackend::new();

        let ada = backend.create_author(author_draft("Ada")).await.unwrap();
        backend.create_book(book_draft("Notes", ada.id)).await.unwrap();

        assert_eq!(backend.delete_books_by_author(ada.id).await.unwrap(), 1);
        assert_eq!(backend.delete_books_by_author(ada.id).await.unwrap(), 0);
        // Unknown author is not an error either
        assert_eq!(backend.delete_books_by_author(999).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cascade_races_book_create_without_orphans() {
        // A book-create racing the author cascade must fully precede it
        // (book created, then cascaded away) or fully follow it (foreign key
        // rejection). Either way no orphan book is observable afterwards.
        for _ in 0..50 {
            let backend = Arc::new(MemoryBackend::new());
            let ada = backend.create_author(author_draft("Ada")).await.unwrap();

            let creator = {
                let backend = backend.clone();
                let author_id = ada.id;
                tokio::spawn(async move {
                    backend.create_book(book_draft("Racer", author_id)).await
                })
            };
            let deleter = {
                let backend = backend.clone();
                let author_id = ada.id;
                tokio::spawn(async move { backend.delete_author(author_id).await })
            };

            let _ = creator.await.unwrap();
            deleter.await.unwrap().unwrap();

            let books = backend.list_books().await.unwrap();
            assert!(
                books.iter().all(|book| book.author_id != ada.id),
                "orphan book survived the cascade"
            );
        }
    }

    #[tokio::test]
    async fn test_update_refreshes_timestamp() {
        let backend = MemoryBackend::new();

        let ada = backend.create_author(author_draft("Ada")).await.unwrap();
        let updated = backend
            .update_author(ada.id, author_draft("Ada Lovelace"))
            .await
            .unwrap();

        assert_eq!(updated.name, "Ada Lovelace");
        assert!(updated.updated_at > ada.updated_at);
    }
}
