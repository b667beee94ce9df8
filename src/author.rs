//! AuthorService - Author CRUD
//!
//! Validates caller input, then drives the injected storage backend. Holds
//! no state of its own beyond the backend handle, so clones share one store.

use std::sync::Arc;

use crate::constants::AUTHOR_NAME_CHARS_MAX;
use crate::error::{CoreError, CoreResult};
use crate::model::{Author, NewAuthor};
use crate::storage::StorageBackend;

/// CRUD service over [`Author`] records.
#[derive(Debug)]
pub struct AuthorService<S> {
    storage: Arc<S>,
}

impl<S> Clone for AuthorService<S> {
    fn clone(&self) -> Self {
        Self { storage: self.storage.clone() }
    }
}

impl<S: StorageBackend> AuthorService<S> {
    /// Create a service over the given backend.
    #[must_use]
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// List all authors, ascending by id. An empty set is not an error.
    pub async fn list(&self) -> CoreResult<Vec<Author>> {
        Ok(self.storage.list_authors().await?)
    }

    /// Fetch a single author.
    ///
    /// # Errors
    /// `CoreError::NotFound` if no author with that id exists.
    pub async fn get(&self, id: i64) -> CoreResult<Author> {
        self.storage
            .get_author(id)
            .await?
            .ok_or_else(|| CoreError::not_found("author", id))
    }

    /// Create a new author.
    ///
    /// # Errors
    /// `CoreError::Validation` if the name is empty or exceeds
    /// `AUTHOR_NAME_CHARS_MAX` characters.
    pub async fn create(&self, draft: NewAuthor) -> CoreResult<Author> {
        validate_author(&draft)?;

        let author = self.storage.create_author(draft).await?;
        tracing::info!(author_id = author.id, name = %author.name, "created author");

        Ok(author)
    }

    /// Replace an author's mutable fields.
    ///
    /// # Errors
    /// `CoreError::NotFound` if the id does not exist,
    /// `CoreError::Validation` under the same rules as create.
    pub async fn update(&self, id: i64, draft: NewAuthor) -> CoreResult<Author> {
        validate_author(&draft)?;

        let author = self.storage.update_author(id, draft).await?;
        tracing::info!(author_id = author.id, "updated author");

        Ok(author)
    }

    /// Delete an author and, atomically, every book referencing it.
    ///
    /// Returns the number of cascaded books.
    ///
    /// # Errors
    /// `CoreError::NotFound` if the id does not exist. On any cascade
    /// failure the author deletion is not committed.
    pub async fn delete(&self, id: i64) -> CoreResult<u64> {
        let cascaded = self.storage.delete_author(id).await?;
        tracing::info!(author_id = id, cascaded_books = cascaded, "deleted author");

        Ok(cascaded)
    }
}

fn validate_author(draft: &NewAuthor) -> CoreResult<()> {
    if draft.name.is_empty() {
        return Err(CoreError::validation("name", "must not be empty"));
    }
    if draft.name.chars().count() > AUTHOR_NAME_CHARS_MAX {
        return Err(CoreError::validation(
            "name",
            format!("exceeds {AUTHOR_NAME_CHARS_MAX} characters"),
        ));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
