//! PostgresBackend - Durable Storage
//!
//! TigerStyle: real database storage behind the same trait as the in-memory
//! backend.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS authors (
//!     id BIGSERIAL PRIMARY KEY,
//!     name TEXT NOT NULL,
//!     birthdate DATE NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE TABLE IF NOT EXISTS books (
//!     id BIGSERIAL PRIMARY KEY,
//!     title TEXT NOT NULL,
//!     author_id BIGINT NOT NULL REFERENCES authors(id),
//!     description TEXT,
//!     release_date DATE,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! ```
//!
//! `BIGSERIAL` sequences never hand out an id twice, and the `REFERENCES`
//! constraint backs the same referential guarantee the trait demands. The
//! author cascade runs as an explicit transaction: delete books, delete
//! author, commit - on any failure the whole unit rolls back.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::model::{bump_timestamp, Author, Book, NewAuthor, NewBook};

use super::backend::StorageBackend;
use super::error::{StorageError, StorageResult};

/// Postgres error code for foreign-key violations.
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

// =============================================================================
// PostgresBackend
// =============================================================================

/// PostgreSQL storage backend for durable use.
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Create a backend from a connection string, initialising the schema.
    ///
    /// # Errors
    /// Returns an error if the connection fails or the schema cannot be
    /// created.
    pub async fn new(connection_string: &str) -> StorageResult<Self> {
        // Preconditions
        assert!(
            !connection_string.is_empty(),
            "connection string cannot be empty"
        );
        assert!(
            connection_string.starts_with("postgres://")
                || connection_string.starts_with("postgresql://"),
            "connection string must be a postgres URL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(connection_string)
            .await
            .map_err(|e| StorageError::connection(format!("failed to connect: {e}")))?;

        let backend = Self { pool };
        backend.init_schema().await?;

        Ok(backend)
    }

    /// Create from an existing pool, initialising the schema.
    pub async fn from_pool(pool: PgPool) -> StorageResult<Self> {
        let backend = Self { pool };
        backend.init_schema().await?;
        Ok(backend)
    }

    async fn init_schema(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS authors (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                birthdate DATE NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );
            CREATE TABLE IF NOT EXISTS books (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                author_id BIGINT NOT NULL REFERENCES authors(id),
                description TEXT,
                release_date DATE,
                updated_at TIMESTAMPTZ NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_books_author ON books(author_id);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::internal(format!("failed to create schema: {e}")))?;

        Ok(())
    }

    /// Get the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

fn map_foreign_key(err: sqlx::Error, author_id: i64) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(PG_FOREIGN_KEY_VIOLATION) {
            return StorageError::foreign_key(author_id);
        }
    }
    StorageError::write(format!("failed to write book: {err}"))
}

fn row_to_author(row: &PgRow) -> StorageResult<Author> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| StorageError::internal(e.to_string()))?;
    let name: String = row
        .try_get("name")
        .map_err(|e| StorageError::internal(e.to_string()))?;
    let birthdate: NaiveDate = row
        .try_get("birthdate")
        .map_err(|e| StorageError::internal(e.to_string()))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| StorageError::internal(e.to_string()))?;

    Ok(Author { id, name, birthdate, updated_at })
}

fn row_to_book(row: &PgRow) -> StorageResult<Book> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| StorageError::internal(e.to_string()))?;
    let title: String = row
        .try_get("title")
        .map_err(|e| StorageError::internal(e.to_string()))?;
    let author_id: i64 = row
        .try_get("author_id")
        .map_err(|e| StorageError::internal(e.to_string()))?;
    let description: Option<String> = row
        .try_get("description")
        .map_err(|e| StorageError::internal(e.to_string()))?;
    let release_date: Option<NaiveDate> = row
        .try_get("release_date")
        .map_err(|e| StorageError::internal(e.to_string()))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| StorageError::internal(e.to_string()))?;

    Ok(Book { id, title, author_id, description, release_date, updated_at })
}

// =============================================================================
// StorageBackend Implementation
// =============================================================================

#[async_trait]
impl StorageBackend for PostgresBackend {
    async fn create_author(&self, draft: NewAuthor) -> StorageResult<Author> {
        let row = sqlx::query(
            r#"
            INSERT INTO authors (name, birthdate, updated_at)
            VALUES ($1, $2, $3)
            RETURNING id, name, birthdate, updated_at
            "#,
        )
        .bind(&draft.name)
        .bind(draft.birthdate)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::write(format!("failed to insert author: {e}")))?;

        row_to_author(&row)
    }

    async fn get_author(&self, id: i64) -> StorageResult<Option<Author>> {
        let row = sqlx::query("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::read(format!("failed to get author: {e}")))?;

        row.as_ref().map(row_to_author).transpose()
    }

    async fn list_authors(&self) -> StorageResult<Vec<Author>> {
        let rows = sqlx::query("SELECT * FROM authors ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::read(format!("failed to list authors: {e}")))?;

        rows.iter().map(row_to_author).collect()
    }

    async fn update_author(&self, id: i64, draft: NewAuthor) -> StorageResult<Author> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::write(format!("failed to begin: {e}")))?;

        let row = sqlx::query("SELECT * FROM authors WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StorageError::read(format!("failed to get author: {e}")))?
            .ok_or_else(|| StorageError::not_found("author", id))?;
        let prev = row_to_author(&row)?;

        let updated_at = bump_timestamp(prev.updated_at, Utc::now());
        let row = sqlx::query(
            r#"
            UPDATE authors
            SET name = $2, birthdate = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, name, birthdate, updated_at
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(draft.birthdate)
        .bind(updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StorageError::write(format!("failed to update author: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::write(format!("failed to commit: {e}")))?;

        row_to_author(&row)
    }

    async fn delete_author(&self, id: i64) -> StorageResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::write(format!("failed to begin: {e}")))?;

        let cascaded = sqlx::query("DELETE FROM books WHERE author_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::write(format!("failed to cascade books: {e}")))?
            .rows_affected();

        let removed = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::write(format!("failed to delete author: {e}")))?
            .rows_affected();

        if removed == 0 {
            // Roll back the cascade; the author never existed.
            tx.rollback()
                .await
                .map_err(|e| StorageError::write(format!("failed to rollback: {e}")))?;
            return Err(StorageError::not_found("author", id));
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::write(format!("failed to commit: {e}")))?;

        Ok(cascaded)
    }

    async fn create_book(&self, draft: NewBook) -> StorageResult<Book> {
        let row = sqlx::query(
            r#"
            INSERT INTO books (title, author_id, description, release_date, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, author_id, description, release_date, updated_at
            "#,
        )
        .bind(&draft.title)
        .bind(draft.author_id)
        .bind(&draft.description)
        .bind(draft.release_date)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_foreign_key(e, draft.author_id))?;

        row_to_book(&row)
    }

    async fn get_book(&self, id: i64) -> StorageResult<Option<Book>> {
        let row = sqlx::query("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::read(format!("failed to get book: {e}")))?;

        row.as_ref().map(row_to_book).transpose()
    }

    async fn list_books(&self) -> StorageResult<Vec<Book>> {
        let rows = sqlx::query("SELECT * FROM books ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::read(format!("failed to list books: {e}")))?;

        rows.iter().map(row_to_book).collect()
    }

    async fn update_book(&self, id: i64, draft: NewBook) -> StorageResult<Book> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::write(format!("failed to begin: {e}")))?;

        let row = sqlx::query("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StorageError::read(format!("failed to get book: {e}")))?
            .ok_or_else(|| StorageError::not_found("book", id))?;
        let prev = row_to_book(&row)?;

        let updated_at = bump_timestamp(prev.updated_at, Utc::now());
        let row = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, author_id = $3, description = $4,
                release_date = $5, updated_at = $6
            WHERE id = $1
            RETURNING id, title, author_id, description, release_date, updated_at
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(draft.author_id)
        .bind(&draft.description)
        .bind(draft.release_date)
        .bind(updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_foreign_key(e, draft.author_id))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::write(format!("failed to commit: {e}")))?;

        row_to_book(&row)
    }

    async fn delete_book(&self, id: i64) -> StorageResult<()> {
        let removed = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::write(format!("failed to delete book: {e}")))?
            .rows_affected();

        if removed == 0 {
            return Err(StorageError::not_found("book", id));
        }
        Ok(())
    }

    async fn delete_books_by_author(&self, author_id: i64) -> StorageResult<u64> {
        let removed = sqlx::query("DELETE FROM books WHERE author_id = $1")
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::write(format!("failed to delete books: {e}")))?
            .rows_affected();

        Ok(removed)
    }
}

// =============================================================================
// Tests (require running Postgres)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn test_db_url() -> Option<String> {
        env::var("TEST_POSTGRES_URL").ok()
    }

    /// Skip test if no database available.
    macro_rules! require_db {
        () => {
            match test_db_url() {
                Some(url) => url,
                None => {
                    eprintln!("Skipping test: TEST_POSTGRES_URL not set");
                    return;
                }
            }
        };
    }

    async fn clear(backend: &PostgresBackend) {
        sqlx::query("DELETE FROM books")
            .execute(backend.pool())
            .await
            .unwrap();
        sqlx::query("DELETE FROM authors")
            .execute(backend.pool())
            .await
            .unwrap();
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_postgres_author_crud() {
        let url = require_db!();
        let backend = PostgresBackend::new(&url).await.unwrap();
        clear(&backend).await;

        let ada = backend
            .create_author(NewAuthor {
                name: "Ada Lovelace".to_string(),
                birthdate: date("1815-12-10"),
            })
            .await
            .unwrap();

        let fetched = backend.get_author(ada.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Ada Lovelace");

        let updated = backend
            .update_author(
                ada.id,
                NewAuthor { name: "A. Lovelace".to_string(), birthdate: ada.birthdate },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "A. Lovelace");
        assert!(updated.updated_at > ada.updated_at);

        backend.delete_author(ada.id).await.unwrap();
        assert!(backend.get_author(ada.id).await.unwrap().is_none());

        backend.close().await;
    }

    #[tokio::test]
    async fn test_postgres_foreign_key_and_cascade() {
        let url = require_db!();
        let backend = PostgresBackend::new(&url).await.unwrap();
        clear(&backend).await;

        // Dangling FK is rejected as such
        let err = backend
            .create_book(NewBook {
                title: "Ghost".to_string(),
                author_id: -1,
                description: None,
                release_date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ForeignKey { .. }));

        let ada = backend
            .create_author(NewAuthor {
                name: "Ada Lovelace".to_string(),
                birthdate: date("1815-12-10"),
            })
            .await
            .unwrap();
        for i in 0..2 {
            backend
                .create_book(NewBook {
                    title: format!("Notes {i}"),
                    author_id: ada.id,
                    description: None,
                    release_date: None,
                })
                .await
                .unwrap();
        }

        let cascaded = backend.delete_author(ada.id).await.unwrap();
        assert_eq!(cascaded, 2);
        assert!(backend.list_books().await.unwrap().is_empty());

        backend.close().await;
    }
}
