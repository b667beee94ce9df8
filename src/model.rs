//! Records - Author and Book Data
//!
//! TigerStyle: explicit fields, already-parsed primitives at the boundary.
//!
//! The crate owns two entities in a 1—N relationship:
//!
//! ```text
//! ┌──────────┐ 1      N ┌──────────┐
//! │  Author  │──────────│   Book   │
//! └──────────┘          └──────────┘
//!       id  ←──────────  author_id
//! ```
//!
//! Drafts ([`NewAuthor`], [`NewBook`]) carry caller input; persisted records
//! ([`Author`], [`Book`]) additionally carry the storage-assigned id and the
//! mutation timestamp.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Author
// =============================================================================

/// A persisted author record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Unique identifier, assigned by storage on creation, immutable
    pub id: i64,
    /// Display name (non-empty, bounded by `AUTHOR_NAME_CHARS_MAX`)
    pub name: String,
    /// Date of birth
    pub birthdate: NaiveDate,
    /// Timestamp of the most recent successful mutation
    pub updated_at: DateTime<Utc>,
}

/// Caller input for creating or updating an author.
///
/// Updates are full-record replaces of the mutable fields, so the same draft
/// type serves both paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    /// Display name
    pub name: String,
    /// Date of birth
    pub birthdate: NaiveDate,
}

// =============================================================================
// Book
// =============================================================================

/// A persisted book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier, assigned by storage on creation, immutable
    pub id: i64,
    /// Title (non-empty, bounded by `BOOK_TITLE_CHARS_MAX`)
    pub title: String,
    /// Owning author; always references an existing [`Author`]
    pub author_id: i64,
    /// Optional long-form description
    pub description: Option<String>,
    /// Optional publication date
    pub release_date: Option<NaiveDate>,
    /// Timestamp of the most recent successful mutation
    pub updated_at: DateTime<Utc>,
}

/// Caller input for creating or updating a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    /// Title
    pub title: String,
    /// Owning author id; must resolve at write time
    pub author_id: i64,
    /// Optional long-form description
    pub description: Option<String>,
    /// Optional publication date
    pub release_date: Option<NaiveDate>,
}

/// A book joined with its author for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookWithAuthor {
    /// The book record
    pub book: Book,
    /// The author the book references
    pub author: Author,
}

// =============================================================================
// Timestamps
// =============================================================================

/// Next `updated_at` value for a record whose previous value is `prev`.
///
/// `updated_at` must be strictly greater after every successful mutation,
/// even if the wall clock has not advanced past the previous value.
#[must_use]
pub(crate) fn bump_timestamp(prev: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let next = if now > prev {
        now
    } else {
        prev + Duration::nanoseconds(1)
    };

    // Postcondition
    assert!(next > prev, "updated_at must move forward");

    next
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_bump_timestamp_advancing_clock() {
        let prev = Utc::now();
        let now = prev + Duration::milliseconds(5);
        assert_eq!(bump_timestamp(prev, now), now);
    }

    #[test]
    fn test_bump_timestamp_stalled_clock() {
        let prev = Utc::now();

        let next = bump_timestamp(prev, prev);
        assert!(next > prev);

        // Clock regressions must not move updated_at backwards either
        let next = bump_timestamp(prev, prev - Duration::seconds(1));
        assert!(next > prev);
    }

    #[test]
    fn test_draft_carries_parsed_date() {
        let draft = NewAuthor {
            name: "Ada Lovelace".to_string(),
            birthdate: date("1815-12-10"),
        };
        assert_eq!(draft.birthdate.to_string(), "1815-12-10");
    }
}
