//! Named Limits
//!
//! TigerStyle: every limit is a named constant with its unit in the name.

/// Maximum author name length in characters
pub const AUTHOR_NAME_CHARS_MAX: usize = 128;

/// Maximum book title length in characters
pub const BOOK_TITLE_CHARS_MAX: usize = 128;

/// Maximum book description length in bytes
pub const BOOK_DESCRIPTION_BYTES_MAX: usize = 16_384;
