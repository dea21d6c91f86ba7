use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// Maximum length of a title, in characters.
pub const TITLE_MAX_CHARS: usize = 200;
/// Maximum length of an author name, in characters.
pub const AUTHOR_MAX_CHARS: usize = 200;
/// Maximum length of an ISBN, in characters. No checksum is verified.
pub const ISBN_MAX_CHARS: usize = 13;

/// Store-assigned identifier of a book. Never reused, even after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub u64);

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for BookId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(BookId)
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Unique identifier for the book
    pub id: BookId,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// ISBN-10 or ISBN-13, if known
    pub isbn: Option<String>,
    /// Whether the book is currently checked out
    pub is_issued: bool,
    /// When the record was created
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl fmt::Display for BookRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Request model for creating a new book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    /// Title of the book; a missing key is reported as `required`
    #[serde(default)]
    pub title: String,
    /// Author of the book; a missing key is reported as `required`
    #[serde(default)]
    pub author: String,
    /// Optional ISBN; empty means none
    #[serde(default)]
    pub isbn: Option<String>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: None,
        }
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }
}

/// Partial update of a book. Absent fields are left untouched.
///
/// `isbn` is doubly optional: `None` keeps the current value while
/// `Some(None)` (JSON `null`) clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub isbn: Option<Option<String>>,
    #[serde(default)]
    pub is_issued: Option<bool>,
}

impl BookPatch {
    pub fn issued(is_issued: bool) -> Self {
        Self {
            is_issued: Some(is_issued),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.isbn.is_none()
            && self.is_issued.is_none()
    }
}

/// Marks a field as present whenever the key appears, even with a `null` value.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim surrounding whitespace; a blank ISBN is the same as a missing one.
pub(crate) fn normalize_isbn(isbn: Option<String>) -> Option<String> {
    isbn.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
