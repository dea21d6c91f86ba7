//! Field constraints for book records, checked at the store boundary.

use serde::Serialize;

use super::models::{AUTHOR_MAX_CHARS, ISBN_MAX_CHARS, TITLE_MAX_CHARS};

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<usize>,
}

impl FieldError {
    fn required(field: &'static str) -> Self {
        Self {
            field,
            error: "required",
            max_chars: None,
        }
    }

    fn too_long(field: &'static str, max_chars: usize) -> Self {
        Self {
            field,
            error: "too_long",
            max_chars: Some(max_chars),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max_chars {
            Some(max) => write!(f, "{} must be at most {} characters", self.field, max),
            None => write!(f, "{} is required", self.field),
        }
    }
}

/// Fields that make up a book, borrowed for validation.
pub struct BookFields<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub isbn: Option<&'a str>,
}

/// Validate every field and report all violations at once.
pub fn validate_book(fields: &BookFields<'_>) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    check_required("title", fields.title, TITLE_MAX_CHARS, &mut errors);
    check_required("author", fields.author, AUTHOR_MAX_CHARS, &mut errors);

    if let Some(isbn) = fields.isbn {
        if isbn.chars().count() > ISBN_MAX_CHARS {
            errors.push(FieldError::too_long("isbn", ISBN_MAX_CHARS));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_required(field: &'static str, value: &str, max: usize, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::required(field));
    } else if value.chars().count() > max {
        errors.push(FieldError::too_long(field, max));
    }
}
