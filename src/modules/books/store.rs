//! In-process book catalog with optional JSON snapshot persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use super::models::{normalize_isbn, BookId, BookPatch, BookRecord, NewBook};
use super::validation::{validate_book, BookFields, FieldError};

/// Errors returned by [`BookStore`] operations.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("invalid book: {}", describe(.0))]
    Validation(Vec<FieldError>),

    #[error("book {0} not found")]
    NotFound(BookId),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// On-disk layout of a catalog snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    next_id: u64,
    books: Vec<BookRecord>,
}

#[derive(Debug, Clone)]
struct Catalog {
    next_id: u64,
    last_created_at: Option<OffsetDateTime>,
    books: BTreeMap<BookId, BookRecord>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            next_id: 1,
            last_created_at: None,
            books: BTreeMap::new(),
        }
    }
}

impl Catalog {
    fn from_snapshot(snapshot: Snapshot) -> anyhow::Result<Self> {
        let mut catalog = Catalog::default();

        for mut book in snapshot.books {
            let id = book.id;
            book.isbn = normalize_isbn(book.isbn);
            validate_book(&BookFields {
                title: &book.title,
                author: &book.author,
                isbn: book.isbn.as_deref(),
            })
            .map_err(|errors| anyhow::anyhow!("book {}: {}", id, describe(&errors)))?;

            catalog.last_created_at = catalog.last_created_at.max(Some(book.created_at));
            if catalog.books.insert(id, book).is_some() {
                anyhow::bail!("snapshot contains book {} more than once", id);
            }
        }

        // Never hand out an id at or below one already stored.
        let after_last = match catalog.books.keys().next_back() {
            Some(last) => last
                .0
                .checked_add(1)
                .with_context(|| format!("book id {} is out of range", last))?,
            None => 1,
        };
        catalog.next_id = snapshot.next_id.max(after_last);

        Ok(catalog)
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            next_id: self.next_id,
            books: self.books.values().cloned().collect(),
        }
    }

    fn insert(&mut self, new_book: NewBook) -> Result<BookRecord, BookError> {
        let id = BookId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .context("book id space exhausted")?;

        let created_at = next_created_at(self.last_created_at, OffsetDateTime::now_utc());
        self.last_created_at = Some(created_at);

        let record = BookRecord {
            id,
            title: new_book.title,
            author: new_book.author,
            isbn: new_book.isbn,
            is_issued: false,
            created_at,
        };
        self.books.insert(id, record.clone());
        Ok(record)
    }
}

/// Creation timestamps never go backwards, even if the wall clock does.
fn next_created_at(last: Option<OffsetDateTime>, now: OffsetDateTime) -> OffsetDateTime {
    match last {
        Some(last) if last > now => last,
        _ => now,
    }
}

/// Normalize the ISBN, then check every field.
fn prepare_new(mut book: NewBook) -> Result<NewBook, BookError> {
    book.isbn = normalize_isbn(book.isbn);
    validate_book(&BookFields {
        title: &book.title,
        author: &book.author,
        isbn: book.isbn.as_deref(),
    })
    .map_err(BookError::Validation)?;
    Ok(book)
}

/// Shared handle to the book catalog.
///
/// Clones share the same records. Every operation holds the lock for its whole
/// duration, so callers never observe a partially applied change.
#[derive(Debug, Clone, Default)]
pub struct BookStore {
    catalog: Arc<RwLock<Catalog>>,
    snapshot_path: Option<Arc<PathBuf>>,
}

impl BookStore {
    /// A catalog that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the catalog persisted at `path`, or start an empty one there.
    ///
    /// Every successful mutation rewrites the snapshot.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BookError> {
        let path = path.into();

        let catalog = if path.exists() {
            let raw = std::fs::read(&path)
                .with_context(|| format!("failed to read catalog snapshot {}", path.display()))?;
            let snapshot: Snapshot = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse catalog snapshot {}", path.display()))?;
            Catalog::from_snapshot(snapshot)
                .with_context(|| format!("invalid catalog snapshot {}", path.display()))?
        } else {
            Catalog::default()
        };

        tracing::info!(
            path = %path.display(),
            books = catalog.books.len(),
            "book catalog opened"
        );

        Ok(Self {
            catalog: Arc::new(RwLock::new(catalog)),
            snapshot_path: Some(Arc::new(path)),
        })
    }

    /// Path of the backing snapshot, if any.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref().map(PathBuf::as_path)
    }

    pub fn create(&self, new_book: NewBook) -> Result<BookRecord, BookError> {
        let new_book = prepare_new(new_book)?;

        let record = self.mutate(|catalog| catalog.insert(new_book))?;
        tracing::info!(book_id = %record.id, title = %record.title, "book created");
        Ok(record)
    }

    pub fn get(&self, id: BookId) -> Result<BookRecord, BookError> {
        self.read()
            .books
            .get(&id)
            .cloned()
            .ok_or(BookError::NotFound(id))
    }

    /// All books in creation order.
    pub fn list(&self) -> Vec<BookRecord> {
        self.read().books.values().cloned().collect()
    }

    /// Apply `patch` to the book; nothing changes unless the result is valid.
    pub fn update(&self, id: BookId, patch: BookPatch) -> Result<BookRecord, BookError> {
        let record = self.mutate(|catalog| {
            let current = catalog.books.get(&id).ok_or(BookError::NotFound(id))?;

            let mut updated = current.clone();
            if let Some(title) = patch.title {
                updated.title = title;
            }
            if let Some(author) = patch.author {
                updated.author = author;
            }
            if let Some(isbn) = patch.isbn {
                updated.isbn = normalize_isbn(isbn);
            }
            if let Some(is_issued) = patch.is_issued {
                updated.is_issued = is_issued;
            }

            validate_book(&BookFields {
                title: &updated.title,
                author: &updated.author,
                isbn: updated.isbn.as_deref(),
            })
            .map_err(BookError::Validation)?;

            catalog.books.insert(id, updated.clone());
            Ok(updated)
        })?;

        tracing::info!(book_id = %id, is_issued = record.is_issued, "book updated");
        Ok(record)
    }

    /// Remove the book and return what was stored.
    pub fn delete(&self, id: BookId) -> Result<BookRecord, BookError> {
        let record =
            self.mutate(|catalog| catalog.books.remove(&id).ok_or(BookError::NotFound(id)))?;
        tracing::info!(book_id = %id, title = %record, "book deleted");
        Ok(record)
    }

    /// Create several books at once; either all are stored or none.
    pub fn seed<I>(&self, books: I) -> Result<Vec<BookRecord>, BookError>
    where
        I: IntoIterator<Item = NewBook>,
    {
        let books = books
            .into_iter()
            .map(prepare_new)
            .collect::<Result<Vec<_>, _>>()?;

        let records: Vec<BookRecord> = self.mutate(|catalog| {
            books.into_iter().map(|book| catalog.insert(book)).collect()
        })?;
        tracing::info!(count = records.len(), "book catalog seeded");
        Ok(records)
    }

    pub fn len(&self) -> usize {
        self.read().books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().books.is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `change` under the write lock and persist the result. If `change`
    /// fails or the snapshot cannot be written, the in-memory catalog is
    /// rolled back.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Catalog) -> Result<T, BookError>,
    ) -> Result<T, BookError> {
        let mut catalog = self.write();
        let backup = catalog.clone();

        let output = match change(&mut *catalog) {
            Ok(output) => output,
            Err(err) => {
                *catalog = backup;
                return Err(err);
            }
        };

        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(output);
        };

        if let Err(err) = write_snapshot(path, &catalog.to_snapshot()) {
            *catalog = backup;
            tracing::error!(
                path = %path.display(),
                error = ?err,
                "catalog snapshot write failed"
            );
            return Err(BookError::Storage(err));
        }

        Ok(output)
    }
}

/// Write through a sibling temp file so the snapshot is replaced atomically.
fn write_snapshot(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    let tmp_path = PathBuf::from(tmp_name);

    let bytes = serde_json::to_vec_pretty(snapshot).context("failed to encode catalog snapshot")?;
    let replaced = std::fs::write(&tmp_path, bytes)
        .with_context(|| format!("failed to write {}", tmp_path.display()))
        .and_then(|()| {
            std::fs::rename(&tmp_path, path)
                .with_context(|| format!("failed to replace {}", path.display()))
        });

    if replaced.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    replaced
}
