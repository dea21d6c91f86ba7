//! HTTP handlers for the books module.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use libmanager_http::error::AppError;

use super::models::{BookId, BookPatch, BookRecord, NewBook};
use super::store::{BookError, BookStore};

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        let message = err.to_string();
        match err {
            BookError::Validation(errors) => {
                let details = errors
                    .iter()
                    .map(|e| serde_json::to_value(e).unwrap_or_default())
                    .collect();
                AppError::validation(details, message)
            }
            BookError::NotFound(_) => AppError::not_found(message),
            BookError::Storage(e) => AppError::Internal(e),
        }
    }
}

/// REST routes with the store injected as state
pub fn router(store: BookStore) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .with_state(store)
}

/// Health check endpoint
async fn health_check(State(store): State<BookStore>) -> String {
    format!("books module is healthy ({} books)", store.len())
}

async fn list_books(State(store): State<BookStore>) -> Json<Vec<BookRecord>> {
    Json(store.list())
}

async fn create_book(
    State(store): State<BookStore>,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> Result<(StatusCode, Json<BookRecord>), AppError> {
    let Json(new_book) = payload?;
    let record = store.create(new_book)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_book(
    State(store): State<BookStore>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Json<BookRecord>, AppError> {
    let Path(id) = id?;
    Ok(Json(store.get(id)?))
}

async fn update_book(
    State(store): State<BookStore>,
    id: Result<Path<BookId>, PathRejection>,
    payload: Result<Json<BookPatch>, JsonRejection>,
) -> Result<Json<BookRecord>, AppError> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    Ok(Json(store.update(id, patch)?))
}

async fn delete_book(
    State(store): State<BookStore>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    store.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn validation_maps_to_details() {
        let store = BookStore::in_memory();
        let err = store.create(NewBook::new("", "Anon")).unwrap_err();

        match AppError::from(err) {
            AppError::Validation {
                details, message, ..
            } => {
                assert_eq!(
                    details,
                    vec![serde_json::json!({"field": "title", "error": "required"})]
                );
                assert_eq!(message, "invalid book: title is required");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::from(BookError::NotFound(BookId(4)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "not found: book 4 not found");
    }

    #[test]
    fn storage_maps_to_500() {
        let err = AppError::from(BookError::Storage(anyhow::anyhow!("disk full")));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
