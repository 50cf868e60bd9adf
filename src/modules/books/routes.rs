//! HTTP handlers for the catalog.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::{error::AppError, response::ApiResponse};

use super::models::{BookDetail, BookFilter, BookList, BookPayload, CreatedBook, ListQuery};
use super::store::{BookError, BookStore};

impl From<BookError> for AppError {
    fn from(error: BookError) -> Self {
        match error {
            BookError::InvalidInput(message) => AppError::bad_request(message),
            BookError::NotFound(message) => AppError::not_found(message),
            e @ BookError::Timestamp(_) => AppError::Internal(e.into()),
        }
    }
}

/// Catalog routes, relative to the module mount point
pub fn router(store: Arc<BookStore>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
        .with_state(store)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn create_book(
    State(store): State<Arc<BookStore>>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<ApiResponse<CreatedBook>, AppError> {
    let Json(payload) = payload?;
    let book_id = store.create(payload).await?;

    Ok(ApiResponse::with_data(CreatedBook { book_id })
        .message("book added successfully")
        .status_code(StatusCode::CREATED))
}

async fn list_books(
    State(store): State<Arc<BookStore>>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResponse<BookList> {
    // Listing never fails; an unreadable query string means no filters
    let query: ListQuery = match pairs {
        Ok(Query(pairs)) => pairs.into_iter().collect(),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "ignoring unreadable list query");
            ListQuery::default()
        }
    };
    let books = store.list(&BookFilter::from(query)).await;

    ApiResponse::with_data(BookList { books })
}

async fn get_book(
    State(store): State<Arc<BookStore>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<ApiResponse<BookDetail>, AppError> {
    let Path(id) = id?;
    let book = store.get(&id).await?;

    Ok(ApiResponse::with_data(BookDetail { book }))
}

async fn update_book(
    State(store): State<Arc<BookStore>>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<ApiResponse, AppError> {
    let Path(id) = id?;
    // Unknown ids answer 404 even when the body is unusable
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            store.get(&id).await.map_err(|_| {
                AppError::not_found("cannot update book: id not found")
            })?;
            return Err(rejection.into());
        }
    };
    store.update(&id, payload).await?;

    Ok(ApiResponse::success("book updated successfully"))
}

async fn delete_book(
    State(store): State<Arc<BookStore>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<ApiResponse, AppError> {
    let Path(id) = id?;
    store.delete(&id).await?;

    Ok(ApiResponse::success("book deleted successfully"))
}
