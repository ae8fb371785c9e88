use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use quill_types::{Book, BookOrdering, CreateBookRequest};

use super::{get_user_from_headers, ApiError, ApiResult};
use crate::db::repositories::{AuthorRepository, BookFilter, BookRepository};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GetBooksQuery {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publication_year: Option<i32>,
    #[serde(default)]
    author_id: Option<Uuid>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    ordering: Option<String>,
}

fn validate_book(payload: &CreateBookRequest, author_repo: &AuthorRepository) -> ApiResult<()> {
    let mut fields = HashMap::new();

    if payload.title.trim().is_empty() {
        fields.insert("title".to_string(), "Title cannot be empty".to_string());
    }
    let current_year = Utc::now().year();
    if payload.publication_year > current_year {
        fields.insert(
            "publication_year".to_string(),
            format!("Publication year cannot be later than {current_year}"),
        );
    }
    if author_repo
        .get_by_id(&payload.author_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_none()
    {
        fields.insert(
            "author_id".to_string(),
            "Referenced author does not exist".to_string(),
        );
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(fields))
    }
}

/// GET /books - List books with filters, search, and ordering
pub async fn get_books(
    State(state): State<AppState>,
    Query(query): Query<GetBooksQuery>,
) -> ApiResult<Json<Vec<Book>>> {
    let repo = BookRepository::new(state.db.pool.clone());

    let ordering = query
        .ordering
        .as_deref()
        .and_then(BookOrdering::parse)
        .unwrap_or_default();

    let filter = BookFilter {
        title: query.title,
        publication_year: query.publication_year,
        author_id: query.author_id,
        search: query.search,
        ordering,
    };

    let books = repo
        .list(&filter)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(books))
}

/// GET /books/:id - Get a single book
pub async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<Book>> {
    let repo = BookRepository::new(state.db.pool.clone());
    let book = repo
        .get_by_id(&book_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))?;

    Ok(Json(book))
}

/// POST /books - Create a new book (authenticated)
pub async fn create_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateBookRequest>,
) -> ApiResult<Json<Book>> {
    get_user_from_headers(&state, &headers)?;

    let pool = state.db.pool.clone();
    let book_repo = BookRepository::new(pool.clone());
    let author_repo = AuthorRepository::new(pool);

    validate_book(&payload, &author_repo)?;

    let author = author_repo
        .get_by_id(&payload.author_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Author not found".to_string()))?;

    let book = Book {
        id: Uuid::new_v4(),
        title: payload.title.trim().to_string(),
        author_id: author.id,
        author_name: author.name,
        publication_year: payload.publication_year,
    };

    book_repo
        .create(&book)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(book))
}

/// PUT /books/:id - Update a book (authenticated)
pub async fn update_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<CreateBookRequest>,
) -> ApiResult<Json<Book>> {
    get_user_from_headers(&state, &headers)?;

    let pool = state.db.pool.clone();
    let book_repo = BookRepository::new(pool.clone());
    let author_repo = AuthorRepository::new(pool);

    if book_repo
        .get_by_id(&book_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::NotFound("Book not found".to_string()));
    }

    validate_book(&payload, &author_repo)?;

    let author = author_repo
        .get_by_id(&payload.author_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Author not found".to_string()))?;

    let book = Book {
        id: book_id,
        title: payload.title.trim().to_string(),
        author_id: author.id,
        author_name: author.name,
        publication_year: payload.publication_year,
    };

    book_repo
        .update(&book)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(book))
}

/// DELETE /books/:id - Delete a book (authenticated)
pub async fn delete_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    get_user_from_headers(&state, &headers)?;

    let repo = BookRepository::new(state.db.pool.clone());
    let deleted = repo
        .delete(&book_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Book not found".to_string()));
    }

    Ok(Json(serde_json::json!({
        "message": "Book deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::state::AppState;
    use axum::http::HeaderValue;
    use quill_types::RepeatPolicy;

    const ALICE: &str = "550e8400-e29b-41d4-a716-446655440001";
    const ACHEBE: &str = "150e8400-e29b-41d4-a716-446655440001";

    fn setup_test_state() -> AppState {
        let db = Database::in_memory().expect("Failed to create test database");
        db.seed_test_data().expect("Failed to seed test data");
        AppState::new(db, RepeatPolicy::Reject)
    }

    fn login_as(state: &AppState, user_id: &str) -> HeaderMap {
        let user_id = Uuid::parse_str(user_id).unwrap();
        let token = state
            .session_manager
            .create_session(user_id)
            .expect("Failed to create session");
        let mut headers = HeaderMap::new();
        headers.insert("X-Session-Token", HeaderValue::from_str(&token).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_create_book_requires_auth() {
        let state = setup_test_state();
        let payload = CreateBookRequest {
            title: "No Longer at Ease".to_string(),
            author_id: Uuid::parse_str(ACHEBE).unwrap(),
            publication_year: 1960,
        };

        let result = create_book(State(state), HeaderMap::new(), Json(payload)).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_create_book_rejects_future_year() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let payload = CreateBookRequest {
            title: "From the Future".to_string(),
            author_id: Uuid::parse_str(ACHEBE).unwrap(),
            publication_year: Utc::now().year() + 1,
        };

        let result = create_book(State(state), headers, Json(payload)).await;
        match result {
            Err(ApiError::Validation(fields)) => {
                assert!(fields.contains_key("publication_year"));
            }
            other => panic!("expected validation error, got {:?}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn test_create_book_rejects_missing_author() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let payload = CreateBookRequest {
            title: "Orphaned".to_string(),
            author_id: Uuid::new_v4(),
            publication_year: 2000,
        };

        let result = create_book(State(state), headers, Json(payload)).await;
        match result {
            Err(ApiError::Validation(fields)) => {
                assert!(fields.contains_key("author_id"));
            }
            other => panic!("expected validation error, got {:?}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn test_year_filter_returns_matching_subset() {
        let state = setup_test_state();
        let query = GetBooksQuery {
            title: None,
            publication_year: Some(2023),
            author_id: None,
            search: None,
            ordering: None,
        };

        let Json(books) = get_books(State(state), Query(query))
            .await
            .expect("list failed");
        assert_eq!(books.len(), 2);
        assert!(books.iter().all(|b| b.publication_year == 2023));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let book_id = Uuid::parse_str("250e8400-e29b-41d4-a716-446655440001").unwrap();

        delete_book(State(state.clone()), headers, Path(book_id))
            .await
            .expect("delete failed");

        let result = get_book(State(state), Path(book_id)).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
