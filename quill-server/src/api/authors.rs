use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use uuid::Uuid;

use quill_types::{Author, AuthorWithBooks, CreateAuthorRequest};

use super::{get_user_from_headers, ApiError, ApiResult};
use crate::db::repositories::{AuthorRepository, BookRepository};
use crate::state::AppState;

/// GET /authors - List all authors with their books nested
pub async fn get_authors(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<AuthorWithBooks>>> {
    let pool = state.db.pool.clone();
    let author_repo = AuthorRepository::new(pool.clone());
    let book_repo = BookRepository::new(pool);

    let authors = author_repo
        .list_all()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let mut result = Vec::with_capacity(authors.len());
    for author in authors {
        let books = book_repo
            .get_by_author(&author.id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        result.push(AuthorWithBooks {
            id: author.id,
            name: author.name,
            books,
        });
    }

    Ok(Json(result))
}

/// GET /authors/:id - Get a single author with their books
pub async fn get_author(
    State(state): State<AppState>,
    Path(author_id): Path<Uuid>,
) -> ApiResult<Json<AuthorWithBooks>> {
    let pool = state.db.pool.clone();
    let author_repo = AuthorRepository::new(pool.clone());
    let book_repo = BookRepository::new(pool);

    let author = author_repo
        .get_by_id(&author_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Author not found".to_string()))?;

    let books = book_repo
        .get_by_author(&author.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(AuthorWithBooks {
        id: author.id,
        name: author.name,
        books,
    }))
}

/// POST /authors - Create a new author (authenticated)
pub async fn create_author(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateAuthorRequest>,
) -> ApiResult<Json<Author>> {
    get_user_from_headers(&state, &headers)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Author name cannot be empty".to_string()));
    }

    let repo = AuthorRepository::new(state.db.pool.clone());
    let author = Author {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
    };
    repo.create(&author)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(author))
}

/// PUT /authors/:id - Rename an author (authenticated)
pub async fn update_author(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(author_id): Path<Uuid>,
    Json(payload): Json<CreateAuthorRequest>,
) -> ApiResult<Json<Author>> {
    get_user_from_headers(&state, &headers)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Author name cannot be empty".to_string()));
    }

    let repo = AuthorRepository::new(state.db.pool.clone());
    let updated = repo
        .update_name(&author_id, payload.name.trim())
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if updated == 0 {
        return Err(ApiError::NotFound("Author not found".to_string()));
    }

    Ok(Json(Author {
        id: author_id,
        name: payload.name.trim().to_string(),
    }))
}

/// DELETE /authors/:id - Delete an author and their books (authenticated)
pub async fn delete_author(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(author_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    get_user_from_headers(&state, &headers)?;

    let repo = AuthorRepository::new(state.db.pool.clone());
    let deleted = repo
        .delete(&author_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Author not found".to_string()));
    }

    Ok(Json(serde_json::json!({
        "message": "Author deleted"
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
    async fn test_create_author_requires_auth() {
        let state = setup_test_state();
        let payload = CreateAuthorRequest {
            name: "Buchi Emecheta".to_string(),
        };

        let result = create_author(State(state), HeaderMap::new(), Json(payload)).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_delete_author_requires_auth() {
        let state = setup_test_state();
        let achebe = Uuid::parse_str(ACHEBE).unwrap();

        let result = delete_author(State(state), HeaderMap::new(), Path(achebe)).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_create_author_rejects_blank_name() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let payload = CreateAuthorRequest {
            name: "   ".to_string(),
        };

        let result = create_author(State(state), headers, Json(payload)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_authors_list_nests_their_books() {
        let state = setup_test_state();

        let Json(authors) = get_authors(State(state)).await.expect("list failed");
        let achebe = authors
            .iter()
            .find(|a| a.id.to_string() == ACHEBE)
            .expect("seeded author missing");
        assert_eq!(achebe.books.len(), 2);
        assert!(achebe.books.iter().all(|b| b.author_id == achebe.id));
    }

    #[tokio::test]
    async fn test_delete_author_then_get_is_not_found() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let achebe = Uuid::parse_str(ACHEBE).unwrap();

        delete_author(State(state.clone()), headers, Path(achebe))
            .await
            .expect("delete failed");

        let result = get_author(State(state), Path(achebe)).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
