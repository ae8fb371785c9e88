use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use quill_types::{Comment, CreateCommentRequest, UpdateCommentRequest};

use super::{get_user_from_headers, ApiError, ApiResult};
use crate::db::repositories::{CommentRepository, PostRepository, UserRepository};
use crate::state::AppState;

/// GET /posts/:id/comments - Threaded comments for a post
///
/// Parents always precede their replies in the returned list.
pub async fn get_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    let pool = state.db.pool.clone();
    let post_repo = PostRepository::new(pool.clone());
    let comment_repo = CommentRepository::new(pool);

    if post_repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let comments = comment_repo
        .get_thread(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(comments))
}

fn validate_comment(content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        let mut fields = HashMap::new();
        fields.insert(
            "content".to_string(),
            "Comment content cannot be empty".to_string(),
        );
        return Err(ApiError::Validation(fields));
    }
    Ok(())
}

/// POST /posts/:id/comments - Add a comment or reply
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    validate_comment(&payload.content)?;

    let author_id = get_user_from_headers(&state, &headers)?;

    let pool = state.db.pool.clone();
    let post_repo = PostRepository::new(pool.clone());
    let comment_repo = CommentRepository::new(pool.clone());
    let user_repo = UserRepository::new(pool);

    if post_repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    // A reply's parent must be a comment on the same post
    if let Some(parent_id) = &payload.parent_id {
        let parent = comment_repo
            .get_by_id(parent_id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?
            .ok_or_else(|| ApiError::BadRequest("Parent comment not found".to_string()))?;

        if parent.post_id != post_id {
            return Err(ApiError::BadRequest(
                "Parent comment belongs to a different post".to_string(),
            ));
        }
    }

    let author = user_repo
        .get_by_id(&author_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Author not found".to_string()))?;

    let comment = Comment {
        id: Uuid::new_v4(),
        post_id,
        author_id,
        author_username: author.username,
        content: payload.content,
        parent_comment_id: payload.parent_id,
        created_at: Utc::now(),
        reply_count: 0,
    };

    comment_repo
        .create(&comment)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(comment))
}

/// GET /comments/:id - Get a single comment
pub async fn get_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
) -> ApiResult<Json<Comment>> {
    let repo = CommentRepository::new(state.db.pool.clone());
    let comment = repo
        .get_by_id(&comment_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    Ok(Json(comment))
}

/// Fetch a comment and check the requester owns it
fn get_owned_comment(
    repo: &CommentRepository,
    comment_id: &Uuid,
    user_id: &Uuid,
) -> Result<Comment, ApiError> {
    let comment = repo
        .get_by_id(comment_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != *user_id {
        return Err(ApiError::Forbidden(
            "Only the author can modify this comment".to_string(),
        ));
    }

    Ok(comment)
}

/// PUT /comments/:id - Edit a comment (author only)
pub async fn update_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    validate_comment(&payload.content)?;

    let user_id = get_user_from_headers(&state, &headers)?;

    let repo = CommentRepository::new(state.db.pool.clone());
    get_owned_comment(&repo, &comment_id, &user_id)?;

    repo.update_content(&comment_id, &payload.content)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let comment = repo
        .get_by_id(&comment_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    Ok(Json(comment))
}

/// DELETE /comments/:id - Delete a comment and its replies (author only)
pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let repo = CommentRepository::new(state.db.pool.clone());
    get_owned_comment(&repo, &comment_id, &user_id)?;

    repo.delete(&comment_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "Comment deleted"
    })))
}
