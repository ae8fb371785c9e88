use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use quill_types::{
    CreatePostRequest, Notification, Page, Post, PostOrdering, RepeatPolicy, UpdatePostRequest,
};

use super::{get_user_from_headers, ApiError, ApiResult, PaginationQuery};
use crate::db::repositories::{
    LikeRepository, NotificationRepository, PostFilter, PostRepository, TagRepository,
    UserRepository,
};
use crate::state::AppState;

const MAX_TITLE_LENGTH: usize = 200;

#[derive(Deserialize)]
pub struct GetPostsQuery {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    ordering: Option<String>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    page_size: Option<u32>,
}

fn validate_post(title: &str, content: &str) -> Result<(), ApiError> {
    let mut fields = HashMap::new();

    if title.trim().is_empty() {
        fields.insert("title".to_string(), "Title cannot be empty".to_string());
    }
    if title.len() > MAX_TITLE_LENGTH {
        fields.insert(
            "title".to_string(),
            format!("Title exceeds {MAX_TITLE_LENGTH} character limit"),
        );
    }
    if content.trim().is_empty() {
        fields.insert("content".to_string(), "Content cannot be empty".to_string());
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(fields))
    }
}

fn attach_tags(tag_repo: &TagRepository, posts: &mut [Post]) -> Result<(), ApiError> {
    for post in posts {
        post.tags = tag_repo
            .get_by_post(&post.id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
    }
    Ok(())
}

/// GET /posts - List posts with search, filters, ordering, and pagination
pub async fn get_posts(
    State(state): State<AppState>,
    Query(query): Query<GetPostsQuery>,
) -> ApiResult<Json<Page<Post>>> {
    let pool = state.db.pool.clone();
    let post_repo = PostRepository::new(pool.clone());
    let tag_repo = TagRepository::new(pool);

    let ordering = query
        .ordering
        .as_deref()
        .and_then(PostOrdering::parse)
        .unwrap_or_default();

    let filter = PostFilter {
        search: query.search,
        tag: query.tag,
        username: query.username,
        ordering,
    };

    let pagination = PaginationQuery {
        page: query.page,
        page_size: query.page_size,
    };
    let (page, page_size, offset) = pagination.resolve();
    let (mut posts, total) = post_repo
        .list(&filter, page_size, offset)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    attach_tags(&tag_repo, &mut posts)?;

    Ok(Json(Page {
        items: posts,
        page,
        page_size,
        total,
    }))
}

/// GET /posts/:id - Get a single post
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<Post>> {
    let pool = state.db.pool.clone();
    let post_repo = PostRepository::new(pool.clone());
    let tag_repo = TagRepository::new(pool);

    let mut post = post_repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    post.tags = tag_repo
        .get_by_post(&post.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(post))
}

/// POST /posts - Create a new post
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<Json<Post>> {
    validate_post(&payload.title, &payload.content)?;

    let author_id = get_user_from_headers(&state, &headers)?;

    let pool = state.db.pool.clone();
    let post_repo = PostRepository::new(pool.clone());
    let tag_repo = TagRepository::new(pool.clone());
    let user_repo = UserRepository::new(pool);

    let author = user_repo
        .get_by_id(&author_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Author not found".to_string()))?;

    let mut post = Post {
        id: Uuid::new_v4(),
        author_id,
        author_username: author.username,
        title: payload.title.trim().to_string(),
        content: payload.content,
        published_date: Utc::now(),
        tags: Vec::new(),
        like_count: 0,
        comment_count: 0,
    };

    post_repo
        .create(&post)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    tag_repo
        .store_tags(&post.id, &payload.tags)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    post.tags = tag_repo
        .get_by_post(&post.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(post))
}

/// Fetch a post and check the requester owns it
fn get_owned_post(
    post_repo: &PostRepository,
    post_id: &Uuid,
    user_id: &Uuid,
) -> Result<Post, ApiError> {
    let post = post_repo
        .get_by_id(post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.author_id != *user_id {
        return Err(ApiError::Forbidden(
            "Only the author can modify this post".to_string(),
        ));
    }

    Ok(post)
}

/// PUT /posts/:id - Update a post (author only)
pub async fn update_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> ApiResult<Json<Post>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let pool = state.db.pool.clone();
    let post_repo = PostRepository::new(pool.clone());
    let tag_repo = TagRepository::new(pool);

    let existing = get_owned_post(&post_repo, &post_id, &user_id)?;

    let title = payload.title.unwrap_or(existing.title);
    let content = payload.content.unwrap_or(existing.content);
    validate_post(&title, &content)?;

    post_repo
        .update_content(&post_id, title.trim(), &content)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if let Some(tags) = &payload.tags {
        tag_repo
            .replace_tags(&post_id, tags)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
    }

    let mut post = post_repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
    post.tags = tag_repo
        .get_by_post(&post.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(post))
}

/// DELETE /posts/:id - Delete a post (author only)
pub async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let post_repo = PostRepository::new(state.db.pool.clone());
    get_owned_post(&post_repo, &post_id, &user_id)?;

    post_repo
        .delete(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "Post deleted"
    })))
}

/// POST /posts/:id/like - Like a post
///
/// The first like on someone else's post notifies its author. A repeated
/// like follows the configured repeat policy.
pub async fn like_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let pool = state.db.pool.clone();
    let post_repo = PostRepository::new(pool.clone());
    let like_repo = LikeRepository::new(pool.clone());
    let notification_repo = NotificationRepository::new(pool);

    let post = post_repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if like_repo
        .exists(&user_id, &post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        return match state.repeat_policy {
            RepeatPolicy::Reject => Err(ApiError::BadRequest(
                "Post is already liked".to_string(),
            )),
            RepeatPolicy::Ignore => Ok(Json(serde_json::json!({
                "message": "Post already liked"
            }))),
        };
    }

    like_repo
        .like(&user_id, &post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    // Liking your own post stays silent
    if post.author_id != user_id {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: post.author_id,
            actor_id: user_id,
            actor_username: String::new(),
            verb: "liked".to_string(),
            target_kind: "post".to_string(),
            target_id: post_id,
            created_at: Utc::now(),
            is_read: false,
        };
        notification_repo
            .create(&notification)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
    }

    Ok(Json(serde_json::json!({
        "message": "Post liked"
    })))
}

/// POST /posts/:id/unlike - Remove a like from a post
pub async fn unlike_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let pool = state.db.pool.clone();
    let post_repo = PostRepository::new(pool.clone());
    let like_repo = LikeRepository::new(pool);

    if post_repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_none()
    {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let removed = like_repo
        .unlike(&user_id, &post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if removed == 0 {
        return match state.repeat_policy {
            RepeatPolicy::Reject => Err(ApiError::BadRequest(
                "Post is not liked".to_string(),
            )),
            RepeatPolicy::Ignore => Ok(Json(serde_json::json!({
                "message": "Post was not liked"
            }))),
        };
    }

    Ok(Json(serde_json::json!({
        "message": "Like removed"
    })))
}

/// GET /feed - Posts from followed users, newest first
pub async fn get_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<Json<Page<Post>>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let pool = state.db.pool.clone();
    let post_repo = PostRepository::new(pool.clone());
    let tag_repo = TagRepository::new(pool);

    let (page, page_size, offset) = pagination.resolve();
    let (mut posts, total) = post_repo
        .list_feed(&user_id, page_size, offset)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    attach_tags(&tag_repo, &mut posts)?;

    Ok(Json(Page {
        items: posts,
        page,
        page_size,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use axum::http::HeaderValue;

    const ALICE: &str = "550e8400-e29b-41d4-a716-446655440001";
    const BOB: &str = "550e8400-e29b-41d4-a716-446655440002";
    const BOB_POST: &str = "650e8400-e29b-41d4-a716-446655440001";
    const ALICE_POST: &str = "650e8400-e29b-41d4-a716-446655440003";

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
    async fn test_create_post_requires_auth() {
        let state = setup_test_state();
        let payload = CreatePostRequest {
            title: "New post".to_string(),
            content: "Body".to_string(),
            tags: vec![],
        };

        let result = create_post(State(state), HeaderMap::new(), Json(payload)).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_update_post() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let bob_post = Uuid::parse_str(BOB_POST).unwrap();

        let payload = UpdatePostRequest {
            title: Some("Hijacked".to_string()),
            content: None,
            tags: None,
        };
        let result = update_post(State(state), headers, Path(bob_post), Json(payload)).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let alice_post = Uuid::parse_str(ALICE_POST).unwrap();

        delete_post(State(state.clone()), headers, Path(alice_post))
            .await
            .expect("delete failed");

        let result = get_post(State(state), Path(alice_post)).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_like_rejected_with_one_notification() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let bob_post = Uuid::parse_str(BOB_POST).unwrap();

        like_post(State(state.clone()), headers.clone(), Path(bob_post))
            .await
            .expect("first like failed");

        let result = like_post(State(state.clone()), headers, Path(bob_post)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));

        let bob = Uuid::parse_str(BOB).unwrap();
        let notification_repo = NotificationRepository::new(state.db.pool.clone());
        assert_eq!(notification_repo.count_for_recipient(&bob).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_repeated_like_silent_under_ignore_policy() {
        let db = Database::in_memory().expect("Failed to create test database");
        db.seed_test_data().expect("Failed to seed test data");
        let state = AppState::new(db, RepeatPolicy::Ignore);
        let headers = login_as(&state, ALICE);
        let bob_post = Uuid::parse_str(BOB_POST).unwrap();

        like_post(State(state.clone()), headers.clone(), Path(bob_post))
            .await
            .expect("first like failed");
        like_post(State(state.clone()), headers, Path(bob_post))
            .await
            .expect("repeated like should succeed silently");

        let like_repo = LikeRepository::new(state.db.pool.clone());
        assert_eq!(like_repo.count_for_post(&bob_post).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_self_like_creates_no_notification() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let alice_post = Uuid::parse_str(ALICE_POST).unwrap();

        like_post(State(state.clone()), headers, Path(alice_post))
            .await
            .expect("self-like failed");

        let alice = Uuid::parse_str(ALICE).unwrap();
        let notification_repo = NotificationRepository::new(state.db.pool.clone());
        assert_eq!(notification_repo.count_for_recipient(&alice).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unlike_without_like_rejected() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let bob_post = Uuid::parse_str(BOB_POST).unwrap();

        let result = unlike_post(State(state), headers, Path(bob_post)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_feed_requires_auth() {
        let state = setup_test_state();
        let pagination = Query(PaginationQuery {
            page: None,
            page_size: None,
        });

        let result = get_feed(State(state), HeaderMap::new(), pagination).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_feed_returns_followed_authors_newest_first() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let pagination = Query(PaginationQuery {
            page: None,
            page_size: None,
        });

        let Json(page) = get_feed(State(state), headers, pagination)
            .await
            .expect("feed failed");
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|p| p.author_username == "bob"));
        for pair in page.items.windows(2) {
            assert!(pair[0].published_date >= pair[1].published_date);
        }
    }

    #[tokio::test]
    async fn test_create_post_validates_title_length() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);

        let payload = CreatePostRequest {
            title: "x".repeat(MAX_TITLE_LENGTH + 1),
            content: "Body".to_string(),
            tags: vec![],
        };
        let result = create_post(State(state), headers, Json(payload)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
