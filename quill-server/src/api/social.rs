use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use uuid::Uuid;

use quill_types::{RepeatPolicy, User};

use super::{get_user_from_headers, ApiError, ApiResult};
use crate::db::repositories::{FollowRepository, UserRepository};
use crate::state::AppState;

/// POST /follow/:user_id - Follow another user
pub async fn follow_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(target_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    if user_id == target_id {
        return Err(ApiError::BadRequest(
            "Cannot follow yourself".to_string(),
        ));
    }

    let pool = state.db.pool.clone();
    let user_repo = UserRepository::new(pool.clone());
    let follow_repo = FollowRepository::new(pool);

    let target = user_repo
        .get_by_id(&target_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if follow_repo
        .is_following(&user_id, &target_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        return match state.repeat_policy {
            RepeatPolicy::Reject => Err(ApiError::BadRequest(format!(
                "Already following '{}'",
                target.username
            ))),
            RepeatPolicy::Ignore => Ok(Json(serde_json::json!({
                "message": format!("Already following '{}'", target.username)
            }))),
        };
    }

    follow_repo
        .follow(&user_id, &target_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": format!("Now following '{}'", target.username)
    })))
}

/// POST /unfollow/:user_id - Stop following a user
pub async fn unfollow_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(target_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    if user_id == target_id {
        return Err(ApiError::BadRequest(
            "Cannot unfollow yourself".to_string(),
        ));
    }

    let pool = state.db.pool.clone();
    let user_repo = UserRepository::new(pool.clone());
    let follow_repo = FollowRepository::new(pool);

    let target = user_repo
        .get_by_id(&target_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let removed = follow_repo
        .unfollow(&user_id, &target_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if removed == 0 {
        return match state.repeat_policy {
            RepeatPolicy::Reject => Err(ApiError::BadRequest(format!(
                "Not following '{}'",
                target.username
            ))),
            RepeatPolicy::Ignore => Ok(Json(serde_json::json!({
                "message": format!("Was not following '{}'", target.username)
            }))),
        };
    }

    Ok(Json(serde_json::json!({
        "message": format!("Unfollowed '{}'", target.username)
    })))
}

/// GET /social/following - Users the authenticated user follows
pub async fn get_following(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<User>>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let repo = FollowRepository::new(state.db.pool.clone());
    let users = repo
        .get_following(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(users))
}

/// GET /social/followers - Users following the authenticated user
pub async fn get_followers(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<User>>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let repo = FollowRepository::new(state.db.pool.clone());
    let users = repo
        .get_followers(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::state::AppState;
    use axum::http::HeaderValue;

    const ALICE: &str = "550e8400-e29b-41d4-a716-446655440001";
    const BOB: &str = "550e8400-e29b-41d4-a716-446655440002";
    const CHARLIE: &str = "550e8400-e29b-41d4-a716-446655440003";

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
    async fn test_self_follow_rejected() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let alice = Uuid::parse_str(ALICE).unwrap();

        let result = follow_user(State(state), headers, Path(alice)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_follow_unknown_user_is_not_found() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);

        let result = follow_user(State(state), headers, Path(Uuid::new_v4())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_follow_rejected() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        // alice already follows bob in the seed data
        let bob = Uuid::parse_str(BOB).unwrap();

        let result = follow_user(State(state), headers, Path(bob)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_unfollow_without_follow_rejected() {
        let state = setup_test_state();
        let headers = login_as(&state, ALICE);
        let charlie = Uuid::parse_str(CHARLIE).unwrap();

        let result = unfollow_user(State(state), headers, Path(charlie)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_follow_then_lists_update() {
        let state = setup_test_state();
        let headers = login_as(&state, CHARLIE);
        let alice = Uuid::parse_str(ALICE).unwrap();

        follow_user(State(state.clone()), headers.clone(), Path(alice))
            .await
            .expect("follow failed");

        let Json(following) = get_following(State(state.clone()), headers)
            .await
            .expect("following list failed");
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].username, "alice");

        let alice_headers = login_as(&state, ALICE);
        let Json(followers) = get_followers(State(state), alice_headers)
            .await
            .expect("followers list failed");
        assert!(followers.iter().any(|u| u.username == "charlie"));
    }

    #[tokio::test]
    async fn test_follow_requires_auth() {
        let state = setup_test_state();
        let bob = Uuid::parse_str(BOB).unwrap();

        let result = follow_user(State(state), HeaderMap::new(), Path(bob)).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }
}
