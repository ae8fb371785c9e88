use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use quill_types::{Profile, UpdateProfileRequest, User};

use super::{get_user_from_headers, ApiError, ApiResult};
use crate::db::repositories::{ProfileRepository, UserRepository};
use crate::state::AppState;

/// A user together with their profile details
#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub profile: Profile,
}

fn load_profile(state: &AppState, user_id: &Uuid) -> Result<ProfileResponse, ApiError> {
    let pool = state.db.pool.clone();
    let user_repo = UserRepository::new(pool.clone());
    let profile_repo = ProfileRepository::new(pool);

    let user = user_repo
        .get_by_id(user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let profile = profile_repo
        .get_by_user(user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(ProfileResponse { user, profile })
}

/// GET /users/:id/profile - Public profile view
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ProfileResponse>> {
    Ok(Json(load_profile(&state, &user_id)?))
}

/// GET /profile - The authenticated user's own profile
pub async fn get_own_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ProfileResponse>> {
    let user_id = get_user_from_headers(&state, &headers)?;
    Ok(Json(load_profile(&state, &user_id)?))
}

/// PUT /profile - Partially update the authenticated user's profile
pub async fn update_own_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let repo = ProfileRepository::new(state.db.pool.clone());
    repo.update(&user_id, &payload)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(load_profile(&state, &user_id)?))
}
