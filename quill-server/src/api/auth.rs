use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use quill_types::{LoginRequest, LoginResponse, RegisterRequest, User};

use super::{get_user_from_headers, ApiError, ApiResult};
use crate::db::repositories::{ProfileRepository, UserRepository};
use crate::password;
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 8;

/// Response for session validation
#[derive(Serialize)]
pub struct ValidateSessionResponse {
    pub user: User,
    pub valid: bool,
}

fn validate_registration(username: &str, payload: &RegisterRequest) -> Result<(), ApiError> {
    let mut fields = HashMap::new();

    if username.is_empty() {
        fields.insert(
            "username".to_string(),
            "Username cannot be empty".to_string(),
        );
    }
    if !payload.email.contains('@') {
        fields.insert(
            "email".to_string(),
            "Email must be a valid address".to_string(),
        );
    }
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        fields.insert(
            "password".to_string(),
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(fields))
    }
}

/// POST /accounts/register - Create a new account
///
/// Creates the user, an empty profile row, and an initial session so the
/// client is logged in immediately.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<LoginResponse>> {
    // Trim once so validation, the uniqueness check, and the stored row
    // all see the same username
    let username = payload.username.trim().to_string();
    validate_registration(&username, &payload)?;

    let pool = state.db.pool.clone();
    let user_repo = UserRepository::new(pool.clone());
    let profile_repo = ProfileRepository::new(pool);

    if user_repo
        .username_exists(&username)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        let mut fields = HashMap::new();
        fields.insert(
            "username".to_string(),
            format!("Username '{username}' is already taken"),
        );
        return Err(ApiError::Validation(fields));
    }

    let password_hash = password::hash_password(&payload.password)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let user = User {
        id: Uuid::new_v4(),
        username,
        email: payload.email.clone(),
        bio: payload.bio.clone(),
        join_date: Utc::now(),
    };

    user_repo
        .create(&user, &password_hash)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    profile_repo
        .create_empty(&user.id, payload.bio.as_deref())
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let session_token = state
        .session_manager
        .create_session(user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::info!("Registered user {}", user.username);

    Ok(Json(LoginResponse {
        user,
        session_token,
    }))
}

/// POST /accounts/login - Login with username and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let repo = UserRepository::new(state.db.pool.clone());

    // A missing user and a bad password look the same to the client
    let stored_hash = repo
        .get_password_hash(&payload.username)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    if !password::verify_password(&payload.password, &stored_hash) {
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let user = repo
        .get_by_username(&payload.username)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    let session_token = state
        .session_manager
        .create_session(user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(LoginResponse {
        user,
        session_token,
    }))
}

/// POST /auth/logout - Logout current user
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let token = headers
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    state
        .session_manager
        .delete_session(token)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}

/// GET /auth/validate - Validate session token
pub async fn validate_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<ValidateSessionResponse>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let repo = UserRepository::new(state.db.pool.clone());
    let user = repo
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ValidateSessionResponse { user, valid: true }))
}
