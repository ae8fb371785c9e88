use axum::{extract::State, http::HeaderMap, Json};

use quill_types::Notification;

use super::{get_user_from_headers, ApiError, ApiResult};
use crate::db::repositories::NotificationRepository;
use crate::state::AppState;

/// GET /notifications - The authenticated user's notifications, newest first
pub async fn get_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Notification>>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let repo = NotificationRepository::new(state.db.pool.clone());
    let notifications = repo
        .list_for_recipient(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(notifications))
}

/// POST /notifications/read - Mark all notifications as read
pub async fn mark_notifications_read(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let repo = NotificationRepository::new(state.db.pool.clone());
    let marked = repo
        .mark_all_read(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "Notifications marked read",
        "marked": marked
    })))
}
