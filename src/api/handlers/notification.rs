use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::NotificationsQuery;
use crate::error::AppError;
use std::sync::Arc;

pub async fn list_user_notifications(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<NotificationsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let notifications = state.notification_repo
        .list_by_user(&user_id, params.unread_only.unwrap_or(false))
        .await?;
    Ok(Json(notifications))
}

pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let notification = state.notification_repo.mark_read(&notification_id).await?
        .ok_or(AppError::NotFound("Notification not found".into()))?;
    Ok(Json(notification))
}
