// src/handlers/notifications.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::notification::Notification,
};

// GET /api/me/notifications
#[utoipa::path(
    get,
    path = "/api/me/notifications",
    tag = "Me",
    responses(
        (status = 200, description = "Notificações do aluno logado", body = Vec<Notification>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_notifications(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = app_state
        .notification_service
        .list_for_user(user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(notifications))
}

// PATCH /api/me/notifications/{id}/read
#[utoipa::path(
    patch,
    path = "/api/me/notifications/{id}/read",
    tag = "Me",
    responses(
        (status = 200, description = "Notificação marcada como lida", body = Notification),
        (status = 404, description = "Notificação não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da notificação")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_notification_read(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let notification = app_state
        .notification_service
        .mark_read(user.0.id, notification_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(notification))
}
