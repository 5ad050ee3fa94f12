// src/handlers/admin.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::tenancy::TenantOverview,
};

// GET /api/admin/tenants
#[utoipa::path(
    get,
    path = "/api/admin/tenants",
    tag = "Admin",
    responses(
        (status = 200, description = "Todas as bibliotecas com contadores", body = Vec<TenantOverview>),
        (status = 403, description = "Apenas o administrador")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tenants_overview(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let overview = app_state
        .tenant_service
        .admin_overview()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(overview))
}
