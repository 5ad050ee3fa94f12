// src/handlers/dashboard.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermDashboardRead, RequirePermission},
        tenancy::TenantContext,
    },
    models::dashboard::LibrarySummary,
};

// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Resumo da biblioteca", body = LibrarySummary)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermDashboardRead>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .dashboard_service
        .get_summary(tenant.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}
