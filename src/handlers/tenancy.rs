// src/handlers/tenancy.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermManageMembers, RequirePermission},
        tenancy::TenantContext,
    },
    models::tenancy::{MemberDetail, MyTenant, Tenant, TenantKind, TenantMember},
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantPayload {
    pub kind: TenantKind,
    #[validate(length(min = 1, message = "The library name is required."))]
    #[schema(example = "Escola Estadual Machado de Assis")]
    pub name: String,
    #[validate(email(message = "The e-mail provided is invalid."))]
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberPayload {
    #[validate(email(message = "The e-mail provided is invalid."))]
    #[schema(example = "bibliotecaria@escola.edu")]
    pub email: String,
}

// POST /api/tenants
#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenancy",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Biblioteca criada; o criador vira OWNER", body = Tenant),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let new_tenant = app_state
        .tenant_service
        .create_tenant_with_owner(
            payload.kind,
            payload.name.trim(),
            payload.email.as_deref(),
            payload.address.as_deref(),
            user.0.id,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(new_tenant)))
}

// GET /api/tenants
#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "Tenancy",
    responses(
        (status = 200, description = "Bibliotecas do usuário, com o papel em cada uma", body = Vec<MyTenant>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_tenants(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let tenants = app_state
        .tenant_service
        .list_user_tenants(user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tenants))
}

// POST /api/tenants/members
#[utoipa::path(
    post,
    path = "/api/tenants/members",
    tag = "Tenancy",
    request_body = AddMemberPayload,
    responses(
        (status = 201, description = "Bibliotecário adicionado", body = TenantMember),
        (status = 403, description = "Apenas o dono gerencia membros"),
        (status = 404, description = "Nenhuma conta com esse e-mail"),
        (status = 409, description = "Já é membro")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermManageMembers>,
    Json(payload): Json<AddMemberPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let member = app_state
        .tenant_service
        .add_librarian_by_email(tenant.tenant_id, payload.email.trim())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(member)))
}

// GET /api/tenants/members
#[utoipa::path(
    get,
    path = "/api/tenants/members",
    tag = "Tenancy",
    responses(
        (status = 200, description = "Membros da biblioteca", body = Vec<MemberDetail>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let members = app_state
        .tenant_service
        .list_members(tenant.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(members))
}
