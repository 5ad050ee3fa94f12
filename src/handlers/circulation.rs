// src/handlers/circulation.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermCirculationRead, PermCirculationWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::circulation::{BookIssue, BorrowingEligibility, IssueDetail, IssueFilter, IssueStatus},
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueBookPayload {
    pub book_id: Uuid,
    pub student_id: Uuid,
    /// Padrão: hoje
    #[schema(value_type = Option<String>, format = Date, example = "2025-03-01")]
    pub issue_date: Option<NaiveDate>,
    /// Padrão: data do empréstimo + 14 dias
    #[schema(value_type = Option<String>, format = Date, example = "2025-03-15")]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnBookPayload {
    /// Ignorado quando o empréstimo está atrasado (multa fixa)
    #[serde(default)]
    #[validate(range(min = 0, message = "The fine cannot be negative."))]
    #[schema(example = 0)]
    pub fine: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct IssueQuery {
    /// issued | overdue | returned (status derivado)
    pub status: Option<IssueStatus>,
    pub student_id: Option<Uuid>,
    pub book_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EligibilityQuery {
    /// Livro pretendido; sem ele só o limite é verificado
    pub book_id: Option<Uuid>,
}

// POST /api/circulation/issues
#[utoipa::path(
    post,
    path = "/api/circulation/issues",
    tag = "Circulation",
    request_body = IssueBookPayload,
    responses(
        (status = 201, description = "Livro emprestado", body = BookIssue),
        (status = 404, description = "Livro ou aluno não encontrado"),
        (status = 409, description = "Limite atingido, livro duplicado, sem exemplares ou aluno inativo")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn issue_book(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _perm: RequirePermission<PermCirculationWrite>,
    Json(payload): Json<IssueBookPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let issue = app_state
        .circulation_service
        .issue_book(
            &app_state.db_pool,
            tenant.tenant_id,
            payload.book_id,
            payload.student_id,
            payload.issue_date,
            payload.due_date,
            &user.0.display_name,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(issue)))
}

// POST /api/circulation/issues/{id}/return
#[utoipa::path(
    post,
    path = "/api/circulation/issues/{id}/return",
    tag = "Circulation",
    request_body = ReturnBookPayload,
    responses(
        (status = 200, description = "Livro devolvido (ou já estava devolvido)", body = BookIssue),
        (status = 404, description = "Empréstimo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do empréstimo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn return_book(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCirculationWrite>,
    Path(issue_id): Path<Uuid>,
    payload: Option<Json<ReturnBookPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    // Sem corpo: multa informada = 0
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let issue = app_state
        .circulation_service
        .return_book(&app_state.db_pool, tenant.tenant_id, issue_id, payload.fine)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(issue))
}

// GET /api/circulation/issues
#[utoipa::path(
    get,
    path = "/api/circulation/issues",
    tag = "Circulation",
    responses(
        (status = 200, description = "Empréstimos com livro, aluno e multa potencial", body = Vec<IssueDetail>)
    ),
    params(
        IssueQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_issues(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCirculationRead>,
    Query(query): Query<IssueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = IssueFilter {
        status: query.status,
        student_id: query.student_id,
        book_id: query.book_id,
    };

    let issues = app_state
        .circulation_service
        .list_issues(&app_state.db_pool, tenant.tenant_id, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(issues))
}

// GET /api/circulation/issues/{id}
#[utoipa::path(
    get,
    path = "/api/circulation/issues/{id}",
    tag = "Circulation",
    responses(
        (status = 200, description = "Empréstimo", body = IssueDetail),
        (status = 404, description = "Empréstimo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do empréstimo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_issue(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCirculationRead>,
    Path(issue_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let issue = app_state
        .circulation_service
        .get_issue(&app_state.db_pool, tenant.tenant_id, issue_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(issue))
}

// GET /api/circulation/overdue
#[utoipa::path(
    get,
    path = "/api/circulation/overdue",
    tag = "Circulation",
    responses(
        (status = 200, description = "Empréstimos atrasados, do vencimento mais antigo ao mais recente", body = Vec<IssueDetail>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_overdue_books(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCirculationRead>,
) -> Result<impl IntoResponse, ApiError> {
    let overdue = app_state
        .circulation_service
        .get_overdue_books(&app_state.db_pool, tenant.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(overdue))
}

// GET /api/circulation/students/{id}/eligibility
#[utoipa::path(
    get,
    path = "/api/circulation/students/{id}/eligibility",
    tag = "Circulation",
    responses(
        (status = 200, description = "Se o aluno pode pegar mais um livro", body = BorrowingEligibility),
        (status = 404, description = "Aluno não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do aluno"),
        EligibilityQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn check_eligibility(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCirculationRead>,
    Path(student_id): Path<Uuid>,
    Query(query): Query<EligibilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let eligibility = app_state
        .circulation_service
        .check_eligibility(&app_state.db_pool, tenant.tenant_id, student_id, query.book_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(eligibility))
}

// GET /api/circulation/students/{id}/issues
#[utoipa::path(
    get,
    path = "/api/circulation/students/{id}/issues",
    tag = "Circulation",
    responses(
        (status = 200, description = "Histórico de empréstimos do aluno", body = Vec<IssueDetail>),
        (status = 404, description = "Aluno não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do aluno"),
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_student_issues(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCirculationRead>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let issues = app_state
        .circulation_service
        .list_student_issues(&app_state.db_pool, tenant.tenant_id, student_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(issues))
}

// GET /api/me/issues
#[utoipa::path(
    get,
    path = "/api/me/issues",
    tag = "Me",
    responses(
        (status = 200, description = "Empréstimos do aluno logado em todas as bibliotecas", body = Vec<IssueDetail>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_issues(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let issues = app_state
        .circulation_service
        .list_my_issues(&app_state.db_pool, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(issues))
}
