// src/handlers/students.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermStudentsRead, PermStudentsWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        notification::Notification,
        student::{Student, StudentFilter, StudentInput},
    },
};

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentPayload {
    #[validate(length(min = 1, message = "The student name is required."))]
    #[schema(example = "Ana Lima")]
    pub name: String,
    // Se houver conta com este e-mail, o cadastro é vinculado a ela
    #[validate(email(message = "The e-mail provided is invalid."))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 50, message = "The roll number is required."))]
    #[schema(example = "2025-001")]
    pub roll_number: String,
    pub department: Option<String>,
    pub phone: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl StudentPayload {
    fn as_input(&self) -> StudentInput<'_> {
        StudentInput {
            name: self.name.trim(),
            email: self.email.as_deref().map(str::trim),
            roll_number: self.roll_number.trim(),
            department: self.department.as_deref(),
            phone: self.phone.as_deref(),
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentQuery {
    /// Busca por nome, matrícula ou e-mail
    pub search: Option<String>,
    pub active: Option<bool>,
}

// POST /api/students
#[utoipa::path(
    post,
    path = "/api/students",
    tag = "Students",
    request_body = StudentPayload,
    responses(
        (status = 201, description = "Aluno cadastrado", body = Student),
        (status = 409, description = "Matrícula já usada nesta biblioteca")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_student(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermStudentsWrite>,
    Json(payload): Json<StudentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let student = app_state
        .student_service
        .create_student(&app_state.db_pool, tenant.tenant_id, &payload.as_input())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(student)))
}

// GET /api/students
#[utoipa::path(
    get,
    path = "/api/students",
    tag = "Students",
    responses(
        (status = 200, description = "Alunos da biblioteca", body = Vec<Student>)
    ),
    params(
        StudentQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_students(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermStudentsRead>,
    Query(query): Query<StudentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = StudentFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        active: query.active,
    };

    let students = app_state
        .student_service
        .list_students(&app_state.db_pool, tenant.tenant_id, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(students))
}

// GET /api/students/{id}
#[utoipa::path(
    get,
    path = "/api/students/{id}",
    tag = "Students",
    responses(
        (status = 200, description = "Aluno", body = Student),
        (status = 404, description = "Aluno não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do aluno"),
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_student(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermStudentsRead>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let student = app_state
        .student_service
        .get_student(&app_state.db_pool, tenant.tenant_id, student_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(student))
}

// PUT /api/students/{id}
#[utoipa::path(
    put,
    path = "/api/students/{id}",
    tag = "Students",
    request_body = StudentPayload,
    responses(
        (status = 200, description = "Aluno atualizado", body = Student),
        (status = 404, description = "Aluno não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do aluno"),
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_student(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermStudentsWrite>,
    Path(student_id): Path<Uuid>,
    Json(payload): Json<StudentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let student = app_state
        .student_service
        .update_student(
            &app_state.db_pool,
            tenant.tenant_id,
            student_id,
            &payload.as_input(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(student))
}

// GET /api/students/{id}/notifications
#[utoipa::path(
    get,
    path = "/api/students/{id}/notifications",
    tag = "Students",
    responses(
        (status = 200, description = "Notificações do aluno", body = Vec<Notification>),
        (status = 404, description = "Aluno não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do aluno"),
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_student_notifications(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermStudentsRead>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // 404 para aluno de outro tenant, em vez de lista vazia
    app_state
        .student_service
        .get_student(&app_state.db_pool, tenant.tenant_id, student_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let notifications = app_state
        .notification_service
        .list_for_student(tenant.tenant_id, student_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(notifications))
}
