// src/handlers/catalog.rs

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
        rbac::{PermCatalogDelete, PermCatalogRead, PermCatalogWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::catalog::{Book, BookCategory, BookFilter, BookInput},
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    #[validate(length(min = 1, max = 100, message = "The category name is required."))]
    #[schema(example = "Literatura Brasileira")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, message = "The title is required."))]
    #[schema(example = "Dom Casmurro")]
    pub title: String,
    #[validate(length(min = 1, message = "The author is required."))]
    #[schema(example = "Machado de Assis")]
    pub author: String,
    #[validate(length(min = 1, max = 32, message = "The ISBN is required."))]
    #[schema(example = "978-8535910667")]
    pub isbn: String,
    pub publisher: Option<String>,
    #[validate(range(min = 1, message = "A book needs at least one copy."))]
    #[schema(example = 3)]
    pub total_copies: i32,
}

impl BookPayload {
    fn as_input(&self) -> BookInput<'_> {
        BookInput {
            category_id: self.category_id,
            title: self.title.trim(),
            author: self.author.trim(),
            isbn: self.isbn.trim(),
            publisher: self.publisher.as_deref(),
            total_copies: self.total_copies,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Busca por título, autor ou ISBN
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
}

// =============================================================================
//  CATEGORIAS
// =============================================================================

// POST /api/catalog/categories
#[utoipa::path(
    post,
    path = "/api/catalog/categories",
    tag = "Catalog",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = BookCategory),
        (status = 409, description = "Nome já usado nesta biblioteca")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCatalogWrite>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .catalog_service
        .create_category(
            &app_state.db_pool,
            tenant.tenant_id,
            &payload.name,
            payload.description.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

// GET /api/catalog/categories
#[utoipa::path(
    get,
    path = "/api/catalog/categories",
    tag = "Catalog",
    responses(
        (status = 200, description = "Categorias com a contagem de livros", body = Vec<BookCategory>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCatalogRead>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .catalog_service
        .list_categories(&app_state.db_pool, tenant.tenant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

// PUT /api/catalog/categories/{id}
#[utoipa::path(
    put,
    path = "/api/catalog/categories/{id}",
    tag = "Catalog",
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Categoria atualizada", body = BookCategory),
        (status = 404, description = "Categoria não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da categoria"),
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCatalogWrite>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .catalog_service
        .update_category(
            &app_state.db_pool,
            tenant.tenant_id,
            category_id,
            &payload.name,
            payload.description.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(category))
}

// DELETE /api/catalog/categories/{id}
#[utoipa::path(
    delete,
    path = "/api/catalog/categories/{id}",
    tag = "Catalog",
    responses(
        (status = 204, description = "Categoria removida; os livros ficam sem categoria"),
        (status = 404, description = "Categoria não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da categoria"),
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCatalogDelete>,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .catalog_service
        .delete_category(&app_state.db_pool, tenant.tenant_id, category_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  LIVROS
// =============================================================================

// POST /api/catalog/books
#[utoipa::path(
    post,
    path = "/api/catalog/books",
    tag = "Catalog",
    request_body = BookPayload,
    responses(
        (status = 201, description = "Livro cadastrado com todos os exemplares disponíveis", body = Book),
        (status = 409, description = "ISBN já cadastrado nesta biblioteca")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_book(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCatalogWrite>,
    Json(payload): Json<BookPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let book = app_state
        .catalog_service
        .create_book(&app_state.db_pool, tenant.tenant_id, &payload.as_input())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(book)))
}

// GET /api/catalog/books
#[utoipa::path(
    get,
    path = "/api/catalog/books",
    tag = "Catalog",
    responses(
        (status = 200, description = "Acervo", body = Vec<Book>)
    ),
    params(
        BookQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_books(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCatalogRead>,
    Query(query): Query<BookQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = BookFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        category_id: query.category_id,
    };

    let books = app_state
        .catalog_service
        .list_books(&app_state.db_pool, tenant.tenant_id, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(books))
}

// GET /api/catalog/books/{id}
#[utoipa::path(
    get,
    path = "/api/catalog/books/{id}",
    tag = "Catalog",
    responses(
        (status = 200, description = "Livro", body = Book),
        (status = 404, description = "Livro não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do livro"),
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_book(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCatalogRead>,
    Path(book_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let book = app_state
        .catalog_service
        .get_book(&app_state.db_pool, tenant.tenant_id, book_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(book))
}

// PUT /api/catalog/books/{id}
#[utoipa::path(
    put,
    path = "/api/catalog/books/{id}",
    tag = "Catalog",
    request_body = BookPayload,
    responses(
        (status = 200, description = "Livro atualizado", body = Book),
        (status = 404, description = "Livro não encontrado"),
        (status = 409, description = "Total abaixo dos exemplares emprestados")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do livro"),
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_book(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCatalogWrite>,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<BookPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let book = app_state
        .catalog_service
        .update_book(&app_state.db_pool, tenant.tenant_id, book_id, &payload.as_input())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(book))
}

// DELETE /api/catalog/books/{id}
#[utoipa::path(
    delete,
    path = "/api/catalog/books/{id}",
    tag = "Catalog",
    responses(
        (status = 204, description = "Livro removido"),
        (status = 404, description = "Livro não encontrado"),
        (status = 409, description = "Livro com empréstimos ativos")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do livro"),
        ("x-tenant-id" = Uuid, Header, description = "ID da biblioteca")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_book(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _perm: RequirePermission<PermCatalogDelete>,
    Path(book_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .catalog_service
        .delete_book(&app_state.db_pool, tenant.tenant_id, book_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
