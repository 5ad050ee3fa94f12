// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::User,
};

// Usuário autenticado, colocado nos extensions pelo auth_guard/tenant_guard
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

/// Lê o `Authorization: Bearer <token>`. Sem token não há consulta ao banco.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .ok_or(AppError::InvalidToken)
}

pub async fn authenticate(app_state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let token = bearer_token(headers)?;
    app_state.auth_service.validate_token(&token).await
}

pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&app_state, request.headers())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Rotas do administrador global (e-mail configurado em ADMIN_EMAIL).
pub async fn admin_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&app_state, request.headers())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    if !user.is_admin {
        tracing::warn!("Acesso de admin negado para {}", user.email);
        return Err(AppError::AdminOnly.to_api_error(&locale, &app_state.i18n_store));
    }

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_or_wrong_scheme_is_invalid_token() {
        assert!(matches!(bearer_token(&HeaderMap::new()), Err(AppError::InvalidToken)));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(matches!(bearer_token(&headers), Err(AppError::InvalidToken)));
    }
}
