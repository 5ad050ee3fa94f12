// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{authenticate, AuthenticatedUser},
        i18n::Locale,
    },
    models::tenancy::MemberRole,
};

// O nome do nosso cabeçalho HTTP customizado
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

// Tenant da requisição + papel do usuário nele. Toda consulta de tenant parte daqui.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub role: MemberRole,
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or(AppError::MissingTenantHeader)
    }
}

pub fn parse_tenant_header(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let value = headers
        .get(TENANT_ID_HEADER)
        .ok_or(AppError::MissingTenantHeader)?;

    let value_str = value.to_str().map_err(|_| AppError::InvalidTenantHeader)?;

    Uuid::parse_str(value_str.trim()).map_err(|_| AppError::InvalidTenantHeader)
}

/// Header X-Tenant-ID -> usuário autenticado -> vínculo com o tenant.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    // 1. Cabeçalho (sem custo de banco)
    let tenant_id = parse_tenant_header(request.headers()).map_err(to_api)?;

    // 2. Usuário
    let user = authenticate(&app_state, request.headers())
        .await
        .map_err(to_api)?;

    // 3. Vínculo (a verificação de autorização mais importante)
    let role = app_state
        .tenant_service
        .membership_role(user.id, tenant_id)
        .await
        .map_err(|e| {
            if matches!(e, AppError::TenantAccessDenied) {
                tracing::warn!("Usuário {} sem acesso ao tenant {}", user.id, tenant_id);
            }
            to_api(e)
        })?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    request
        .extensions_mut()
        .insert(TenantContext { tenant_id, role });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_tenant_uuid() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(parse_tenant_header(&headers).unwrap(), id);
    }

    #[test]
    fn missing_header_is_distinct_from_malformed() {
        assert!(matches!(
            parse_tenant_header(&HeaderMap::new()),
            Err(AppError::MissingTenantHeader)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("biblioteca-central"));
        assert!(matches!(
            parse_tenant_header(&headers),
            Err(AppError::InvalidTenantHeader)
        ));
    }
}
