// src/middleware/rbac.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::tenancy::MemberRole,
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// Permissões de cada papel. O dono pode tudo; o bibliotecário opera o dia a dia.
pub fn role_permissions(role: MemberRole) -> &'static [&'static str] {
    match role {
        MemberRole::Owner => &[
            "catalog:read",
            "catalog:write",
            "catalog:delete",
            "students:read",
            "students:write",
            "circulation:read",
            "circulation:write",
            "dashboard:read",
            "members:manage",
        ],
        MemberRole::Librarian => &[
            "catalog:read",
            "catalog:write",
            "students:read",
            "students:write",
            "circulation:read",
            "circulation:write",
            "dashboard:read",
        ],
    }
}

pub fn role_has_permission(role: MemberRole, slug: &str) -> bool {
    role_permissions(role).contains(&slug)
}

/// 2. O Extractor (Guardião). Depende do TenantContext colocado pelo tenant_guard.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state)
            .await
            .unwrap_or_default();

        let tenant = parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or_else(|| {
                AppError::MissingTenantHeader.to_api_error(&locale, &app_state.i18n_store)
            })?;

        let required_perm = T::slug();
        if !role_has_permission(tenant.role, required_perm) {
            return Err(AppError::MissingPermission(required_perm)
                .to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermCatalogRead;
impl PermissionDef for PermCatalogRead {
    fn slug() -> &'static str { "catalog:read" }
}

pub struct PermCatalogWrite;
impl PermissionDef for PermCatalogWrite {
    fn slug() -> &'static str { "catalog:write" }
}

pub struct PermCatalogDelete;
impl PermissionDef for PermCatalogDelete {
    fn slug() -> &'static str { "catalog:delete" }
}

pub struct PermStudentsRead;
impl PermissionDef for PermStudentsRead {
    fn slug() -> &'static str { "students:read" }
}

pub struct PermStudentsWrite;
impl PermissionDef for PermStudentsWrite {
    fn slug() -> &'static str { "students:write" }
}

pub struct PermCirculationRead;
impl PermissionDef for PermCirculationRead {
    fn slug() -> &'static str { "circulation:read" }
}

pub struct PermCirculationWrite;
impl PermissionDef for PermCirculationWrite {
    fn slug() -> &'static str { "circulation:write" }
}

pub struct PermDashboardRead;
impl PermissionDef for PermDashboardRead {
    fn slug() -> &'static str { "dashboard:read" }
}

pub struct PermManageMembers;
impl PermissionDef for PermManageMembers {
    fn slug() -> &'static str { "members:manage" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_has_every_librarian_permission() {
        for perm in role_permissions(MemberRole::Librarian) {
            assert!(role_has_permission(MemberRole::Owner, perm), "{perm}");
        }
    }

    #[test]
    fn only_owner_manages_members_and_deletes() {
        assert!(role_has_permission(MemberRole::Owner, PermManageMembers::slug()));
        assert!(!role_has_permission(MemberRole::Librarian, PermManageMembers::slug()));
        assert!(!role_has_permission(MemberRole::Librarian, PermCatalogDelete::slug()));
        assert!(role_has_permission(MemberRole::Librarian, PermCirculationWrite::slug()));
    }

    #[test]
    fn unknown_slug_is_denied() {
        assert!(!role_has_permission(MemberRole::Owner, "billing:write"));
    }
}
