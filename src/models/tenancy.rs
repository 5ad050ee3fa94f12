// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Instituição e biblioteca privada partilham o mesmo espaço de ids ("entity id")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tenant_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantKind {
    Institution,
    PrivateLibrary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "member_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Owner,
    Librarian,
}

// ---
// 1. Tenant (A "Biblioteca")
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub kind: TenantKind,
    #[schema(example = "Colégio Estadual Central")]
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. TenantMember (A "Ponte" Usuário-Tenant)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantMember {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

// Membro com os dados do usuário (para a tela de equipe)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetail {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

// Tenant visto pelo usuário logado, com o cargo dele
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyTenant {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tenant: Tenant,
    pub role: MemberRole,
}

// Visão global do administrador
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantOverview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tenant: Tenant,
    pub book_count: i64,
    pub student_count: i64,
    pub active_issue_count: i64,
    pub overdue_issue_count: i64,
}
