// src/db/tenancy_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tenancy::{
        MemberDetail, MemberRole, MyTenant, Tenant, TenantKind, TenantMember, TenantOverview,
    },
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cargo do usuário no tenant (None = sem acesso).
    /// Esta é a verificação de segurança de autorização mais importante.
    pub async fn find_member_role(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<MemberRole>, AppError> {
        let role = sqlx::query_scalar::<_, MemberRole>(
            "SELECT role FROM tenant_members WHERE user_id = $1 AND tenant_id = $2",
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        kind: TenantKind,
        name: &str,
        email: Option<&str>,
        address: Option<&str>,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (kind, name, email, address)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(kind)
        .bind(name)
        .bind(email)
        .bind(address)
        .fetch_one(executor)
        .await?;
        Ok(tenant)
    }

    /// Atribui um utilizador a um tenant (na tabela-ponte).
    pub async fn add_member<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<TenantMember, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, TenantMember>(
            r#"
            INSERT INTO tenant_members (tenant_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::AlreadyMember;
                }
            }
            e.into()
        })
    }

    pub async fn list_members<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<MemberDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let members = sqlx::query_as::<_, MemberDetail>(
            r#"
            SELECT m.user_id, u.email, u.display_name, m.role, m.created_at
            FROM tenant_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.tenant_id = $1
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(members)
    }

    pub async fn list_tenants_for_user(&self, user_id: Uuid) -> Result<Vec<MyTenant>, AppError> {
        let tenants = sqlx::query_as::<_, MyTenant>(
            r#"
            SELECT t.*, m.role
            FROM tenants t
            JOIN tenant_members m ON m.tenant_id = t.id
            WHERE m.user_id = $1
            ORDER BY t.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }

    /// Visão global (admin): todos os tenants com contadores.
    pub async fn list_overview(&self, today: NaiveDate) -> Result<Vec<TenantOverview>, AppError> {
        let overview = sqlx::query_as::<_, TenantOverview>(
            r#"
            SELECT
                t.*,
                (SELECT COUNT(*) FROM books b WHERE b.tenant_id = t.id) AS book_count,
                (SELECT COUNT(*) FROM students s WHERE s.tenant_id = t.id) AS student_count,
                (SELECT COUNT(*) FROM book_issues i
                    WHERE i.tenant_id = t.id AND i.status <> 'RETURNED') AS active_issue_count,
                (SELECT COUNT(*) FROM book_issues i
                    WHERE i.tenant_id = t.id AND i.status <> 'RETURNED'
                      AND i.due_date <= $1) AS overdue_issue_count
            FROM tenants t
            ORDER BY t.name ASC
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        Ok(overview)
    }
}
