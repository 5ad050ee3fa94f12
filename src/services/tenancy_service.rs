// src/services/tenancy_service.rs

use chrono::Local;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TenantRepository, UserRepository},
    models::tenancy::{
        MemberDetail, MemberRole, MyTenant, Tenant, TenantKind, TenantMember, TenantOverview,
    },
};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self {
            tenant_repo,
            user_repo,
            pool,
        }
    }

    /// Cria a instituição/biblioteca e, atomicamente, torna o criador o seu OWNER.
    pub async fn create_tenant_with_owner(
        &self,
        kind: TenantKind,
        name: &str,
        email: Option<&str>,
        address: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Tenant, AppError> {
        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o tenant
        let new_tenant = self
            .tenant_repo
            .create_tenant(&mut *tx, kind, name, email, address)
            .await?;

        // 3. Vincula o dono
        self.tenant_repo
            .add_member(&mut *tx, new_tenant.id, owner_id, MemberRole::Owner)
            .await?;

        // 4. Commit
        tx.commit().await?;

        tracing::info!("🏛️ Tenant '{}' criado por {}", new_tenant.name, owner_id);
        Ok(new_tenant)
    }

    /// Papel do usuário no tenant. Sem vínculo => acesso negado.
    pub async fn membership_role(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<MemberRole, AppError> {
        self.tenant_repo
            .find_member_role(user_id, tenant_id)
            .await?
            .ok_or(AppError::TenantAccessDenied)
    }

    pub async fn list_user_tenants(&self, user_id: Uuid) -> Result<Vec<MyTenant>, AppError> {
        self.tenant_repo.list_tenants_for_user(user_id).await
    }

    /// Adiciona um bibliotecário pelo e-mail de uma conta já registrada.
    pub async fn add_librarian_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<TenantMember, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.tenant_repo
            .add_member(&self.pool, tenant_id, user.id, MemberRole::Librarian)
            .await
    }

    pub async fn list_members(&self, tenant_id: Uuid) -> Result<Vec<MemberDetail>, AppError> {
        self.tenant_repo.list_members(&self.pool, tenant_id).await
    }

    /// Visão do administrador global.
    pub async fn admin_overview(&self) -> Result<Vec<TenantOverview>, AppError> {
        let today = Local::now().date_naive();
        self.tenant_repo.list_overview(today).await
    }
}
