// src/services/catalog_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogRepository,
    models::catalog::{Book, BookCategory, BookFilter, BookInput},
    services::circulation_policy,
};

#[derive(Clone)]
pub struct CatalogService {
    catalog_repo: CatalogRepository,
}

impl CatalogService {
    pub fn new(catalog_repo: CatalogRepository) -> Self {
        Self { catalog_repo }
    }

    // =========================================================================
    //  CATEGORIAS
    // =========================================================================

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<BookCategory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.catalog_repo
            .create_category(executor, tenant_id, name.trim(), description)
            .await
    }

    pub async fn list_categories<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<BookCategory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.catalog_repo.list_categories(executor, tenant_id).await
    }

    pub async fn update_category<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        category_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<BookCategory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.catalog_repo
            .update_category(executor, tenant_id, category_id, name.trim(), description)
            .await?
            .ok_or(AppError::CategoryNotFound)
    }

    /// Os livros da categoria continuam no acervo, sem categoria.
    pub async fn delete_category<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let deleted = self
            .catalog_repo
            .delete_category(executor, tenant_id, category_id)
            .await?;

        if !deleted {
            return Err(AppError::CategoryNotFound);
        }
        Ok(())
    }

    // =========================================================================
    //  LIVROS
    // =========================================================================

    pub async fn create_book<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &BookInput<'_>,
    ) -> Result<Book, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. A categoria precisa ser do mesmo tenant
        if let Some(category_id) = input.category_id {
            self.ensure_category(&mut tx, tenant_id, category_id).await?;
        }

        // 2. Cria com todos os exemplares disponíveis
        let book = self
            .catalog_repo
            .create_book(&mut *tx, tenant_id, input)
            .await?;

        tx.commit().await?;
        Ok(book)
    }

    pub async fn list_books<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &BookFilter,
    ) -> Result<Vec<Book>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.catalog_repo.list_books(executor, tenant_id, filter).await
    }

    pub async fn get_book<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        book_id: Uuid,
    ) -> Result<Book, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.catalog_repo
            .find_book(executor, tenant_id, book_id)
            .await?
            .ok_or(AppError::BookNotFound)
    }

    /// Atualiza o livro. Mudar o total recalcula os disponíveis mantendo os emprestados.
    pub async fn update_book<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        book_id: Uuid,
        input: &BookInput<'_>,
    ) -> Result<Book, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Trava o livro (empréstimos concorrentes esperam)
        let current = self
            .catalog_repo
            .find_book_for_update(&mut *tx, tenant_id, book_id)
            .await?
            .ok_or(AppError::BookNotFound)?;

        if let Some(category_id) = input.category_id {
            self.ensure_category(&mut tx, tenant_id, category_id).await?;
        }

        // 2. Novo total não pode ficar abaixo dos exemplares emprestados
        let available = circulation_policy::resize_copies(&current, input.total_copies)?;

        // 3. Grava
        let updated = self
            .catalog_repo
            .update_book(&mut *tx, tenant_id, book_id, input, available)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Livro com exemplares emprestados não pode ser removido.
    pub async fn delete_book<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        book_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let book = self
            .catalog_repo
            .find_book_for_update(&mut *tx, tenant_id, book_id)
            .await?
            .ok_or(AppError::BookNotFound)?;

        if book.outstanding_copies() > 0 {
            return Err(AppError::BookHasActiveIssues);
        }

        self.catalog_repo
            .delete_book(&mut *tx, tenant_id, book_id)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn ensure_category(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), AppError> {
        let exists = self
            .catalog_repo
            .category_exists(&mut **tx, tenant_id, category_id)
            .await?;

        if !exists {
            return Err(AppError::CategoryNotFound);
        }
        Ok(())
    }
}
