// src/db/catalog_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{Book, BookCategory, BookFilter, BookInput},
};

// Repositório sem estado: todas as funções recebem o executor (pool, conexão ou transação).
#[derive(Clone, Default)]
pub struct CatalogRepository;

// Converte a violação de unicidade de ISBN num erro amigável
fn map_book_error(e: sqlx::Error, isbn: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::IsbnAlreadyExists(isbn.to_string());
        }
    }
    e.into()
}

fn map_category_error(e: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::CategoryNameAlreadyExists(name.to_string());
        }
    }
    e.into()
}

impl CatalogRepository {
    pub fn new() -> Self {
        Self
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
        sqlx::query_as::<_, BookCategory>(
            r#"
            INSERT INTO categories (tenant_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING *, 0::BIGINT AS book_count
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| map_category_error(e, name))
    }

    pub async fn list_categories<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<BookCategory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let categories = sqlx::query_as::<_, BookCategory>(
            r#"
            SELECT c.*, COUNT(b.id) AS book_count
            FROM categories c
            LEFT JOIN books b ON b.category_id = c.id AND b.tenant_id = c.tenant_id
            WHERE c.tenant_id = $1
            GROUP BY c.id
            ORDER BY c.name ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(categories)
    }

    pub async fn category_exists<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM categories WHERE tenant_id = $1 AND id = $2)",
        )
        .bind(tenant_id)
        .bind(category_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn update_category<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        category_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Option<BookCategory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, BookCategory>(
            r#"
            WITH updated AS (
                UPDATE categories
                SET name = $3, description = $4, updated_at = NOW()
                WHERE tenant_id = $1 AND id = $2
                RETURNING *
            )
            SELECT u.*,
                (SELECT COUNT(*) FROM books b WHERE b.category_id = u.id) AS book_count
            FROM updated u
            "#,
        )
        .bind(tenant_id)
        .bind(category_id)
        .bind(name)
        .bind(description)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_category_error(e, name))
    }

    /// Os livros da categoria ficam sem categoria (ON DELETE SET NULL).
    pub async fn delete_category<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        category_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM categories WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(category_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  LIVROS
    // =========================================================================

    /// Livro novo nasce com todos os exemplares disponíveis.
    pub async fn create_book<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &BookInput<'_>,
    ) -> Result<Book, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                tenant_id, category_id, title, author, isbn, publisher,
                total_copies, available_copies
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(input.category_id)
        .bind(input.title)
        .bind(input.author)
        .bind(input.isbn)
        .bind(input.publisher)
        .bind(input.total_copies)
        .fetch_one(executor)
        .await
        .map_err(|e| map_book_error(e, input.isbn))
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
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE tenant_id = $1
              AND ($2::TEXT IS NULL
                   OR title ILIKE '%' || $2 || '%'
                   OR author ILIKE '%' || $2 || '%'
                   OR isbn ILIKE '%' || $2 || '%')
              AND ($3::UUID IS NULL OR category_id = $3)
            ORDER BY title ASC
            "#,
        )
        .bind(tenant_id)
        .bind(filter.search.as_deref())
        .bind(filter.category_id)
        .fetch_all(executor)
        .await?;
        Ok(books)
    }

    pub async fn find_book<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        book_id: Uuid,
    ) -> Result<Option<Book>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(book_id)
            .fetch_optional(executor)
            .await?;
        Ok(book)
    }

    /// Trava a linha do livro até o fim da transação (contagem de exemplares).
    pub async fn find_book_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        book_id: Uuid,
    ) -> Result<Option<Book>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let book = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(book_id)
        .fetch_optional(executor)
        .await?;
        Ok(book)
    }

    pub async fn update_book<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        book_id: Uuid,
        input: &BookInput<'_>,
        available_copies: i32,
    ) -> Result<Book, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET category_id = $3, title = $4, author = $5, isbn = $6, publisher = $7,
                total_copies = $8, available_copies = $9, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(book_id)
        .bind(input.category_id)
        .bind(input.title)
        .bind(input.author)
        .bind(input.isbn)
        .bind(input.publisher)
        .bind(input.total_copies)
        .bind(available_copies)
        .fetch_one(executor)
        .await
        .map_err(|e| map_book_error(e, input.isbn))
    }

    pub async fn set_available_copies<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        book_id: Uuid,
        available_copies: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE books SET available_copies = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(book_id)
        .bind(available_copies)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_book<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        book_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM books WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(book_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
