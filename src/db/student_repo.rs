// src/db/student_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::student::{Student, StudentFilter, StudentInput},
};

#[derive(Clone, Default)]
pub struct StudentRepository;

fn map_student_error(e: sqlx::Error, roll_number: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::RollNumberAlreadyExists(roll_number.to_string());
        }
    }
    e.into()
}

impl StudentRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_student<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Option<Uuid>,
        input: &StudentInput<'_>,
    ) -> Result<Student, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (
                tenant_id, user_id, name, email, roll_number, department, phone, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(input.name)
        .bind(input.email)
        .bind(input.roll_number)
        .bind(input.department)
        .bind(input.phone)
        .bind(input.is_active)
        .fetch_one(executor)
        .await
        .map_err(|e| map_student_error(e, input.roll_number))
    }

    pub async fn list_students<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &StudentFilter,
    ) -> Result<Vec<Student>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let students = sqlx::query_as::<_, Student>(
            r#"
            SELECT * FROM students
            WHERE tenant_id = $1
              AND ($2::TEXT IS NULL
                   OR name ILIKE '%' || $2 || '%'
                   OR roll_number ILIKE '%' || $2 || '%'
                   OR email ILIKE '%' || $2 || '%')
              AND ($3::BOOLEAN IS NULL OR is_active = $3)
            ORDER BY name ASC
            "#,
        )
        .bind(tenant_id)
        .bind(filter.search.as_deref())
        .bind(filter.active)
        .fetch_all(executor)
        .await?;
        Ok(students)
    }

    pub async fn find_student<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<Student>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let student = sqlx::query_as::<_, Student>(
            "SELECT * FROM students WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(student_id)
        .fetch_optional(executor)
        .await?;
        Ok(student)
    }

    /// Trava o aluno: empréstimos simultâneos do mesmo aluno ficam em fila.
    pub async fn find_student_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<Student>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let student = sqlx::query_as::<_, Student>(
            "SELECT * FROM students WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(student_id)
        .fetch_optional(executor)
        .await?;
        Ok(student)
    }

    pub async fn update_student<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        student_id: Uuid,
        user_id: Option<Uuid>,
        input: &StudentInput<'_>,
    ) -> Result<Option<Student>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET user_id = COALESCE($3, user_id), name = $4, email = $5, roll_number = $6,
                department = $7, phone = $8, is_active = $9, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(student_id)
        .bind(user_id)
        .bind(input.name)
        .bind(input.email)
        .bind(input.roll_number)
        .bind(input.department)
        .bind(input.phone)
        .bind(input.is_active)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_student_error(e, input.roll_number))
    }

    /// Vincula a conta recém-criada aos cadastros de aluno com o mesmo e-mail.
    pub async fn link_user_to_existing_students<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        email: &str,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE students SET user_id = $1, updated_at = NOW()
            WHERE user_id IS NULL AND lower(email) = lower($2)
            "#,
        )
        .bind(user_id)
        .bind(email)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
