// src/services/student_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{StudentRepository, UserRepository},
    models::student::{Student, StudentFilter, StudentInput},
};

#[derive(Clone)]
pub struct StudentService {
    student_repo: StudentRepository,
    user_repo: UserRepository,
}

impl StudentService {
    pub fn new(student_repo: StudentRepository, user_repo: UserRepository) -> Self {
        Self {
            student_repo,
            user_repo,
        }
    }

    // Se já existe conta com o e-mail do aluno, o cadastro nasce vinculado
    async fn resolve_user_id(&self, email: Option<&str>) -> Result<Option<Uuid>, AppError> {
        let Some(email) = email.filter(|e| !e.trim().is_empty()) else {
            return Ok(None);
        };
        Ok(self.user_repo.find_by_email(email).await?.map(|u| u.id))
    }

    pub async fn create_student<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &StudentInput<'_>,
    ) -> Result<Student, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user_id = self.resolve_user_id(input.email).await?;

        self.student_repo
            .create_student(executor, tenant_id, user_id, input)
            .await
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
        self.student_repo
            .list_students(executor, tenant_id, filter)
            .await
    }

    pub async fn get_student<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Student, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.student_repo
            .find_student(executor, tenant_id, student_id)
            .await?
            .ok_or(AppError::StudentNotFound)
    }

    /// Um vínculo já existente com uma conta nunca é desfeito pela edição.
    pub async fn update_student<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        student_id: Uuid,
        input: &StudentInput<'_>,
    ) -> Result<Student, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user_id = self.resolve_user_id(input.email).await?;

        self.student_repo
            .update_student(executor, tenant_id, student_id, user_id, input)
            .await?
            .ok_or(AppError::StudentNotFound)
    }
}
