// src/db/notification_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::notification::Notification};

#[derive(Clone, Default)]
pub struct NotificationRepository;

impl NotificationRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        student_id: Uuid,
        title: &str,
        message: &str,
    ) -> Result<Notification, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (tenant_id, student_id, title, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(student_id)
        .bind(title)
        .bind(message)
        .fetch_one(executor)
        .await?;
        Ok(notification)
    }

    pub async fn list_for_student<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE tenant_id = $1 AND student_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(student_id)
        .fetch_all(executor)
        .await?;
        Ok(notifications)
    }

    /// Notificações de todos os cadastros de aluno vinculados ao usuário.
    pub async fn list_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT n.* FROM notifications n
            JOIN students s ON s.id = n.student_id
            WHERE s.user_id = $1
            ORDER BY n.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(notifications)
    }

    /// Só marca se a notificação pertencer a um aluno vinculado ao usuário.
    pub async fn mark_read_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications n
            SET is_read = TRUE
            FROM students s
            WHERE n.id = $2 AND s.id = n.student_id AND s.user_id = $1
            RETURNING n.*
            "#,
        )
        .bind(user_id)
        .bind(notification_id)
        .fetch_optional(executor)
        .await?;
        Ok(notification)
    }
}
