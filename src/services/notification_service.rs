// src/services/notification_service.rs

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, db::NotificationRepository, models::notification::Notification};

pub const ISSUED_TITLE: &str = "Book Issued Successfully";
pub const RETURNED_TITLE: &str = "Book Returned Successfully";

pub fn issued_message(book_title: &str, due_date: NaiveDate) -> String {
    format!(
        "You have borrowed \"{}\". Please return it by {}.",
        book_title,
        due_date.format("%Y-%m-%d")
    )
}

pub fn returned_message(book_title: &str, fine: i64) -> String {
    if fine > 0 {
        format!(
            "You have returned \"{}\". A fine of {} was charged.",
            book_title, fine
        )
    } else {
        format!("You have returned \"{}\". Thank you!", book_title)
    }
}

#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    pool: PgPool,
}

impl NotificationService {
    pub fn new(notification_repo: NotificationRepository, pool: PgPool) -> Self {
        Self {
            notification_repo,
            pool,
        }
    }

    /// Melhor esforço: roda depois do commit e nunca falha a operação que a disparou.
    pub async fn notify(&self, tenant_id: Uuid, student_id: Uuid, title: &str, message: &str) {
        if let Err(e) = self
            .notification_repo
            .create(&self.pool, tenant_id, student_id, title, message)
            .await
        {
            tracing::warn!(
                "⚠️ Falha ao gravar notificação '{}' do aluno {}: {}",
                title,
                student_id,
                e
            );
        }
    }

    pub async fn list_for_student(
        &self,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<Notification>, AppError> {
        self.notification_repo
            .list_for_student(&self.pool, tenant_id, student_id)
            .await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        self.notification_repo.list_for_user(&self.pool, user_id).await
    }

    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Notification, AppError> {
        self.notification_repo
            .mark_read_for_user(&self.pool, user_id, notification_id)
            .await?
            .ok_or(AppError::NotificationNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_message_carries_the_due_date() {
        let due = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let msg = issued_message("Dom Casmurro", due);
        assert!(msg.contains("Dom Casmurro"));
        assert!(msg.contains("2025-03-15"));
    }

    #[test]
    fn returned_message_mentions_fine_only_when_charged() {
        assert!(returned_message("Dom Casmurro", 1000).contains("1000"));
        assert!(!returned_message("Dom Casmurro", 0).contains("fine"));
    }
}
