// src/db/dashboard_repo.rs

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::dashboard::LibrarySummary};

// Precisa ser o primeiro comando da transação
const SNAPSHOT_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY";

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cards do painel. As três leituras enxergam o mesmo snapshot (REPEATABLE READ).
    pub async fn get_summary(
        &self,
        tenant_id: Uuid,
        today: NaiveDate,
    ) -> Result<LibrarySummary, AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(SNAPSHOT_ISOLATION).execute(&mut *tx).await?;

        // A. Acervo
        let (total_titles, total_copies, available_copies) =
            sqlx::query_as::<Postgres, (i64, i64, i64)>(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(total_copies), 0)::BIGINT,
                       COALESCE(SUM(available_copies), 0)::BIGINT
                FROM books
                WHERE tenant_id = $1
                "#,
            )
            .bind(tenant_id)
            .fetch_one(&mut *tx)
            .await?;

        // B. Alunos ativos
        let total_students = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM students WHERE tenant_id = $1 AND is_active",
        )
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;

        // C. Circulação (atrasado = ativo com vencimento até hoje)
        let (active_issues, overdue_issues, fines_collected) =
            sqlx::query_as::<Postgres, (i64, i64, i64)>(
                r#"
                SELECT
                    COUNT(*) FILTER (WHERE status <> 'RETURNED'),
                    COUNT(*) FILTER (WHERE status <> 'RETURNED' AND due_date <= $2),
                    COALESCE(SUM(fine) FILTER (WHERE status = 'RETURNED'), 0)::BIGINT
                FROM book_issues
                WHERE tenant_id = $1
                "#,
            )
            .bind(tenant_id)
            .bind(today)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(LibrarySummary {
            total_titles,
            total_copies,
            available_copies,
            total_students,
            active_issues,
            overdue_issues,
            fines_collected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reads_share_one_snapshot() {
        // READ COMMITTED tira um snapshot por comando
        assert!(SNAPSHOT_ISOLATION.starts_with("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ"));
    }
}
