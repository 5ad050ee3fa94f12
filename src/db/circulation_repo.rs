// src/db/circulation_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::circulation::{BookIssue, IssueDetail, IssueFilter},
};

// Empréstimo + livro + aluno (base de todas as listagens)
const ISSUE_DETAIL_SELECT: &str = r#"
    SELECT i.*,
           b.title AS book_title,
           b.isbn AS book_isbn,
           s.name AS student_name,
           s.roll_number AS student_roll_number
    FROM book_issues i
    JOIN books b ON b.id = i.book_id
    JOIN students s ON s.id = i.student_id
"#;

#[derive(Clone)]
pub struct CirculationRepository {
    pool: PgPool,
}

impl CirculationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  ESCRITA (sempre dentro da transação do serviço)
    // =========================================================================

    /// Empréstimos ativos (issued/overdue) do aluno.
    pub async fn list_active_for_student<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<BookIssue>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let issues = sqlx::query_as::<_, BookIssue>(
            r#"
            SELECT * FROM book_issues
            WHERE tenant_id = $1 AND student_id = $2 AND status <> 'RETURNED'
            ORDER BY due_date ASC
            "#,
        )
        .bind(tenant_id)
        .bind(student_id)
        .fetch_all(executor)
        .await?;
        Ok(issues)
    }

    pub async fn insert_issue<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        book_id: Uuid,
        student_id: Uuid,
        issue_date: NaiveDate,
        due_date: NaiveDate,
        issued_by: &str,
    ) -> Result<BookIssue, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, BookIssue>(
            r#"
            INSERT INTO book_issues (
                tenant_id, book_id, student_id, issue_date, due_date, status, fine, issued_by
            )
            VALUES ($1, $2, $3, $4, $5, 'ISSUED', 0, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(book_id)
        .bind(student_id)
        .bind(issue_date)
        .bind(due_date)
        .bind(issued_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // O índice parcial (aluno, livro) WHERE status <> 'RETURNED' é a última barreira
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateBook;
                }
            }
            e.into()
        })
    }

    pub async fn find_issue_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        issue_id: Uuid,
    ) -> Result<Option<BookIssue>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let issue = sqlx::query_as::<_, BookIssue>(
            "SELECT * FROM book_issues WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(issue_id)
        .fetch_optional(executor)
        .await?;
        Ok(issue)
    }

    pub async fn mark_returned<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        issue_id: Uuid,
        return_date: NaiveDate,
        fine: i64,
    ) -> Result<BookIssue, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let issue = sqlx::query_as::<_, BookIssue>(
            r#"
            UPDATE book_issues
            SET status = 'RETURNED', return_date = $3, fine = $4, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(issue_id)
        .bind(return_date)
        .bind(fine)
        .fetch_one(executor)
        .await?;
        Ok(issue)
    }

    /// Reconciliação idempotente: issued + vencido => overdue.
    /// `tenant_id = None` varre todos os tenants (tarefa agendada).
    pub async fn reconcile_overdue<'e, E>(
        &self,
        executor: E,
        tenant_id: Option<Uuid>,
        today: NaiveDate,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE book_issues
            SET status = 'OVERDUE', updated_at = NOW()
            WHERE status = 'ISSUED'
              AND due_date <= $1
              AND ($2::UUID IS NULL OR tenant_id = $2)
            "#,
        )
        .bind(today)
        .bind(tenant_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn reconcile_overdue_all(&self, today: NaiveDate) -> Result<u64, AppError> {
        self.reconcile_overdue(&self.pool, None, today).await
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn find_issue_detail<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        issue_id: Uuid,
    ) -> Result<Option<IssueDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{ISSUE_DETAIL_SELECT} WHERE i.tenant_id = $1 AND i.id = $2");
        let issue = sqlx::query_as::<_, IssueDetail>(&sql)
            .bind(tenant_id)
            .bind(issue_id)
            .fetch_optional(executor)
            .await?;
        Ok(issue)
    }

    /// O filtro de status usa o status derivado (issued vencido conta como overdue).
    pub async fn list_issue_details<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &IssueFilter,
        today: NaiveDate,
    ) -> Result<Vec<IssueDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"{ISSUE_DETAIL_SELECT}
            WHERE i.tenant_id = $1
              AND ($2::issue_status IS NULL
                   OR ($2 = 'OVERDUE' AND (i.status = 'OVERDUE'
                                           OR (i.status = 'ISSUED' AND i.due_date <= $5)))
                   OR ($2 = 'ISSUED' AND i.status = 'ISSUED' AND i.due_date > $5)
                   OR ($2 = 'RETURNED' AND i.status = 'RETURNED'))
              AND ($3::UUID IS NULL OR i.student_id = $3)
              AND ($4::UUID IS NULL OR i.book_id = $4)
            ORDER BY i.issue_date DESC, i.created_at DESC"#
        );
        let issues = sqlx::query_as::<_, IssueDetail>(&sql)
            .bind(tenant_id)
            .bind(filter.status)
            .bind(filter.student_id)
            .bind(filter.book_id)
            .bind(today)
            .fetch_all(executor)
            .await?;
        Ok(issues)
    }

    /// Ativos com vencimento até hoje, do mais antigo para o mais recente.
    pub async fn list_overdue<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<IssueDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"{ISSUE_DETAIL_SELECT}
            WHERE i.tenant_id = $1 AND i.status <> 'RETURNED' AND i.due_date <= $2
            ORDER BY i.due_date ASC"#
        );
        let issues = sqlx::query_as::<_, IssueDetail>(&sql)
            .bind(tenant_id)
            .bind(today)
            .fetch_all(executor)
            .await?;
        Ok(issues)
    }

    /// Empréstimos do aluno logado (todas as bibliotecas em que ele está cadastrado).
    pub async fn list_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<IssueDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"{ISSUE_DETAIL_SELECT}
            WHERE s.user_id = $1
            ORDER BY i.issue_date DESC, i.created_at DESC"#
        );
        let issues = sqlx::query_as::<_, IssueDetail>(&sql)
            .bind(user_id)
            .fetch_all(executor)
            .await?;
        Ok(issues)
    }
}
