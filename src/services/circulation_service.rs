// src/services/circulation_service.rs

use chrono::{Local, NaiveDate};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    db::{CatalogRepository, CirculationRepository, StudentRepository},
    models::circulation::{BookIssue, BorrowingEligibility, IssueDetail, IssueFilter},
    services::{
        circulation_policy::{self, ReturnPlan, MAX_ACTIVE_ISSUES},
        notification_service::{self, NotificationService},
    },
};

/// Data local do servidor (vencimentos são datas de calendário, sem hora).
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// Status derivado + multa potencial, calculados na leitura
fn present(mut detail: IssueDetail, today: NaiveDate) -> IssueDetail {
    detail.potential_fine = circulation_policy::potential_fine(&detail.issue, today);
    detail.issue.status =
        circulation_policy::effective_status(detail.issue.status, detail.issue.due_date, today);
    detail
}

fn due_before_issue_error() -> AppError {
    let mut errors = ValidationErrors::new();
    let mut err = ValidationError::new("due_before_issue");
    err.message = Some("Due date must be on or after the issue date.".into());
    errors.add("dueDate", err);
    AppError::ValidationError(errors)
}

#[derive(Clone)]
pub struct CirculationService {
    circulation_repo: CirculationRepository,
    catalog_repo: CatalogRepository,
    student_repo: StudentRepository,
    notification_service: NotificationService,
}

impl CirculationService {
    pub fn new(
        circulation_repo: CirculationRepository,
        catalog_repo: CatalogRepository,
        student_repo: StudentRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            circulation_repo,
            catalog_repo,
            student_repo,
            notification_service,
        }
    }

    // =========================================================================
    //  EMPRÉSTIMO
    // =========================================================================

    /// Empresta um exemplar. Todas as regras são verificadas com aluno e livro travados;
    /// qualquer falha desfaz tudo (rollback no drop da transação).
    pub async fn issue_book<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        book_id: Uuid,
        student_id: Uuid,
        issue_date: Option<NaiveDate>,
        due_date: Option<NaiveDate>,
        issued_by: &str,
    ) -> Result<BookIssue, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let issue_date = issue_date.unwrap_or_else(today);
        let due_date = due_date.unwrap_or_else(|| circulation_policy::default_due_date(issue_date));
        if due_date < issue_date {
            return Err(due_before_issue_error());
        }

        // 1. Inicia a transação
        let mut tx = executor.begin().await?;

        // 2. Trava o aluno (serializa empréstimos do mesmo aluno)
        let student = self
            .student_repo
            .find_student_for_update(&mut *tx, tenant_id, student_id)
            .await?
            .ok_or(AppError::StudentNotFound)?;

        if !student.is_active {
            return Err(AppError::StudentInactive);
        }

        // 3. Trava o livro (serializa a contagem de exemplares)
        let book = self
            .catalog_repo
            .find_book_for_update(&mut *tx, tenant_id, book_id)
            .await?
            .ok_or(AppError::BookNotFound)?;

        // 4. Limite e duplicado, sobre as linhas lidas sob trava
        let active = self
            .circulation_repo
            .list_active_for_student(&mut *tx, tenant_id, student_id)
            .await?;
        circulation_policy::evaluate_borrowing(&active, student_id, Some(book_id)).into_result()?;

        // 5. Exemplar disponível?
        let available = circulation_policy::checkout_copy(&book)?;

        // 6. Grava o empréstimo e baixa o exemplar
        let issue = self
            .circulation_repo
            .insert_issue(
                &mut *tx, tenant_id, book_id, student_id, issue_date, due_date, issued_by,
            )
            .await?;

        self.catalog_repo
            .set_available_copies(&mut *tx, tenant_id, book_id, available)
            .await?;

        // 7. Commit
        tx.commit().await?;

        tracing::info!(
            "📚 Livro '{}' emprestado ao aluno {} (vence em {})",
            book.title,
            student.roll_number,
            due_date
        );

        // 8. Notificação (depois do commit, sem afetar o resultado)
        self.notification_service
            .notify(
                tenant_id,
                student_id,
                notification_service::ISSUED_TITLE,
                &notification_service::issued_message(&book.title, due_date),
            )
            .await;

        Ok(issue)
    }

    // =========================================================================
    //  DEVOLUÇÃO
    // =========================================================================

    /// Devolve o exemplar. Vencido => multa fixa (o valor informado é ignorado).
    /// Devolver de novo um empréstimo já devolvido não muda nada.
    pub async fn return_book<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        issue_id: Uuid,
        requested_fine: i64,
    ) -> Result<BookIssue, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let today = today();

        // 1. Inicia a transação e trava o empréstimo
        let mut tx = executor.begin().await?;

        let issue = self
            .circulation_repo
            .find_issue_for_update(&mut *tx, tenant_id, issue_id)
            .await?
            .ok_or(AppError::IssueNotFound)?;

        // 2. Calcula a multa
        let fine = match circulation_policy::plan_return(&issue, requested_fine, today) {
            ReturnPlan::AlreadyReturned => return Ok(issue),
            ReturnPlan::Return { fine } => fine,
        };

        // 3. Trava o livro e devolve o exemplar
        let book = self
            .catalog_repo
            .find_book_for_update(&mut *tx, tenant_id, issue.book_id)
            .await?
            .ok_or(AppError::BookNotFound)?;

        let available = circulation_policy::checkin_copy(&book)?;

        // 4. Fecha o empréstimo
        let returned = self
            .circulation_repo
            .mark_returned(&mut *tx, tenant_id, issue_id, today, fine)
            .await?;

        self.catalog_repo
            .set_available_copies(&mut *tx, tenant_id, book.id, available)
            .await?;

        // 5. Commit
        tx.commit().await?;

        tracing::info!("📗 Livro '{}' devolvido (multa: {})", book.title, fine);

        self.notification_service
            .notify(
                tenant_id,
                returned.student_id,
                notification_service::RETURNED_TITLE,
                &notification_service::returned_message(&book.title, fine),
            )
            .await;

        Ok(returned)
    }

    // =========================================================================
    //  ATRASOS
    // =========================================================================

    /// Reconcilia o tenant (issued vencido => overdue) e lista os atrasados.
    pub async fn get_overdue_books<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<IssueDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let today = today();
        let mut tx = executor.begin().await?;

        let updated = self
            .circulation_repo
            .reconcile_overdue(&mut *tx, Some(tenant_id), today)
            .await?;
        if updated > 0 {
            tracing::debug!("{} empréstimo(s) marcados como atrasados", updated);
        }

        let overdue = self
            .circulation_repo
            .list_overdue(&mut *tx, tenant_id, today)
            .await?;

        tx.commit().await?;

        Ok(overdue.into_iter().map(|d| present(d, today)).collect())
    }

    /// Varredura de todos os tenants (tarefa agendada).
    pub async fn reconcile_all(&self) -> Result<u64, AppError> {
        self.circulation_repo.reconcile_overdue_all(today()).await
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    /// Verificação prévia para a tela de empréstimo (não grava nada).
    pub async fn check_eligibility<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        student_id: Uuid,
        book_id: Option<Uuid>,
    ) -> Result<BorrowingEligibility, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let student = self
            .student_repo
            .find_student(&mut *conn, tenant_id, student_id)
            .await?
            .ok_or(AppError::StudentNotFound)?;

        let active = self
            .circulation_repo
            .list_active_for_student(&mut *conn, tenant_id, student_id)
            .await?;

        let active_issues = circulation_policy::count_active(&active, student_id);
        let reason = if student.is_active {
            circulation_policy::evaluate_borrowing(&active, student_id, book_id).reason_code()
        } else {
            Some("STUDENT_INACTIVE")
        };

        Ok(BorrowingEligibility {
            student_id,
            can_issue: reason.is_none(),
            reason: reason.map(str::to_string),
            active_issues,
            limit: MAX_ACTIVE_ISSUES,
        })
    }

    pub async fn list_issues<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &IssueFilter,
    ) -> Result<Vec<IssueDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let today = today();
        let issues = self
            .circulation_repo
            .list_issue_details(executor, tenant_id, filter, today)
            .await?;
        Ok(issues.into_iter().map(|d| present(d, today)).collect())
    }

    pub async fn get_issue<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        issue_id: Uuid,
    ) -> Result<IssueDetail, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let detail = self
            .circulation_repo
            .find_issue_detail(executor, tenant_id, issue_id)
            .await?
            .ok_or(AppError::IssueNotFound)?;
        Ok(present(detail, today()))
    }

    /// Histórico do aluno (todos os status).
    pub async fn list_student_issues<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<IssueDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        self.student_repo
            .find_student(&mut *conn, tenant_id, student_id)
            .await?
            .ok_or(AppError::StudentNotFound)?;

        let filter = IssueFilter {
            student_id: Some(student_id),
            ..IssueFilter::default()
        };
        self.list_issues(&mut *conn, tenant_id, &filter).await
    }

    /// Empréstimos do aluno logado, em todas as bibliotecas.
    pub async fn list_my_issues<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<IssueDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let today = today();
        let issues = self.circulation_repo.list_for_user(executor, user_id).await?;
        Ok(issues.into_iter().map(|d| present(d, today)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::circulation::IssueStatus, services::circulation_policy::BorrowingDecision};
    use chrono::Utc;

    fn detail(due: NaiveDate, status: IssueStatus) -> IssueDetail {
        IssueDetail {
            issue: BookIssue {
                id: Uuid::new_v4(),
                tenant_id: Uuid::new_v4(),
                book_id: Uuid::new_v4(),
                student_id: Uuid::new_v4(),
                issue_date: due - chrono::Days::new(14),
                due_date: due,
                return_date: None,
                status,
                fine: 0,
                issued_by: "Maria".into(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            book_title: "Dom Casmurro".into(),
            book_isbn: "978-8535910667".into(),
            student_name: "Ana".into(),
            student_roll_number: "2025-001".into(),
            potential_fine: 0,
        }
    }

    #[test]
    fn present_reports_derived_overdue_and_fine() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

        let due_today = present(detail(today, IssueStatus::Issued), today);
        assert_eq!(due_today.issue.status, IssueStatus::Overdue);
        assert_eq!(due_today.potential_fine, 1000);

        let on_time = present(detail(today + chrono::Days::new(1), IssueStatus::Issued), today);
        assert_eq!(on_time.issue.status, IssueStatus::Issued);
        assert_eq!(on_time.potential_fine, 0);
    }

    #[test]
    fn present_keeps_returned_issues_fine_free() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let past_due = today - chrono::Days::new(3);

        let returned = present(detail(past_due, IssueStatus::Returned), today);
        assert_eq!(returned.issue.status, IssueStatus::Returned);
        assert_eq!(returned.potential_fine, 0);
    }

    #[test]
    fn due_date_before_issue_date_is_a_field_error() {
        match due_before_issue_error() {
            AppError::ValidationError(errors) => {
                assert!(errors.field_errors().contains_key("dueDate"));
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn eligibility_decision_maps_to_reason_codes() {
        assert_eq!(BorrowingDecision::Eligible.reason_code(), None);
        assert_eq!(
            BorrowingDecision::LimitExceeded.reason_code(),
            Some("LIMIT_EXCEEDED")
        );
    }
}
