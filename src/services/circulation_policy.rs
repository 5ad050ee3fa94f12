// src/services/circulation_policy.rs
//
// Regras puras de circulação (sem banco). O CirculationService chama estas funções
// dentro da transação, sobre linhas lidas com FOR UPDATE.

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::Book,
        circulation::{BookIssue, IssueStatus},
    },
};

/// Máximo de empréstimos ativos (issued/overdue) por aluno.
pub const MAX_ACTIVE_ISSUES: i64 = 5;

/// Multa fixa por atraso, não proporcional aos dias.
pub const FLAT_OVERDUE_FINE: i64 = 1000;

pub const DEFAULT_LOAN_DAYS: u64 = 14;

/// O vencimento já chegou? (o dia do vencimento conta como atrasado)
pub fn is_past_due(due_date: NaiveDate, today: NaiveDate) -> bool {
    due_date <= today
}

/// Status derivado: um empréstimo `issued` vencido é `overdue`, mesmo antes da reconciliação.
pub fn effective_status(stored: IssueStatus, due_date: NaiveDate, today: NaiveDate) -> IssueStatus {
    match stored {
        IssueStatus::Issued if is_past_due(due_date, today) => IssueStatus::Overdue,
        other => other,
    }
}

/// Multa que seria cobrada se o livro voltasse hoje.
pub fn potential_fine(issue: &BookIssue, today: NaiveDate) -> i64 {
    if issue.status.is_active() && is_past_due(issue.due_date, today) {
        FLAT_OVERDUE_FINE
    } else {
        0
    }
}

pub fn default_due_date(issue_date: NaiveDate) -> NaiveDate {
    issue_date
        .checked_add_days(Days::new(DEFAULT_LOAN_DAYS))
        .unwrap_or(issue_date)
}

// ---
// Limite de empréstimos / livro duplicado
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowingDecision {
    Eligible,
    LimitExceeded,
    DuplicateBook,
}

impl BorrowingDecision {
    pub fn reason_code(self) -> Option<&'static str> {
        match self {
            BorrowingDecision::Eligible => None,
            BorrowingDecision::LimitExceeded => Some("LIMIT_EXCEEDED"),
            BorrowingDecision::DuplicateBook => Some("DUPLICATE_BOOK"),
        }
    }

    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            BorrowingDecision::Eligible => Ok(()),
            BorrowingDecision::LimitExceeded => Err(AppError::LimitExceeded {
                limit: MAX_ACTIVE_ISSUES,
            }),
            BorrowingDecision::DuplicateBook => Err(AppError::DuplicateBook),
        }
    }
}

pub fn count_active(issues: &[BookIssue], student_id: Uuid) -> i64 {
    issues
        .iter()
        .filter(|i| i.student_id == student_id && i.status.is_active())
        .count() as i64
}

/// Avalia se o aluno pode pegar o livro. O limite é verificado antes do duplicado.
/// `book_id = None` verifica só o limite (a tela ainda não escolheu o livro).
pub fn evaluate_borrowing(
    issues: &[BookIssue],
    student_id: Uuid,
    book_id: Option<Uuid>,
) -> BorrowingDecision {
    if count_active(issues, student_id) >= MAX_ACTIVE_ISSUES {
        return BorrowingDecision::LimitExceeded;
    }

    let holds_same_book = book_id.is_some_and(|book_id| {
        issues
            .iter()
            .any(|i| i.student_id == student_id && i.book_id == book_id && i.status.is_active())
    });

    if holds_same_book {
        BorrowingDecision::DuplicateBook
    } else {
        BorrowingDecision::Eligible
    }
}

// ---
// Devolução
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnPlan {
    /// Já devolvido: nada muda (nem multa, nem exemplares).
    AlreadyReturned,
    Return { fine: i64 },
}

/// Vencido => multa fixa, ignorando o valor informado. No prazo => valor informado.
pub fn plan_return(issue: &BookIssue, requested_fine: i64, today: NaiveDate) -> ReturnPlan {
    if issue.status == IssueStatus::Returned {
        return ReturnPlan::AlreadyReturned;
    }

    let fine = if is_past_due(issue.due_date, today) {
        FLAT_OVERDUE_FINE
    } else {
        requested_fine.max(0)
    };

    ReturnPlan::Return { fine }
}

// ---
// Exemplares
// ---

/// Novo `available_copies` após emprestar um exemplar.
pub fn checkout_copy(book: &Book) -> Result<i32, AppError> {
    if book.available_copies <= 0 {
        return Err(AppError::NoCopiesAvailable);
    }
    Ok(book.available_copies - 1)
}

/// Novo `available_copies` após a devolução de um exemplar.
pub fn checkin_copy(book: &Book) -> Result<i32, AppError> {
    if book.available_copies >= book.total_copies {
        return Err(AppError::InternalServerError(anyhow::anyhow!(
            "Livro {} já tem todos os {} exemplares disponíveis",
            book.id,
            book.total_copies
        )));
    }
    Ok(book.available_copies + 1)
}

/// Novo `available_copies` quando o total de exemplares muda.
pub fn resize_copies(book: &Book, new_total: i32) -> Result<i32, AppError> {
    let outstanding = book.outstanding_copies();
    if new_total < outstanding {
        return Err(AppError::InvalidCopyCount { outstanding });
    }
    Ok(new_total - outstanding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn book(total: i32, available: i32) -> Book {
        Book {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            category_id: None,
            title: "Dom Casmurro".into(),
            author: "Machado de Assis".into(),
            isbn: "978-8535910667".into(),
            publisher: None,
            total_copies: total,
            available_copies: available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn issue(student_id: Uuid, book_id: Uuid, due: &str, status: IssueStatus) -> BookIssue {
        BookIssue {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            book_id,
            student_id,
            issue_date: date("2025-03-01"),
            due_date: date(due),
            return_date: None,
            status,
            fine: 0,
            issued_by: "Maria".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sixth_active_issue_is_rejected() {
        let student = Uuid::new_v4();
        let mut issues: Vec<BookIssue> = Vec::new();

        for n in 0..5 {
            let next_book = Uuid::new_v4();
            assert_eq!(
                evaluate_borrowing(&issues, student, Some(next_book)),
                BorrowingDecision::Eligible,
                "attempt {}",
                n + 1
            );
            issues.push(issue(student, next_book, "2025-03-15", IssueStatus::Issued));
        }

        let decision = evaluate_borrowing(&issues, student, Some(Uuid::new_v4()));
        assert_eq!(decision, BorrowingDecision::LimitExceeded);
        assert!(matches!(
            decision.into_result(),
            Err(AppError::LimitExceeded { limit: 5 })
        ));
        assert_eq!(count_active(&issues, student), 5);
    }

    #[test]
    fn overdue_issues_count_towards_the_limit_and_returned_do_not() {
        let student = Uuid::new_v4();
        let mut issues: Vec<BookIssue> = (0..4)
            .map(|_| issue(student, Uuid::new_v4(), "2025-03-15", IssueStatus::Overdue))
            .collect();
        issues.push(issue(student, Uuid::new_v4(), "2025-03-15", IssueStatus::Returned));
        issues.push(issue(Uuid::new_v4(), Uuid::new_v4(), "2025-03-15", IssueStatus::Issued));

        assert_eq!(count_active(&issues, student), 4);
        assert_eq!(
            evaluate_borrowing(&issues, student, Some(Uuid::new_v4())),
            BorrowingDecision::Eligible
        );
    }

    #[test]
    fn same_active_book_is_a_duplicate() {
        let student = Uuid::new_v4();
        let book_id = Uuid::new_v4();
        let issues = vec![issue(student, book_id, "2025-03-15", IssueStatus::Overdue)];

        let decision = evaluate_borrowing(&issues, student, Some(book_id));
        assert_eq!(decision, BorrowingDecision::DuplicateBook);
        assert_eq!(decision.reason_code(), Some("DUPLICATE_BOOK"));
    }

    #[test]
    fn returned_copy_of_same_book_can_be_borrowed_again() {
        let student = Uuid::new_v4();
        let book_id = Uuid::new_v4();
        let issues = vec![issue(student, book_id, "2025-03-15", IssueStatus::Returned)];

        assert_eq!(
            evaluate_borrowing(&issues, student, Some(book_id)),
            BorrowingDecision::Eligible
        );
    }

    #[test]
    fn limit_is_checked_before_duplicate() {
        let student = Uuid::new_v4();
        let held = Uuid::new_v4();
        let mut issues = vec![issue(student, held, "2025-03-15", IssueStatus::Issued)];
        issues.extend((0..4).map(|_| issue(student, Uuid::new_v4(), "2025-03-15", IssueStatus::Issued)));

        assert_eq!(
            evaluate_borrowing(&issues, student, Some(held)),
            BorrowingDecision::LimitExceeded
        );
    }

    #[test]
    fn due_date_today_counts_as_overdue() {
        let today = date("2025-03-15");
        assert!(is_past_due(date("2025-03-15"), today));
        assert!(is_past_due(date("2025-03-01"), today));
        assert!(!is_past_due(date("2025-03-16"), today));

        assert_eq!(
            effective_status(IssueStatus::Issued, date("2025-03-15"), today),
            IssueStatus::Overdue
        );
        assert_eq!(
            effective_status(IssueStatus::Issued, date("2025-03-16"), today),
            IssueStatus::Issued
        );
        assert_eq!(
            effective_status(IssueStatus::Returned, date("2025-03-01"), today),
            IssueStatus::Returned
        );
    }

    #[test]
    fn overdue_return_forces_flat_fine_regardless_of_days_late() {
        let student = Uuid::new_v4();
        let one_day = issue(student, Uuid::new_v4(), "2025-03-14", IssueStatus::Issued);
        let months = issue(student, Uuid::new_v4(), "2024-11-01", IssueStatus::Overdue);
        let today = date("2025-03-15");

        assert_eq!(plan_return(&one_day, 0, today), ReturnPlan::Return { fine: 1000 });
        assert_eq!(plan_return(&months, 0, today), ReturnPlan::Return { fine: 1000 });
        // O valor informado pelo bibliotecário é ignorado quando há atraso
        assert_eq!(plan_return(&months, 250, today), ReturnPlan::Return { fine: 1000 });
    }

    #[test]
    fn on_time_return_has_no_fine_by_default() {
        let on_time = issue(Uuid::new_v4(), Uuid::new_v4(), "2025-03-20", IssueStatus::Issued);
        let today = date("2025-03-15");

        assert_eq!(plan_return(&on_time, 0, today), ReturnPlan::Return { fine: 0 });
        assert_eq!(plan_return(&on_time, 150, today), ReturnPlan::Return { fine: 150 });
        assert_eq!(potential_fine(&on_time, today), 0);
    }

    #[test]
    fn returning_twice_does_not_reapply_the_fine() {
        let mut returned = issue(Uuid::new_v4(), Uuid::new_v4(), "2025-03-01", IssueStatus::Returned);
        returned.fine = 0;
        returned.return_date = Some(date("2025-02-28"));

        assert_eq!(plan_return(&returned, 0, date("2025-04-01")), ReturnPlan::AlreadyReturned);
        assert_eq!(potential_fine(&returned, date("2025-04-01")), 0);
    }

    #[test]
    fn copies_stay_within_bounds() {
        let empty = book(2, 0);
        assert!(matches!(checkout_copy(&empty), Err(AppError::NoCopiesAvailable)));

        let full = book(2, 2);
        assert!(matches!(checkin_copy(&full), Err(AppError::InternalServerError(_))));
    }

    #[test]
    fn available_copies_track_issues_minus_returns() {
        let mut b = book(4, 4);
        for _ in 0..4 {
            b.available_copies = checkout_copy(&b).unwrap();
        }
        assert_eq!(b.available_copies, 0);
        for _ in 0..3 {
            b.available_copies = checkin_copy(&b).unwrap();
        }
        // N = 4, M = 3 => total - (N - M)
        assert_eq!(b.available_copies, 4 - (4 - 3));
    }

    #[test]
    fn resizing_below_outstanding_copies_fails() {
        let b = book(5, 2); // 3 emprestados
        assert!(matches!(
            resize_copies(&b, 2),
            Err(AppError::InvalidCopyCount { outstanding: 3 })
        ));
        assert_eq!(resize_copies(&b, 3).unwrap(), 0);
        assert_eq!(resize_copies(&b, 8).unwrap(), 5);
    }

    #[test]
    fn default_loan_is_two_weeks() {
        assert_eq!(default_due_date(date("2025-03-01")), date("2025-03-15"));
    }

    // Cenário completo: emprestar, vencer, reconciliar, devolver.
    #[test]
    fn issue_overdue_return_scenario() {
        let today = date("2025-03-01");
        let student = Uuid::new_v4();
        let mut b = book(3, 3);
        let mut issues: Vec<BookIssue> = Vec::new();

        // 1. Empréstimo com vencimento em 14 dias
        evaluate_borrowing(&issues, student, Some(b.id)).into_result().unwrap();
        b.available_copies = checkout_copy(&b).unwrap();
        let mut loan = issue(student, b.id, "2025-03-15", IssueStatus::Issued);
        loan.issue_date = today;
        assert_eq!(default_due_date(today), loan.due_date);
        issues.push(loan);
        assert_eq!(b.available_copies, 2);
        assert_eq!(effective_status(issues[0].status, issues[0].due_date, today), IssueStatus::Issued);

        // 2. O relógio passa do vencimento
        let later = date("2025-03-20");
        let status = effective_status(issues[0].status, issues[0].due_date, later);
        assert_eq!(status, IssueStatus::Overdue);
        issues[0].status = status;
        assert_eq!(potential_fine(&issues[0], later), FLAT_OVERDUE_FINE);

        // 3. Devolução
        let ReturnPlan::Return { fine } = plan_return(&issues[0], 0, later) else {
            panic!("expected a return");
        };
        b.available_copies = checkin_copy(&b).unwrap();
        issues[0].status = IssueStatus::Returned;
        issues[0].fine = fine;

        assert_eq!(fine, 1000);
        assert_eq!(b.available_copies, 3);
        assert_eq!(count_active(&issues, student), 0);
    }
}
