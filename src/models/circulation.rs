// src/models/circulation.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// issued -> overdue -> returned (terminal); issued -> returned também vale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "issue_status", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "lowercase")] // JSON
pub enum IssueStatus {
    Issued,
    Overdue,
    Returned,
}

impl IssueStatus {
    /// Empréstimo ativo = ainda não devolvido.
    pub fn is_active(self) -> bool {
        matches!(self, IssueStatus::Issued | IssueStatus::Overdue)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookIssue {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub book_id: Uuid,
    pub student_id: Uuid,
    #[schema(value_type = String, format = Date, example = "2025-03-01")]
    pub issue_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2025-03-15")]
    pub due_date: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub return_date: Option<NaiveDate>,
    pub status: IssueStatus,
    #[schema(example = 0)]
    pub fine: i64,
    #[schema(example = "Maria Souza")]
    pub issued_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Empréstimo com os dados do livro e do aluno (listas, faturas, painel)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub issue: BookIssue,
    pub book_title: String,
    pub book_isbn: String,
    pub student_name: String,
    pub student_roll_number: String,

    // Multa que seria cobrada se o livro fosse devolvido hoje
    #[sqlx(skip)]
    #[schema(example = 1000)]
    pub potential_fine: i64,
}

#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub student_id: Option<Uuid>,
    pub book_id: Option<Uuid>,
}

// Resposta da verificação prévia (a UI desabilita o botão de empréstimo)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingEligibility {
    pub student_id: Uuid,
    pub can_issue: bool,
    #[schema(example = "LIMIT_EXCEEDED")]
    pub reason: Option<String>,
    #[schema(example = 3)]
    pub active_issues: i64,
    #[schema(example = 5)]
    pub limit: i64,
}
