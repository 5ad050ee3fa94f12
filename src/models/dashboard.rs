// src/models/dashboard.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// Resumo da biblioteca (os cards do topo do painel)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySummary {
    pub total_titles: i64,
    pub total_copies: i64,
    pub available_copies: i64,
    pub total_students: i64,
    pub active_issues: i64,
    pub overdue_issues: i64,
    pub fines_collected: i64,
}
