// src/models/student.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    // Conta de login vinculada (quando o aluno tem usuário com o mesmo e-mail)
    pub user_id: Option<Uuid>,
    #[schema(example = "João Pereira")]
    pub name: String,
    #[schema(example = "joao@aluno.edu")]
    pub email: Option<String>,
    #[schema(example = "2024-0042")]
    pub roll_number: String,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StudentInput<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub roll_number: &'a str,
    pub department: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub search: Option<String>,
    pub active: Option<bool>,
}
