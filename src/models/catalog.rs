// src/models/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Categorias ---
// `book_count` é derivado (COUNT dos livros) e não existe na tabela.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookCategory {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Literatura Brasileira")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 12)]
    pub book_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 2. Livros ---
// Invariante: 0 <= available_copies <= total_copies (também garantida por CHECK no banco)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub category_id: Option<Uuid>,
    #[schema(example = "Dom Casmurro")]
    pub title: String,
    #[schema(example = "Machado de Assis")]
    pub author: String,
    #[schema(example = "978-8535910667")]
    pub isbn: String,
    pub publisher: Option<String>,
    #[schema(example = 3)]
    pub total_copies: i32,
    #[schema(example = 2)]
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Exemplares atualmente emprestados.
    pub fn outstanding_copies(&self) -> i32 {
        self.total_copies - self.available_copies
    }
}

// Campos editáveis de um livro (criação e atualização usam o mesmo formato)
#[derive(Debug, Clone)]
pub struct BookInput<'a> {
    pub category_id: Option<Uuid>,
    pub title: &'a str,
    pub author: &'a str,
    pub isbn: &'a str,
    pub publisher: Option<&'a str>,
    pub total_copies: i32,
}

#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
}
