// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erro único da aplicação. Cada variante tem um código estável (usado pelo i18n)
// e um status HTTP. A mensagem do `#[error]` é o fallback em inglês.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("One or more fields are invalid.")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Autenticação / Acesso ---
    #[error("This e-mail is already in use.")]
    EmailAlreadyExists,

    #[error("Invalid e-mail or password.")]
    InvalidCredentials,

    #[error("Authentication token is invalid or missing.")]
    InvalidToken,

    #[error("User not found.")]
    UserNotFound,

    #[error("The X-Tenant-ID header is required.")]
    MissingTenantHeader,

    #[error("The X-Tenant-ID header is not a valid UUID.")]
    InvalidTenantHeader,

    #[error("You do not have access to this library.")]
    TenantAccessDenied,

    #[error("You need the '{0}' permission to perform this action.")]
    MissingPermission(&'static str),

    #[error("Only the administrator can access this resource.")]
    AdminOnly,

    // --- Não encontrados ---
    #[error("Book not found.")]
    BookNotFound,

    #[error("Category not found.")]
    CategoryNotFound,

    #[error("Student not found.")]
    StudentNotFound,

    #[error("Issue record not found.")]
    IssueNotFound,

    #[error("Notification not found.")]
    NotificationNotFound,

    // --- Conflitos de unicidade ---
    #[error("This user is already a member of the library.")]
    AlreadyMember,

    #[error("A book with ISBN '{0}' already exists.")]
    IsbnAlreadyExists(String),

    #[error("A category named '{0}' already exists.")]
    CategoryNameAlreadyExists(String),

    #[error("A student with roll number '{0}' already exists.")]
    RollNumberAlreadyExists(String),

    // --- Regras de circulação ---
    #[error("Student has reached the limit of {limit} borrowed books.")]
    LimitExceeded { limit: i64 },

    #[error("Student already has this book issued.")]
    DuplicateBook,

    #[error("No copies of this book are available.")]
    NoCopiesAvailable,

    #[error("Student is inactive and cannot borrow books.")]
    StudentInactive,

    #[error("The book still has copies issued and cannot be deleted.")]
    BookHasActiveIssues,

    #[error("Total copies cannot be lower than the {outstanding} copies currently issued.")]
    InvalidCopyCount { outstanding: i32 },

    // --- Infraestrutura ---
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O corpo de erro que vai para o cliente (já traduzido).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::MissingTenantHeader => "MISSING_TENANT_HEADER",
            AppError::InvalidTenantHeader => "INVALID_TENANT_HEADER",
            AppError::TenantAccessDenied => "TENANT_ACCESS_DENIED",
            AppError::MissingPermission(_) => "MISSING_PERMISSION",
            AppError::AdminOnly => "ADMIN_ONLY",
            AppError::BookNotFound => "BOOK_NOT_FOUND",
            AppError::CategoryNotFound => "CATEGORY_NOT_FOUND",
            AppError::StudentNotFound => "STUDENT_NOT_FOUND",
            AppError::IssueNotFound => "ISSUE_NOT_FOUND",
            AppError::NotificationNotFound => "NOTIFICATION_NOT_FOUND",
            AppError::AlreadyMember => "ALREADY_MEMBER",
            AppError::IsbnAlreadyExists(_) => "ISBN_ALREADY_EXISTS",
            AppError::CategoryNameAlreadyExists(_) => "CATEGORY_NAME_ALREADY_EXISTS",
            AppError::RollNumberAlreadyExists(_) => "ROLL_NUMBER_ALREADY_EXISTS",
            AppError::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            AppError::DuplicateBook => "DUPLICATE_BOOK",
            AppError::NoCopiesAvailable => "NO_COPIES_AVAILABLE",
            AppError::StudentInactive => "STUDENT_INACTIVE",
            AppError::BookHasActiveIssues => "BOOK_HAS_ACTIVE_ISSUES",
            AppError::InvalidCopyCount { .. } => "INVALID_COPY_COUNT",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingTenantHeader
            | AppError::InvalidTenantHeader => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,

            AppError::TenantAccessDenied
            | AppError::MissingPermission(_)
            | AppError::AdminOnly => StatusCode::FORBIDDEN,

            AppError::UserNotFound
            | AppError::BookNotFound
            | AppError::CategoryNotFound
            | AppError::StudentNotFound
            | AppError::IssueNotFound
            | AppError::NotificationNotFound => StatusCode::NOT_FOUND,

            AppError::EmailAlreadyExists
            | AppError::AlreadyMember
            | AppError::IsbnAlreadyExists(_)
            | AppError::CategoryNameAlreadyExists(_)
            | AppError::RollNumberAlreadyExists(_)
            | AppError::LimitExceeded { .. }
            | AppError::DuplicateBook
            | AppError::NoCopiesAvailable
            | AppError::StudentInactive
            | AppError::BookHasActiveIssues
            | AppError::InvalidCopyCount { .. } => StatusCode::CONFLICT,

            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Parâmetros interpolados nas mensagens do catálogo ("{limit}", "{isbn}"...)
    fn message_params(&self) -> Vec<(&'static str, String)> {
        match self {
            AppError::MissingPermission(slug) => vec![("permission", slug.to_string())],
            AppError::IsbnAlreadyExists(isbn) => vec![("isbn", isbn.clone())],
            AppError::CategoryNameAlreadyExists(name) => vec![("name", name.clone())],
            AppError::RollNumberAlreadyExists(roll) => vec![("rollNumber", roll.clone())],
            AppError::LimitExceeded { limit } => vec![("limit", limit.to_string())],
            AppError::InvalidCopyCount { outstanding } => {
                vec![("outstanding", outstanding.to_string())]
            }
            _ => Vec::new(),
        }
    }

    /// Converte o erro interno na resposta traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            // O detalhe real fica só no log; o cliente recebe a mensagem genérica.
            tracing::error!(error.code = code, error.message = %self, "Erro Interno do Servidor");
        }

        let error = store
            .translate(&locale.0, code, &self.message_params())
            .unwrap_or_else(|| self.to_string());

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            _ => None,
        };

        ApiError { status, code, error, details }
    }
}

// Sugestão B do projeto: devolver todos os detalhes da validação, campo a campo.
fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut details: HashMap<String, Vec<String>> = HashMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        details.insert(field.to_string(), messages);
    }
    json!(details)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.error,
            "code": self.code,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

// Handlers e middlewares que não têm o Locale à mão respondem em inglês.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), I18nStore::builtin())
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    fn locale(lang: &str) -> Locale {
        Locale(lang.to_string())
    }

    #[test]
    fn policy_violations_are_conflicts() {
        for err in [
            AppError::LimitExceeded { limit: 5 },
            AppError::DuplicateBook,
            AppError::NoCopiesAvailable,
            AppError::StudentInactive,
        ] {
            assert_eq!(err.status(), StatusCode::CONFLICT, "{err:?}");
        }
    }

    #[test]
    fn limit_exceeded_is_translated_with_limit() {
        let store = I18nStore::builtin();
        let err = AppError::LimitExceeded { limit: 5 };

        let en = err.to_api_error(&locale("en"), store);
        assert_eq!(en.code, "LIMIT_EXCEEDED");
        assert_eq!(en.error, "Student has reached the limit of 5 borrowed books.");

        let pt = err.to_api_error(&locale("pt"), store);
        assert_eq!(pt.error, "O aluno atingiu o limite de 5 livros emprestados.");
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let api = AppError::DuplicateBook.to_api_error(&locale("de"), I18nStore::builtin());
        assert_eq!(api.error, "Student already has this book issued.");
    }

    #[test]
    fn infrastructure_errors_hide_details() {
        let err = AppError::DatabaseError(sqlx::Error::RowNotFound);
        let api = err.to_api_error(&locale("en"), I18nStore::builtin());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.code, "INTERNAL_ERROR");
        assert_eq!(api.error, "An unexpected error occurred.");
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = validator::ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("Title is required.".into());
        errors.add("title", err);

        let api = AppError::ValidationError(errors).to_api_error(&locale("en"), I18nStore::builtin());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["title"][0], "Title is required.");
    }
}
