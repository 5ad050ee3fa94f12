// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users / Me ---
        handlers::auth::get_me,
        handlers::circulation::list_my_issues,
        handlers::notifications::list_my_notifications,
        handlers::notifications::mark_notification_read,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_my_tenants,
        handlers::tenancy::add_member,
        handlers::tenancy::list_members,

        // --- Catalog ---
        handlers::catalog::create_category,
        handlers::catalog::list_categories,
        handlers::catalog::update_category,
        handlers::catalog::delete_category,
        handlers::catalog::create_book,
        handlers::catalog::list_books,
        handlers::catalog::get_book,
        handlers::catalog::update_book,
        handlers::catalog::delete_book,

        // --- Students ---
        handlers::students::create_student,
        handlers::students::list_students,
        handlers::students::get_student,
        handlers::students::update_student,
        handlers::students::list_student_notifications,

        // --- Circulation ---
        handlers::circulation::issue_book,
        handlers::circulation::return_book,
        handlers::circulation::list_issues,
        handlers::circulation::get_issue,
        handlers::circulation::get_overdue_books,
        handlers::circulation::check_eligibility,
        handlers::circulation::list_student_issues,

        // --- Dashboard ---
        handlers::dashboard::get_summary,

        // --- Admin ---
        handlers::admin::list_tenants_overview,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Tenancy ---
            models::tenancy::TenantKind,
            models::tenancy::MemberRole,
            models::tenancy::Tenant,
            models::tenancy::TenantMember,
            models::tenancy::MemberDetail,
            models::tenancy::MyTenant,
            models::tenancy::TenantOverview,
            handlers::tenancy::CreateTenantPayload,
            handlers::tenancy::AddMemberPayload,

            // --- Catalog ---
            models::catalog::BookCategory,
            models::catalog::Book,
            handlers::catalog::CategoryPayload,
            handlers::catalog::BookPayload,

            // --- Students ---
            models::student::Student,
            handlers::students::StudentPayload,

            // --- Circulation ---
            models::circulation::IssueStatus,
            models::circulation::BookIssue,
            models::circulation::IssueDetail,
            models::circulation::BorrowingEligibility,
            handlers::circulation::IssueBookPayload,
            handlers::circulation::ReturnBookPayload,

            // --- Notifications / Dashboard ---
            models::notification::Notification,
            models::dashboard::LibrarySummary,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Me", description = "Área do aluno logado (empréstimos e notificações)"),
        (name = "Tenancy", description = "Instituições, bibliotecas privadas e membros"),
        (name = "Catalog", description = "Acervo: livros e categorias"),
        (name = "Students", description = "Cadastro de alunos"),
        (name = "Circulation", description = "Empréstimos, devoluções, atrasos e multas"),
        (name = "Dashboard", description = "Indicadores da biblioteca"),
        (name = "Admin", description = "Visão global do administrador")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_circulation_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/circulation/issues",
            "/api/circulation/issues/{id}/return",
            "/api/circulation/overdue",
            "/api/circulation/students/{id}/eligibility",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
