// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{
        auth::{admin_guard, auth_guard},
        tenancy::tenant_guard,
    },
};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Só usuário autenticado (sem tenant)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let me_routes = Router::new()
        .route("/issues", get(handlers::circulation::list_my_issues))
        .route("/notifications", get(handlers::notifications::list_my_notifications))
        .route(
            "/notifications/{id}/read",
            patch(handlers::notifications::mark_notification_read),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let tenancy_routes = Router::new()
        .route(
            "/",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_my_tenants),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard))
        .merge(
            Router::new()
                .route(
                    "/members",
                    post(handlers::tenancy::add_member).get(handlers::tenancy::list_members),
                )
                .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard)),
        );

    // Daqui para baixo tudo exige X-Tenant-ID + vínculo
    let catalog_routes = Router::new()
        .route(
            "/categories",
            post(handlers::catalog::create_category).get(handlers::catalog::list_categories),
        )
        .route(
            "/categories/{id}",
            axum::routing::put(handlers::catalog::update_category)
                .delete(handlers::catalog::delete_category),
        )
        .route(
            "/books",
            post(handlers::catalog::create_book).get(handlers::catalog::list_books),
        )
        .route(
            "/books/{id}",
            get(handlers::catalog::get_book)
                .put(handlers::catalog::update_book)
                .delete(handlers::catalog::delete_book),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let student_routes = Router::new()
        .route(
            "/",
            post(handlers::students::create_student).get(handlers::students::list_students),
        )
        .route(
            "/{id}",
            get(handlers::students::get_student).put(handlers::students::update_student),
        )
        .route(
            "/{id}/notifications",
            get(handlers::students::list_student_notifications),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let circulation_routes = Router::new()
        .route(
            "/issues",
            post(handlers::circulation::issue_book).get(handlers::circulation::list_issues),
        )
        .route("/issues/{id}", get(handlers::circulation::get_issue))
        .route("/issues/{id}/return", post(handlers::circulation::return_book))
        .route("/overdue", get(handlers::circulation::get_overdue_books))
        .route(
            "/students/{id}/eligibility",
            get(handlers::circulation::check_eligibility),
        )
        .route(
            "/students/{id}/issues",
            get(handlers::circulation::list_student_issues),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let dashboard_routes = Router::new()
        .route("/summary", get(handlers::dashboard::get_summary))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let admin_routes = Router::new()
        .route("/tenants", get(handlers::admin::list_tenants_overview))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), admin_guard));

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/me", me_routes)
        .nest("/api/tenants", tenancy_routes)
        .nest("/api/catalog", catalog_routes)
        .nest("/api/students", student_routes)
        .nest("/api/circulation", circulation_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, middleware::tenancy::TenantContext, models::tenancy::MemberRole};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        middleware::Next,
    };
    use uuid::Uuid;
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;
    use tower::ServiceExt;

    // Pool preguiçoso: nenhuma destas rotas chega a tocar o banco
    fn test_state() -> AppState {
        let config = AppConfig {
            database_url: "postgres://localhost/library_test".to_string(),
            jwt_secret: "segredo-de-teste".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            max_connections: 1,
            overdue_sweep_interval: Duration::from_secs(60),
            admin_email: None,
        };
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy(&config.database_url)
            .expect("URL válida");
        AppState::with_pool(config, pool).expect("estado")
    }

    fn test_router() -> Router {
        build_router(test_state())
    }

    // Rota de devolução com o TenantContext já injetado (pula o tenant_guard)
    fn return_router() -> Router {
        let tenant = TenantContext {
            tenant_id: Uuid::new_v4(),
            role: MemberRole::Librarian,
        };
        Router::new()
            .route("/issues/{id}/return", post(handlers::circulation::return_book))
            .layer(axum_middleware::from_fn(
                move |mut req: Request<Body>, next: Next| async move {
                    req.extensions_mut().insert(tenant);
                    next.run(req).await
                },
            ))
            .with_state(test_state())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = test_router()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthorized() {
        let response = test_router()
            .oneshot(Request::get("/api/users/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn tenant_routes_require_the_tenant_header() {
        let response = test_router()
            .oneshot(
                Request::get("/api/circulation/overdue")
                    .header("authorization", "Bearer qualquer")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "MISSING_TENANT_HEADER");
    }

    #[tokio::test]
    async fn tenant_errors_follow_accept_language() {
        let response = test_router()
            .oneshot(
                Request::post("/api/circulation/issues")
                    .header("x-tenant-id", "nao-e-uuid")
                    .header("accept-language", "pt-BR")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "INVALID_TENANT_HEADER");

        let expected = crate::common::i18n::I18nStore::builtin()
            .translate("pt", "INVALID_TENANT_HEADER", &[])
            .unwrap();
        assert_eq!(body["error"], expected);
    }

    #[tokio::test]
    async fn admin_routes_require_a_token() {
        let response = test_router()
            .oneshot(Request::get("/api/admin/tenants").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn return_without_body_uses_the_default_fine() {
        let response = return_router()
            .oneshot(
                Request::post(format!("/issues/{}/return", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // Passou pela extração; sem banco, a falha vem do serviço
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn return_body_is_still_validated() {
        let response = return_router()
            .oneshot(
                Request::post(format!("/issues/{}/return", Uuid::new_v4()))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"fine": -1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}
