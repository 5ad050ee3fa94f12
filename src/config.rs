// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    common::i18n::I18nStore,
    db::{
        CatalogRepository, CirculationRepository, DashboardRepository, NotificationRepository,
        StudentRepository, TenantRepository, UserRepository,
    },
    services::{
        auth::AuthService, catalog_service::CatalogService,
        circulation_service::CirculationService, dashboard_service::DashboardService,
        notification_service::NotificationService, student_service::StudentService,
        tenancy_service::TenantService,
    },
};

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub overdue_sweep_interval: Duration,
    pub admin_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL deve ser definida"))?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET deve ser definido"))?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 5)?;
        let sweep_secs: u64 = parse_var("OVERDUE_SWEEP_INTERVAL_SECS", 60)?;
        let admin_email = env::var("ADMIN_EMAIL")
            .ok()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            max_connections,
            overdue_sweep_interval: Duration::from_secs(sweep_secs.max(1)),
            admin_email,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{} tem um valor inválido: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub catalog_service: CatalogService,
    pub student_service: StudentService,
    pub circulation_service: CirculationService,
    pub notification_service: NotificationService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::with_pool(config, db_pool)
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(config: AppConfig, db_pool: PgPool) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);
        tracing::debug!(
            "Idiomas carregados: {}",
            i18n_store.languages().collect::<Vec<_>>().join(", ")
        );

        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new();
        let student_repo = StudentRepository::new();
        let circulation_repo = CirculationRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new();
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let notification_service = NotificationService::new(notification_repo, db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            student_repo.clone(),
            config.jwt_secret.clone(),
            config.admin_email.clone(),
            db_pool.clone(),
        );
        let tenant_service = TenantService::new(tenant_repo, user_repo.clone(), db_pool.clone());
        let catalog_service = CatalogService::new(catalog_repo.clone());
        let student_service = StudentService::new(student_repo.clone(), user_repo);
        let circulation_service = CirculationService::new(
            circulation_repo,
            catalog_repo,
            student_repo,
            notification_service.clone(),
        );
        let dashboard_service = DashboardService::new(dashboard_repo);

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store,
            auth_service,
            tenant_service,
            catalog_service,
            student_service,
            circulation_service,
            notification_service,
            dashboard_service,
        })
    }
}
