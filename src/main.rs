//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

use crate::config::{AppConfig, AppState};
use crate::services::overdue_reconciler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logger: RUST_LOG tem prioridade; sem ele, info para o app e o tower_http
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("library_backend=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = AppConfig::from_env()?;
    let app_state = AppState::new(config).await?;
    let bind_addr = app_state.config.bind_addr.clone();

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Tarefa de fundo: issued vencido -> overdue
    let reconciler = overdue_reconciler::spawn(
        app_state.circulation_service.clone(),
        app_state.config.overdue_sweep_interval,
    );

    let app = routes::build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    tracing::info!("📖 Documentação em http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reconciler.abort();
    tracing::info!("👋 Servidor encerrado");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao escutar o sinal de encerramento: {}", e);
        std::future::pending::<()>().await;
    }
}
