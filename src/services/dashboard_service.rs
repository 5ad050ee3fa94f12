// src/services/dashboard_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::dashboard::LibrarySummary,
    services::circulation_service,
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn get_summary(&self, tenant_id: Uuid) -> Result<LibrarySummary, AppError> {
        self.repo
            .get_summary(tenant_id, circulation_service::today())
            .await
    }
}
