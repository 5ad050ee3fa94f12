pub mod auth;
pub mod catalog_service;
pub mod circulation_policy;
pub mod circulation_service;
pub mod dashboard_service;
pub mod notification_service;
pub mod overdue_reconciler;
pub mod student_service;
pub mod tenancy_service;
