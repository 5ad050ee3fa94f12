pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod student_repo;
pub use student_repo::StudentRepository;
pub mod circulation_repo;
pub use circulation_repo::CirculationRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
