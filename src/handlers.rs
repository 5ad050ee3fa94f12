pub mod admin;
pub mod auth;
pub mod catalog;
pub mod circulation;
pub mod dashboard;
pub mod notifications;
pub mod students;
pub mod tenancy;
