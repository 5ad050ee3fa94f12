pub mod auth;
pub mod catalog;
pub mod circulation;
pub mod dashboard;
pub mod notification;
pub mod student;
pub mod tenancy;
