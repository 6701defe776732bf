//! Authorization and role-provisioning core shared by the entity services.

pub mod config;
pub mod middleware;
pub mod models;
pub mod services;

pub use models::Session;
pub use services::ServiceError;
