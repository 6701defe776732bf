//! Service decorators.
//!
//! Pipelines are assembled once at startup as
//! `LoggingMiddleware(AuthorizationMiddleware(service))`.

pub mod authorization;
pub mod logging;
pub mod roles;

pub use authorization::AuthorizationMiddleware;
pub use logging::LoggingMiddleware;
pub use roles::{role_operation_permissions, RoleOperation, ROLE_ACTIONS};
