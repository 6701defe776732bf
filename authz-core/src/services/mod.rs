//! Authentication, policy contracts, registries and the role engine.

pub mod authn;
pub mod catalog;
pub mod error;
pub mod evaluator;
mod jwt;
pub mod operations;
pub mod policy;
pub mod roles;

pub use authn::{authenticate_request, extract_bearer_token, Authentication, DomainRequirement, JwtAuthenticator};
pub use catalog::ActionCatalog;
pub use error::ServiceError;
pub use evaluator::{MockPolicyEvaluator, PatScope};
pub use jwt::{JwtService, TokenClaims, TokenKind};
pub use operations::{NoOperation, Operation, OperationPerm, Permission};
pub use policy::{Authorization, DeadlineAuthorization, PolicyError, PolicyService};
pub use roles::{InMemoryRoleRepository, ProvisionManageService, RoleManager, RoleProvisioner, RoleRepository};
