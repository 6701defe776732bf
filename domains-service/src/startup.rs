use authz_core::middleware::{
    role_operation_permissions, AuthorizationMiddleware, LoggingMiddleware, RoleOperation,
};
use authz_core::models::EntityType;
use authz_core::services::{
    ActionCatalog, Authentication, Authorization, DeadlineAuthorization, InMemoryRoleRepository,
    JwtAuthenticator, JwtService, MockPolicyEvaluator, OperationPerm, PolicyService,
    ProvisionManageService, RoleRepository,
};
use authz_core::ServiceError;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DomainsConfig;
use crate::middleware::DomainsAuthorization;
use crate::operations::{default_catalog, domain_operation_permissions};
use crate::services::{DomainRepository, DomainsService, InMemoryDomainRepository};

const SERVICE_NAME: &str = "domains";

pub type DomainsPipeline = LoggingMiddleware<DomainsAuthorization<DomainsService>>;
pub type DomainRolesPipeline =
    LoggingMiddleware<AuthorizationMiddleware<ProvisionManageService, RoleOperation>>;

pub struct Dependencies {
    pub domains: Arc<dyn DomainRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub authn: Arc<dyn Authentication>,
    pub evaluator: Arc<dyn Authorization>,
    pub policy: Arc<dyn PolicyService>,
    pub catalog: ActionCatalog,
    pub policy_timeout: Duration,
}

pub struct Application {
    pub authn: Arc<dyn Authentication>,
    pub domains: DomainsPipeline,
    pub roles: DomainRolesPipeline,
}

impl Application {
    pub fn build(deps: Dependencies) -> Result<Self, ServiceError> {
        let evaluator: Arc<dyn Authorization> =
            Arc::new(DeadlineAuthorization::new(deps.evaluator, deps.policy_timeout));
        let provisioner = ProvisionManageService::new(deps.roles, deps.policy, deps.catalog);

        let service = DomainsService::new(deps.domains, Arc::new(provisioner.clone()));
        let domains = AuthorizationMiddleware::new(
            service,
            evaluator.clone(),
            EntityType::Domains,
            domain_operation_permissions()?,
            OperationPerm::new(),
        )?;

        let roles = AuthorizationMiddleware::new(
            provisioner,
            evaluator,
            EntityType::Domains,
            role_operation_permissions()?,
            OperationPerm::new(),
        )?;

        Ok(Self {
            authn: deps.authn,
            domains: LoggingMiddleware::new(domains, SERVICE_NAME),
            roles: LoggingMiddleware::new(roles, SERVICE_NAME),
        })
    }

    pub fn in_memory(config: &DomainsConfig) -> Result<Self, ServiceError> {
        let evaluator = Arc::new(MockPolicyEvaluator::new());
        let jwt = JwtService::new(&config.authz.jwt)?;
        let catalog = match config.actions_file.as_deref() {
            Some(path) => ActionCatalog::load(EntityType::Domains, path)?,
            None => default_catalog(),
        };

        Self::build(Dependencies {
            domains: Arc::new(InMemoryDomainRepository::new()),
            roles: Arc::new(InMemoryRoleRepository::new()),
            authn: Arc::new(JwtAuthenticator::new(jwt)),
            evaluator: evaluator.clone(),
            policy: evaluator,
            catalog,
            policy_timeout: config.authz.policy.timeout(),
        })
    }
}
