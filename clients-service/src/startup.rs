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

use crate::config::ClientsConfig;
use crate::middleware::ClientsAuthorization;
use crate::operations::{client_external_permissions, client_operation_permissions, default_catalog};
use crate::services::{ClientRepository, ClientsService, InMemoryClientRepository};

const SERVICE_NAME: &str = "clients";

pub type ClientsPipeline = LoggingMiddleware<ClientsAuthorization<ClientsService>>;
pub type ClientRolesPipeline =
    LoggingMiddleware<AuthorizationMiddleware<ProvisionManageService, RoleOperation>>;

/// Collaborators the client pipelines are assembled from.
pub struct Dependencies {
    pub clients: Arc<dyn ClientRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub authn: Arc<dyn Authentication>,
    pub evaluator: Arc<dyn Authorization>,
    pub policy: Arc<dyn PolicyService>,
    pub catalog: ActionCatalog,
    pub policy_timeout: Duration,
}

pub struct Application {
    pub authn: Arc<dyn Authentication>,
    pub clients: ClientsPipeline,
    pub roles: ClientRolesPipeline,
}

impl Application {
    pub fn build(deps: Dependencies) -> Result<Self, ServiceError> {
        let evaluator: Arc<dyn Authorization> =
            Arc::new(DeadlineAuthorization::new(deps.evaluator, deps.policy_timeout));
        let provisioner =
            ProvisionManageService::new(deps.roles, deps.policy.clone(), deps.catalog);

        let service = ClientsService::new(
            deps.clients.clone(),
            deps.policy,
            Arc::new(provisioner.clone()),
        );
        let clients = AuthorizationMiddleware::new(
            service,
            evaluator.clone(),
            EntityType::Clients,
            client_operation_permissions()?,
            client_external_permissions()?,
        )?
        .with_repository(deps.clients);

        let roles = AuthorizationMiddleware::new(
            provisioner,
            evaluator,
            EntityType::Clients,
            role_operation_permissions()?,
            OperationPerm::new(),
        )?;

        tracing::info!(entity_type = %EntityType::Clients, "Client pipelines assembled");

        Ok(Self {
            authn: deps.authn,
            clients: LoggingMiddleware::new(clients, SERVICE_NAME),
            roles: LoggingMiddleware::new(roles, SERVICE_NAME),
        })
    }

    /// Pipelines over in-memory stores and the in-process evaluator.
    pub fn in_memory(config: &ClientsConfig) -> Result<Self, ServiceError> {
        let evaluator = Arc::new(MockPolicyEvaluator::new());
        let jwt = JwtService::new(&config.authz.jwt)?;
        Self::build(Dependencies {
            clients: Arc::new(InMemoryClientRepository::new()),
            roles: Arc::new(InMemoryRoleRepository::new()),
            authn: Arc::new(JwtAuthenticator::new(jwt)),
            evaluator: evaluator.clone(),
            policy: evaluator,
            catalog: load_catalog(config)?,
            policy_timeout: config.authz.policy.timeout(),
        })
    }
}

pub fn load_catalog(config: &ClientsConfig) -> Result<ActionCatalog, ServiceError> {
    match config.actions_file.as_deref() {
        Some(path) => {
            tracing::info!(path = %path, "Loading client actions");
            ActionCatalog::load(EntityType::Clients, path)
        }
        None => Ok(default_catalog()),
    }
}
