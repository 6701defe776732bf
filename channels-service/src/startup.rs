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

use crate::config::ChannelsConfig;
use crate::middleware::ChannelsAuthorization;
use crate::operations::{channel_external_permissions, channel_operation_permissions, default_catalog};
use crate::services::{ChannelRepository, ChannelsService, InMemoryChannelRepository};

const SERVICE_NAME: &str = "channels";

pub type ChannelsPipeline = LoggingMiddleware<ChannelsAuthorization<ChannelsService>>;
pub type ChannelRolesPipeline =
    LoggingMiddleware<AuthorizationMiddleware<ProvisionManageService, RoleOperation>>;

pub struct Dependencies {
    pub channels: Arc<dyn ChannelRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub authn: Arc<dyn Authentication>,
    pub evaluator: Arc<dyn Authorization>,
    pub policy: Arc<dyn PolicyService>,
    pub catalog: ActionCatalog,
    pub policy_timeout: Duration,
}

pub struct Application {
    pub authn: Arc<dyn Authentication>,
    pub channels: ChannelsPipeline,
    pub roles: ChannelRolesPipeline,
}

impl Application {
    pub fn build(deps: Dependencies) -> Result<Self, ServiceError> {
        let evaluator: Arc<dyn Authorization> =
            Arc::new(DeadlineAuthorization::new(deps.evaluator, deps.policy_timeout));
        let provisioner =
            ProvisionManageService::new(deps.roles, deps.policy.clone(), deps.catalog);

        let service = ChannelsService::new(
            deps.channels.clone(),
            deps.policy,
            Arc::new(provisioner.clone()),
        );
        let channels = AuthorizationMiddleware::new(
            service,
            evaluator.clone(),
            EntityType::Channels,
            channel_operation_permissions()?,
            channel_external_permissions()?,
        )?
        .with_repository(deps.channels);

        let roles = AuthorizationMiddleware::new(
            provisioner,
            evaluator,
            EntityType::Channels,
            role_operation_permissions()?,
            OperationPerm::new(),
        )?;

        tracing::info!(entity_type = %EntityType::Channels, "Channel pipelines assembled");

        Ok(Self {
            authn: deps.authn,
            channels: LoggingMiddleware::new(channels, SERVICE_NAME),
            roles: LoggingMiddleware::new(roles, SERVICE_NAME),
        })
    }

    pub fn in_memory(config: &ChannelsConfig) -> Result<Self, ServiceError> {
        let evaluator = Arc::new(MockPolicyEvaluator::new());
        let jwt = JwtService::new(&config.authz.jwt)?;
        let catalog = match config.actions_file.as_deref() {
            Some(path) => ActionCatalog::load(EntityType::Channels, path)?,
            None => default_catalog(),
        };

        Self::build(Dependencies {
            channels: Arc::new(InMemoryChannelRepository::new()),
            roles: Arc::new(InMemoryRoleRepository::new()),
            authn: Arc::new(JwtAuthenticator::new(jwt)),
            evaluator: evaluator.clone(),
            policy: evaluator,
            catalog,
            policy_timeout: config.authz.policy.timeout(),
        })
    }
}
