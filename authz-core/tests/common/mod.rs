//! Shared setup for authz-core integration tests.

#![allow(dead_code)]

use authz_core::middleware::{
    role_operation_permissions, AuthorizationMiddleware, LoggingMiddleware, RoleOperation,
    ROLE_ACTIONS,
};
use authz_core::models::EntityType;
use authz_core::services::{
    ActionCatalog, InMemoryRoleRepository, MockPolicyEvaluator, OperationPerm, ProvisionManageService,
};
use std::sync::Arc;

pub const DOMAIN: &str = "d1";
pub const OWNER: &str = "owner";

pub type RolePipeline =
    LoggingMiddleware<AuthorizationMiddleware<ProvisionManageService, RoleOperation>>;

pub struct TestApp {
    pub evaluator: Arc<MockPolicyEvaluator>,
    pub repo: Arc<InMemoryRoleRepository>,
    pub provisioner: ProvisionManageService,
    pub roles: RolePipeline,
}

pub fn catalog() -> ActionCatalog {
    let mut actions = vec!["view", "edit", "delete"];
    actions.extend_from_slice(ROLE_ACTIONS);
    ActionCatalog::new(EntityType::Clients, &actions)
}

impl TestApp {
    pub fn new() -> Self {
        service_core::observability::init_test_tracing();

        let evaluator = Arc::new(MockPolicyEvaluator::new());
        let repo = Arc::new(InMemoryRoleRepository::new());
        let provisioner = ProvisionManageService::new(repo.clone(), evaluator.clone(), catalog());

        let authz = AuthorizationMiddleware::new(
            provisioner.clone(),
            evaluator.clone(),
            EntityType::Clients,
            role_operation_permissions().expect("role permissions"),
            OperationPerm::new(),
        )
        .expect("valid registries");

        Self {
            evaluator,
            repo,
            provisioner,
            roles: LoggingMiddleware::new(authz, "clients"),
        }
    }
}
