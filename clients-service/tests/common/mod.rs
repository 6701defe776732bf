//! Shared setup for clients-service integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use authz_core::config::JwtConfig;
use authz_core::models::{EntityType, PatOperation, PatReq, PolicyReq};
use authz_core::services::{
    ActionCatalog, Authorization, InMemoryRoleRepository, JwtAuthenticator, JwtService,
    MockPolicyEvaluator, PatScope, PolicyError,
};
use authz_core::Session;
use clients_service::models::NewClient;
use clients_service::operations::default_catalog;
use clients_service::services::InMemoryClientRepository;
use clients_service::startup::{Application, Dependencies};
use secrecy::Secret;
use std::sync::Arc;
use std::time::Duration;

pub const DOMAIN: &str = "d1";
pub const CREATOR: &str = "u1";

pub struct TestApp {
    pub evaluator: Arc<MockPolicyEvaluator>,
    pub clients_repo: Arc<InMemoryClientRepository>,
    pub roles_repo: Arc<InMemoryRoleRepository>,
    pub app: Application,
}

impl TestApp {
    pub fn new() -> Self {
        let evaluator = Arc::new(MockPolicyEvaluator::new());
        Self::build(evaluator.clone(), evaluator, Duration::from_secs(1), default_catalog())
    }

    pub fn with_catalog(catalog: ActionCatalog) -> Self {
        let evaluator = Arc::new(MockPolicyEvaluator::new());
        Self::build(evaluator.clone(), evaluator, Duration::from_secs(1), catalog)
    }

    /// Checks go to `authorizer`; policy writes still land in `evaluator`.
    pub fn with_evaluator(
        evaluator: Arc<MockPolicyEvaluator>,
        authorizer: Arc<dyn Authorization>,
        timeout: Duration,
    ) -> Self {
        Self::build(evaluator, authorizer, timeout, default_catalog())
    }

    fn build(
        evaluator: Arc<MockPolicyEvaluator>,
        authorizer: Arc<dyn Authorization>,
        timeout: Duration,
        catalog: ActionCatalog,
    ) -> Self {
        service_core::observability::init_test_tracing();

        let clients_repo = Arc::new(InMemoryClientRepository::new());
        let roles_repo = Arc::new(InMemoryRoleRepository::new());

        let app = Application::build(Dependencies {
            clients: clients_repo.clone(),
            authn: Arc::new(JwtAuthenticator::new(jwt())),
            roles: roles_repo.clone(),
            evaluator: authorizer,
            policy: evaluator.clone(),
            catalog,
            policy_timeout: timeout,
        })
        .expect("client pipelines");

        Self {
            evaluator,
            clients_repo,
            roles_repo,
            app,
        }
    }

    pub fn creator(&self) -> Session {
        self.evaluator
            .grant(&domain_user(CREATOR), "client_create", "domain", DOMAIN);
        self.evaluator
            .grant(&domain_user(CREATOR), "membership", "domain", DOMAIN);
        Session::scoped_to(CREATOR, DOMAIN)
    }

    pub fn pat_scope(&self, pat_id: &str, operation: PatOperation, entity_id: &str) {
        self.evaluator.add_pat_scope(
            pat_id,
            PatScope {
                user_id: CREATOR.to_string(),
                entity_type: EntityType::Clients,
                optional_domain_id: DOMAIN.to_string(),
                operation,
                entity_id: entity_id.to_string(),
            },
        );
    }
}

pub fn domain_user(user_id: &str) -> String {
    authz_core::models::encode_domain_user_id(DOMAIN, user_id)
}

pub fn new_client(id: &str) -> NewClient {
    NewClient {
        id: Some(id.to_string()),
        name: format!("client {}", id),
        ..Default::default()
    }
}

/// Evaluator that never answers in time.
pub struct StalledEvaluator;

#[async_trait]
impl Authorization for StalledEvaluator {
    async fn authorize(&self, _req: &PolicyReq) -> Result<(), PolicyError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }

    async fn authorize_pat(&self, _req: &PatReq) -> Result<(), PolicyError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }
}

pub fn jwt() -> JwtService {
    JwtService::new(&JwtConfig {
        secret: Secret::new("integration-test-secret".to_string()),
        issuer: "integration-tests".to_string(),
        session_expiry_minutes: 15,
        pat_expiry_days: 1,
    })
    .expect("jwt service")
}
