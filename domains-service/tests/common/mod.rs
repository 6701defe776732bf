#![allow(dead_code)]

use authz_core::services::{InMemoryRoleRepository, MockPolicyEvaluator};
use domains_service::models::NewDomain;
use domains_service::operations::default_catalog;
use domains_service::services::InMemoryDomainRepository;
use domains_service::startup::{Application, Dependencies};
use authz_core::config::JwtConfig;
use authz_core::services::{JwtAuthenticator, JwtService};
use secrecy::Secret;
use std::sync::Arc;
use std::time::Duration;

pub const ROOT: &str = "root";

pub struct TestApp {
    pub evaluator: Arc<MockPolicyEvaluator>,
    pub domains_repo: Arc<InMemoryDomainRepository>,
    pub app: Application,
}

impl TestApp {
    pub fn new() -> Self {
        service_core::observability::init_test_tracing();

        let evaluator = Arc::new(MockPolicyEvaluator::new());
        evaluator.grant_platform_admin(ROOT);
        let domains_repo = Arc::new(InMemoryDomainRepository::new());

        let app = Application::build(Dependencies {
            domains: domains_repo.clone(),
            authn: Arc::new(JwtAuthenticator::new(jwt())),
            roles: Arc::new(InMemoryRoleRepository::new()),
            evaluator: evaluator.clone(),
            policy: evaluator.clone(),
            catalog: default_catalog(),
            policy_timeout: Duration::from_secs(1),
        })
        .expect("domain pipelines");

        Self {
            evaluator,
            domains_repo,
            app,
        }
    }
}

pub fn new_domain(id: &str) -> NewDomain {
    NewDomain {
        id: Some(id.to_string()),
        name: format!("domain {}", id),
        route: format!("route-{}", id),
        ..Default::default()
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
