//! Shared setup for channels-service integration tests.

#![allow(dead_code)]

use authz_core::services::{InMemoryRoleRepository, MockPolicyEvaluator};
use authz_core::Session;
use channels_service::models::NewChannel;
use channels_service::operations::default_catalog;
use channels_service::services::InMemoryChannelRepository;
use channels_service::startup::{Application, Dependencies};
use authz_core::config::JwtConfig;
use authz_core::services::{JwtAuthenticator, JwtService};
use secrecy::Secret;
use std::sync::Arc;
use std::time::Duration;

pub const DOMAIN: &str = "dom1";
pub const OWNER: &str = "u1";

pub struct TestApp {
    pub evaluator: Arc<MockPolicyEvaluator>,
    pub channels_repo: Arc<InMemoryChannelRepository>,
    pub roles_repo: Arc<InMemoryRoleRepository>,
    pub app: Application,
}

impl TestApp {
    pub fn new() -> Self {
        service_core::observability::init_test_tracing();

        let evaluator = Arc::new(MockPolicyEvaluator::new());
        let channels_repo = Arc::new(InMemoryChannelRepository::new());
        let roles_repo = Arc::new(InMemoryRoleRepository::new());

        let app = Application::build(Dependencies {
            channels: channels_repo.clone(),
            authn: Arc::new(JwtAuthenticator::new(jwt())),
            roles: roles_repo.clone(),
            evaluator: evaluator.clone(),
            policy: evaluator.clone(),
            catalog: default_catalog(),
            policy_timeout: Duration::from_secs(1),
        })
        .expect("channel pipelines");

        Self {
            evaluator,
            channels_repo,
            roles_repo,
            app,
        }
    }

    /// Session allowed to create and list channels in the test domain.
    pub fn owner(&self) -> Session {
        let subject = domain_user(OWNER);
        self.evaluator
            .grant(&subject, "channel_create", "domain", DOMAIN);
        self.evaluator.grant(&subject, "membership", "domain", DOMAIN);
        Session::scoped_to(OWNER, DOMAIN)
    }
}

pub fn domain_user(user_id: &str) -> String {
    authz_core::models::encode_domain_user_id(DOMAIN, user_id)
}

pub fn new_channel(id: &str) -> NewChannel {
    NewChannel {
        id: Some(id.to_string()),
        name: format!("channel {}", id),
        ..Default::default()
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
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
