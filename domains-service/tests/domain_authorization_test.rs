mod common;

use authz_core::models::{EntityType, PageMeta, PatOperation, PolicyReq};
use authz_core::services::{Authorization, PatScope};
use authz_core::{ServiceError, Session};
use common::{new_domain, TestApp, ROOT};
use domains_service::models::DomainStatus;
use domains_service::services::DomainService;

#[tokio::test]
async fn test_creator_administers_new_domain() {
    let app = TestApp::new();
    app.app
        .domains
        .create_domain(&Session::new("u1"), new_domain("d1"))
        .await
        .unwrap();

    let owner = Session::scoped_to("u1", "d1");
    let domain = app.app.domains.retrieve_domain(&owner, "d1").await.unwrap();
    assert_eq!(domain.created_by, "u1");

    let stranger = Session::scoped_to("u2", "d1");
    let err = app
        .app
        .domains
        .retrieve_domain(&stranger, "d1")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "not authorized to retrieve domain");
}

#[tokio::test]
async fn test_domain_admin_may_create_entities_inside() {
    let app = TestApp::new();
    app.app
        .domains
        .create_domain(&Session::new("u1"), new_domain("d1"))
        .await
        .unwrap();

    let req = PolicyReq::permission("user", "d1:u1", "client_create", "domain", "d1");
    assert!(app.evaluator.authorize(&req).await.is_ok());
    let req = PolicyReq::permission("user", "d1:u2", "client_create", "domain", "d1");
    assert!(app.evaluator.authorize(&req).await.is_err());
}

#[tokio::test]
async fn test_freeze_is_platform_admin_only() {
    let app = TestApp::new();
    app.app
        .domains
        .create_domain(&Session::new("u1"), new_domain("d1"))
        .await
        .unwrap();
    app.evaluator.reset_calls();

    let owner = Session::scoped_to("u1", "d1");
    let err = app.app.domains.freeze_domain(&owner, "d1").await.unwrap_err();
    assert_eq!(err.to_string(), "not authorized to perform platform administration");
    let calls = app.evaluator.authorize_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].object_type, "platform");

    let root = Session::new(ROOT);
    let frozen = app.app.domains.freeze_domain(&root, "d1").await.unwrap();
    assert_eq!(frozen.status, DomainStatus::Frozen);

    let err = app.app.domains.enable_domain(&owner, "d1").await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // The platform admin still needs enable on the domain itself.
    let scoped_root = Session::scoped_to(ROOT, "d1");
    app.evaluator.grant("d1:root", "enable", "domain", "d1");
    let enabled = app
        .app
        .domains
        .enable_domain(&scoped_root, "d1")
        .await
        .unwrap();
    assert_eq!(enabled.status, DomainStatus::Enabled);
}

#[tokio::test]
async fn test_platform_admin_mutations_are_checked_per_domain() {
    let app = TestApp::new();
    app.app
        .domains
        .create_domain(&Session::new("u1"), new_domain("d1"))
        .await
        .unwrap();
    let owner = Session::scoped_to("u1", "d1");
    app.app.domains.disable_domain(&owner, "d1").await.unwrap();
    app.evaluator.reset_calls();

    let root = Session::scoped_to(ROOT, "d1");
    let err = app.app.domains.enable_domain(&root, "d1").await.unwrap_err();
    assert_eq!(err.to_string(), "not authorized to enable domain");
    let calls = app.evaluator.authorize_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].object, "d1");
    assert_eq!(calls[0].permission, "enable");

    let err = app.app.domains.disable_domain(&root, "d1").await.unwrap_err();
    assert!(err.is_denied());

    let domain = app.app.domains.retrieve_domain(&owner, "d1").await.unwrap();
    assert_eq!(domain.status, DomainStatus::Disabled);
}

#[tokio::test]
async fn test_unscoped_pat_cannot_create_or_list() {
    let app = TestApp::new();
    app.app
        .domains
        .create_domain(&Session::new("u9"), new_domain("d1"))
        .await
        .unwrap();

    let pat = Session::personal_access_token("u9", "pat-none");
    let err = app
        .app
        .domains
        .create_domain(&pat, new_domain("d2"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UnauthorizedPat(_)));
    assert!(!app.domains_repo.contains("d2"));

    let err = app
        .app
        .domains
        .list_domains(&pat, PageMeta::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UnauthorizedPat(_)));

    let calls = app.evaluator.pat_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].operation, PatOperation::Create);
    assert_eq!(calls[1].operation, PatOperation::List);
    assert!(calls.iter().all(|c| c.entity_id == "*"));
}

#[tokio::test]
async fn test_scoped_pat_lists_member_domains() {
    let app = TestApp::new();
    app.app
        .domains
        .create_domain(&Session::new("u9"), new_domain("d1"))
        .await
        .unwrap();
    app.evaluator.add_pat_scope(
        "pat-list",
        PatScope {
            user_id: "u9".to_string(),
            entity_type: EntityType::Domains,
            optional_domain_id: String::new(),
            operation: PatOperation::List,
            entity_id: "*".to_string(),
        },
    );

    let pat = Session::personal_access_token("u9", "pat-list");
    let page = app
        .app
        .domains
        .list_domains(&pat, PageMeta::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    // PAT sessions never take the platform-admin path.
    assert!(app
        .evaluator
        .authorize_calls()
        .iter()
        .all(|c| c.object_type != "platform"));
}

#[tokio::test]
async fn test_list_is_scoped_unless_platform_admin() {
    let app = TestApp::new();
    app.app
        .domains
        .create_domain(&Session::new("u1"), new_domain("d1"))
        .await
        .unwrap();
    app.app
        .domains
        .create_domain(&Session::new("u2"), new_domain("d2"))
        .await
        .unwrap();

    let page = app
        .app
        .domains
        .list_domains(&Session::new("u1"), PageMeta::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.domains[0].id, "d1");

    let page = app
        .app
        .domains
        .list_domains(&Session::new(ROOT), PageMeta::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn test_failed_provisioning_removes_domain() {
    let app = TestApp::new();
    app.evaluator.fail_writes_for("d1");

    let err = app
        .app
        .domains
        .create_domain(&Session::new("u1"), new_domain("d1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Rollback(_)));
    assert!(!app.domains_repo.contains("d1"));
}

#[tokio::test]
async fn test_disable_requires_permission() {
    let app = TestApp::new();
    app.app
        .domains
        .create_domain(&Session::new("u1"), new_domain("d1"))
        .await
        .unwrap();

    let member = Session::scoped_to("u2", "d1");
    let err = app.app.domains.disable_domain(&member, "d1").await.unwrap_err();
    assert!(err.is_denied());

    let owner = Session::scoped_to("u1", "d1");
    let domain = app.app.domains.disable_domain(&owner, "d1").await.unwrap();
    assert_eq!(domain.status, DomainStatus::Disabled);
}
