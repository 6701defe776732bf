//! Generic authorization decorator.
//!
//! One struct serves every entity service. Each entity crate implements its
//! service trait for `AuthorizationMiddleware<its service, its operations, ..>`
//! and calls [`AuthorizationMiddleware::authorize`] /
//! [`AuthorizationMiddleware::authorize_external`] before delegating.

use std::sync::Arc;

use crate::models::policy::{ADMIN_PERMISSION, ANY_IDS, PLATFORM_OBJECT, USERS_KIND, USER_TYPE};
use crate::models::{EntityType, PatOperation, PatReq, PolicyReq, Session};
use crate::services::operations::{NoOperation, Operation, OperationPerm, Permission};
use crate::services::policy::{Authorization, PolicyError};
use crate::services::ServiceError;

const PLATFORM_ADMIN_ACTION: &str = "perform platform administration";

pub struct AuthorizationMiddleware<S, Op: Operation, Ext: Operation = NoOperation, R = ()> {
    svc: S,
    evaluator: Arc<dyn Authorization>,
    entity_type: EntityType,
    ops: OperationPerm<Op>,
    ext_ops: OperationPerm<Ext>,
    repo: R,
}

impl<S, Op: Operation, Ext: Operation> AuthorizationMiddleware<S, Op, Ext, ()> {
    /// Wrap `svc`. Both registries are validated here, so an operation
    /// without a permission fails construction instead of a request.
    pub fn new(
        svc: S,
        evaluator: Arc<dyn Authorization>,
        entity_type: EntityType,
        ops: OperationPerm<Op>,
        ext_ops: OperationPerm<Ext>,
    ) -> Result<Self, ServiceError> {
        ops.validate()?;
        ext_ops.validate()?;

        Ok(Self {
            svc,
            evaluator,
            entity_type,
            ops,
            ext_ops,
            repo: (),
        })
    }
}

impl<S, Op: Operation, Ext: Operation, R> AuthorizationMiddleware<S, Op, Ext, R> {
    /// Attach the repository used for pre-authorization lookups.
    pub fn with_repository<R2>(self, repo: R2) -> AuthorizationMiddleware<S, Op, Ext, R2> {
        AuthorizationMiddleware {
            svc: self.svc,
            evaluator: self.evaluator,
            entity_type: self.entity_type,
            ops: self.ops,
            ext_ops: self.ext_ops,
            repo,
        }
    }

    pub fn inner(&self) -> &S {
        &self.svc
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Check `op` against an entity of this service's own type.
    pub async fn authorize(
        &self,
        session: &Session,
        op: Op,
        entity_id: &str,
    ) -> Result<(), ServiceError> {
        let permission = self.ops.get_permission(op)?;
        let pat = op.pat_operation().map(|pat_op| {
            let target = match pat_op {
                PatOperation::Create | PatOperation::List => ANY_IDS,
                _ => entity_id,
            };
            (pat_op, target)
        });

        self.check(
            session,
            &op.to_string(),
            permission,
            self.entity_type,
            entity_id,
            pat,
        )
        .await
    }

    /// Check `op` against an object owned by another entity type.
    pub async fn authorize_external(
        &self,
        session: &Session,
        op: Ext,
        object_type: EntityType,
        object_id: &str,
    ) -> Result<(), ServiceError> {
        let permission = self.ext_ops.get_permission(op)?;
        let pat = op.pat_operation().map(|pat_op| (pat_op, ANY_IDS));

        self.check(
            session,
            &op.to_string(),
            permission,
            object_type,
            object_id,
            pat,
        )
        .await
    }

    /// Platform-admin check. Returns the session marked as super-admin.
    ///
    /// A session that is already marked is returned without another
    /// evaluator call.
    pub async fn check_super_admin(&self, session: &Session) -> Result<Session, ServiceError> {
        if session.is_super_admin() {
            return Ok(session.clone());
        }

        let req = PolicyReq::permission(
            USER_TYPE,
            session.user_id(),
            ADMIN_PERMISSION,
            EntityType::Platform.policy_type(),
            PLATFORM_OBJECT,
        )
        .with_subject_kind(USERS_KIND);

        match self.evaluator.authorize(&req).await {
            Ok(()) => {
                tracing::debug!(user_id = %session.user_id(), "Session elevated to super-admin");
                Ok(session.as_super_admin())
            }
            Err(PolicyError::Timeout) => Err(ServiceError::Timeout),
            Err(e) => Err(ServiceError::authorization(PLATFORM_ADMIN_ACTION, e)),
        }
    }

    /// PAT scope check alone, for calls that have no object to check yet.
    /// Sessions that are not PAT-backed pass unchanged.
    pub async fn authorize_pat_only(
        &self,
        session: &Session,
        operation: PatOperation,
        entity_id: &str,
    ) -> Result<(), ServiceError> {
        self.check_pat(session, &operation.to_string(), operation, entity_id)
            .await
    }

    async fn check_pat(
        &self,
        session: &Session,
        action: &str,
        operation: PatOperation,
        entity_id: &str,
    ) -> Result<(), ServiceError> {
        let Some(pat_id) = session.pat_id() else {
            return Ok(());
        };

        let pat_req = PatReq {
            user_id: session.user_id().to_string(),
            pat_id: pat_id.to_string(),
            entity_type: self.entity_type,
            optional_domain_id: session.domain_id().to_string(),
            operation,
            entity_id: entity_id.to_string(),
        };

        match self.evaluator.authorize_pat(&pat_req).await {
            Ok(()) => Ok(()),
            Err(PolicyError::Timeout) => Err(ServiceError::Timeout),
            Err(e) => {
                tracing::warn!(
                    user_id = %session.user_id(),
                    pat_id = %pat_id,
                    action = %action,
                    entity_id = %entity_id,
                    "PAT scope check denied"
                );
                Err(ServiceError::UnauthorizedPat(e))
            }
        }
    }

    async fn check(
        &self,
        session: &Session,
        action: &str,
        permission: &Permission,
        object_type: EntityType,
        object: &str,
        pat: Option<(PatOperation, &str)>,
    ) -> Result<(), ServiceError> {
        if let Some((operation, entity_id)) = pat {
            self.check_pat(session, action, operation, entity_id).await?;
        }

        if session.domain_user_id().is_empty() {
            return Err(ServiceError::MissingDomain);
        }

        let req = PolicyReq::permission(
            USER_TYPE,
            session.domain_user_id(),
            permission.as_str(),
            object_type.policy_type(),
            object,
        )
        .with_domain(session.domain_id())
        .with_subject_kind(USERS_KIND);

        match self.evaluator.authorize(&req).await {
            Ok(()) => Ok(()),
            Err(PolicyError::Timeout) => Err(ServiceError::Timeout),
            Err(e) => {
                tracing::warn!(
                    user_id = %session.user_id(),
                    domain_id = %session.domain_id(),
                    action = %action,
                    permission = %permission,
                    object = %object,
                    "Authorization denied"
                );
                Err(ServiceError::authorization(action, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::evaluator::{MockPolicyEvaluator, PatScope};
    use std::fmt;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum WidgetOp {
        View,
        Create,
    }

    impl fmt::Display for WidgetOp {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                WidgetOp::View => f.write_str("view widget"),
                WidgetOp::Create => f.write_str("create widget"),
            }
        }
    }

    impl Operation for WidgetOp {
        const ALL: &'static [Self] = &[WidgetOp::View, WidgetOp::Create];

        fn pat_operation(&self) -> Option<PatOperation> {
            match self {
                WidgetOp::View => Some(PatOperation::Read),
                WidgetOp::Create => Some(PatOperation::Create),
            }
        }
    }

    fn perms() -> OperationPerm<WidgetOp> {
        let mut perms = OperationPerm::new();
        perms
            .add_operation_permission_map([
                (WidgetOp::View, Permission::from("view")),
                (WidgetOp::Create, Permission::from("create")),
            ])
            .unwrap();
        perms
    }

    fn middleware(
        evaluator: Arc<MockPolicyEvaluator>,
    ) -> AuthorizationMiddleware<(), WidgetOp> {
        AuthorizationMiddleware::new((), evaluator, EntityType::Clients, perms(), OperationPerm::new())
            .unwrap()
    }

    #[test]
    fn test_construction_fails_on_unmapped_operation() {
        let mut partial = OperationPerm::new();
        partial
            .add_operation_permission_map([(WidgetOp::View, Permission::from("view"))])
            .unwrap();
        let result = AuthorizationMiddleware::<(), WidgetOp>::new(
            (),
            Arc::new(MockPolicyEvaluator::new()),
            EntityType::Clients,
            partial,
            OperationPerm::new(),
        );
        assert!(matches!(result, Err(ServiceError::UnmappedOperation(_))));
    }

    #[tokio::test]
    async fn test_subject_is_domain_user_id() {
        let evaluator = Arc::new(MockPolicyEvaluator::new());
        evaluator.grant("d1:u1", "view", "client", "w1");
        let mw = middleware(evaluator.clone());

        let session = Session::scoped_to("u1", "d1");
        mw.authorize(&session, WidgetOp::View, "w1").await.unwrap();

        let calls = evaluator.authorize_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].subject, "d1:u1");
        assert_eq!(calls[0].domain, "d1");
        assert_eq!(calls[0].permission, "view");
        assert_eq!(calls[0].object_type, "client");
    }

    #[tokio::test]
    async fn test_missing_domain_never_reaches_evaluator() {
        let evaluator = Arc::new(MockPolicyEvaluator::new());
        let mw = middleware(evaluator.clone());

        let result = mw.authorize(&Session::new("u1"), WidgetOp::View, "w1").await;
        assert!(matches!(result, Err(ServiceError::MissingDomain)));
        assert!(evaluator.authorize_calls().is_empty());
    }

    #[tokio::test]
    async fn test_pat_create_uses_wildcard_entity() {
        let evaluator = Arc::new(MockPolicyEvaluator::new());
        evaluator.add_pat_scope(
            "pat-1",
            PatScope {
                user_id: "u1".to_string(),
                entity_type: EntityType::Clients,
                optional_domain_id: "d1".to_string(),
                operation: PatOperation::Create,
                entity_id: ANY_IDS.to_string(),
            },
        );
        evaluator.grant("d1:u1", "create", "client", "w-new");
        let mw = middleware(evaluator.clone());

        let session = Session::personal_access_token("u1", "pat-1").with_domain("d1");
        mw.authorize(&session, WidgetOp::Create, "w-new").await.unwrap();
        assert_eq!(evaluator.pat_calls()[0].entity_id, ANY_IDS);
    }

    #[tokio::test]
    async fn test_super_admin_check_short_circuits_when_marked() {
        let evaluator = Arc::new(MockPolicyEvaluator::new());
        evaluator.grant_platform_admin("root");
        let mw = middleware(evaluator.clone());

        let session = Session::scoped_to("root", "d1");
        let elevated = mw.check_super_admin(&session).await.unwrap();
        assert!(elevated.is_super_admin());
        assert_eq!(evaluator.authorize_calls()[0].subject, "root");

        mw.check_super_admin(&elevated).await.unwrap();
        assert_eq!(evaluator.authorize_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_non_admin_super_admin_check_is_denied() {
        let evaluator = Arc::new(MockPolicyEvaluator::new());
        let mw = middleware(evaluator);

        let result = mw.check_super_admin(&Session::scoped_to("u1", "d1")).await;
        assert!(matches!(result, Err(ServiceError::Authorization { .. })));
    }

    #[tokio::test]
    async fn test_pat_only_check_consults_scope() {
        let evaluator = Arc::new(MockPolicyEvaluator::new());
        let mw = middleware(evaluator.clone());

        let plain = Session::new("u1");
        mw.authorize_pat_only(&plain, PatOperation::Create, ANY_IDS)
            .await
            .unwrap();
        assert!(evaluator.pat_calls().is_empty());

        let pat = Session::personal_access_token("u1", "pat-1");
        let err = mw
            .authorize_pat_only(&pat, PatOperation::Create, ANY_IDS)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnauthorizedPat(_)));

        evaluator.add_pat_scope(
            "pat-1",
            PatScope {
                user_id: "u1".to_string(),
                entity_type: EntityType::Clients,
                optional_domain_id: String::new(),
                operation: PatOperation::Create,
                entity_id: ANY_IDS.to_string(),
            },
        );
        mw.authorize_pat_only(&pat, PatOperation::Create, ANY_IDS)
            .await
            .unwrap();

        let calls = evaluator.pat_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].entity_id, ANY_IDS);
        assert!(evaluator.authorize_calls().is_empty());
    }
}
