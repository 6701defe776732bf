use async_trait::async_trait;
use std::future::Future;
use std::time::Instant;

use crate::models::{MembersPage, NewRole, PageMeta, Role, RolePage, RoleProvision, Session};
use crate::services::roles::RoleManager;
use crate::services::ServiceError;

/// Outermost decorator: records every call with its outcome and duration.
pub struct LoggingMiddleware<S> {
    svc: S,
    service: &'static str,
}

impl<S> LoggingMiddleware<S> {
    pub fn new(svc: S, service: &'static str) -> Self {
        Self { svc, service }
    }

    pub fn inner(&self) -> &S {
        &self.svc
    }

    /// Await `fut` and log its outcome under `operation`.
    pub async fn logged<T, F>(
        &self,
        operation: &str,
        session: &Session,
        entity_id: &str,
        fut: F,
    ) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        let started = Instant::now();
        let result = fut.await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::info!(
                service = self.service,
                operation = %operation,
                user_id = %session.user_id(),
                domain_id = %session.domain_id(),
                entity_id = %entity_id,
                duration_ms,
                "Operation completed"
            ),
            Err(e) => tracing::warn!(
                service = self.service,
                operation = %operation,
                user_id = %session.user_id(),
                domain_id = %session.domain_id(),
                entity_id = %entity_id,
                duration_ms,
                error = %e,
                "Operation failed"
            ),
        }
        result
    }
}

#[async_trait]
impl<S: RoleManager> RoleManager for LoggingMiddleware<S> {
    async fn add_role(
        &self,
        session: &Session,
        entity_id: &str,
        new_role: NewRole,
    ) -> Result<RoleProvision, ServiceError> {
        self.logged("add_role", session, entity_id, self.svc.add_role(session, entity_id, new_role))
            .await
    }

    async fn remove_role(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<(), ServiceError> {
        self.logged(
            "remove_role",
            session,
            entity_id,
            self.svc.remove_role(session, entity_id, role_id),
        )
        .await
    }

    async fn update_role_name(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        new_name: &str,
    ) -> Result<Role, ServiceError> {
        self.logged(
            "update_role_name",
            session,
            entity_id,
            self.svc.update_role_name(session, entity_id, role_id, new_name),
        )
        .await
    }

    async fn retrieve_role(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<Role, ServiceError> {
        self.logged(
            "retrieve_role",
            session,
            entity_id,
            self.svc.retrieve_role(session, entity_id, role_id),
        )
        .await
    }

    async fn retrieve_all_roles(
        &self,
        session: &Session,
        entity_id: &str,
        page: PageMeta,
    ) -> Result<RolePage, ServiceError> {
        self.logged(
            "retrieve_all_roles",
            session,
            entity_id,
            self.svc.retrieve_all_roles(session, entity_id, page),
        )
        .await
    }

    async fn list_available_actions(&self, session: &Session) -> Result<Vec<String>, ServiceError> {
        self.logged(
            "list_available_actions",
            session,
            "",
            self.svc.list_available_actions(session),
        )
        .await
    }

    async fn role_add_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        actions: &[String],
    ) -> Result<Vec<String>, ServiceError> {
        self.logged(
            "role_add_actions",
            session,
            entity_id,
            self.svc.role_add_actions(session, entity_id, role_id, actions),
        )
        .await
    }

    async fn role_list_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<Vec<String>, ServiceError> {
        self.logged(
            "role_list_actions",
            session,
            entity_id,
            self.svc.role_list_actions(session, entity_id, role_id),
        )
        .await
    }

    async fn role_check_actions_exists(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        actions: &[String],
    ) -> Result<bool, ServiceError> {
        self.logged(
            "role_check_actions_exists",
            session,
            entity_id,
            self.svc
                .role_check_actions_exists(session, entity_id, role_id, actions),
        )
        .await
    }

    async fn role_remove_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        actions: &[String],
    ) -> Result<(), ServiceError> {
        self.logged(
            "role_remove_actions",
            session,
            entity_id,
            self.svc.role_remove_actions(session, entity_id, role_id, actions),
        )
        .await
    }

    async fn role_remove_all_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<(), ServiceError> {
        self.logged(
            "role_remove_all_actions",
            session,
            entity_id,
            self.svc.role_remove_all_actions(session, entity_id, role_id),
        )
        .await
    }

    async fn role_add_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        members: &[String],
    ) -> Result<Vec<String>, ServiceError> {
        self.logged(
            "role_add_members",
            session,
            entity_id,
            self.svc.role_add_members(session, entity_id, role_id, members),
        )
        .await
    }

    async fn role_list_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        page: PageMeta,
    ) -> Result<MembersPage, ServiceError> {
        self.logged(
            "role_list_members",
            session,
            entity_id,
            self.svc.role_list_members(session, entity_id, role_id, page),
        )
        .await
    }

    async fn role_check_members_exists(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        members: &[String],
    ) -> Result<bool, ServiceError> {
        self.logged(
            "role_check_members_exists",
            session,
            entity_id,
            self.svc
                .role_check_members_exists(session, entity_id, role_id, members),
        )
        .await
    }

    async fn role_remove_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        members: &[String],
    ) -> Result<(), ServiceError> {
        self.logged(
            "role_remove_members",
            session,
            entity_id,
            self.svc.role_remove_members(session, entity_id, role_id, members),
        )
        .await
    }

    async fn role_remove_all_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<(), ServiceError> {
        self.logged(
            "role_remove_all_members",
            session,
            entity_id,
            self.svc.role_remove_all_members(session, entity_id, role_id),
        )
        .await
    }
}
