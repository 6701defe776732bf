//! Authorization of role management, shared by every entity type.

use async_trait::async_trait;
use std::fmt;

use super::authorization::AuthorizationMiddleware;
use crate::models::policy::ANY_IDS;
use crate::models::{MembersPage, NewRole, PageMeta, PatOperation, Role, RolePage, RoleProvision, Session};
use crate::services::operations::{Operation, OperationPerm, Permission};
use crate::services::roles::RoleManager;
use crate::services::ServiceError;

pub const MANAGE_ROLE_PERMISSION: &str = "manage_role";
pub const ADD_ROLE_USERS_PERMISSION: &str = "add_role_users";
pub const REMOVE_ROLE_USERS_PERMISSION: &str = "remove_role_users";
pub const VIEW_ROLE_USERS_PERMISSION: &str = "view_role_users";

/// Role actions every entity catalog must contain.
pub const ROLE_ACTIONS: &[&str] = &[
    MANAGE_ROLE_PERMISSION,
    ADD_ROLE_USERS_PERMISSION,
    REMOVE_ROLE_USERS_PERMISSION,
    VIEW_ROLE_USERS_PERMISSION,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleOperation {
    AddRole,
    RemoveRole,
    UpdateRoleName,
    RetrieveRole,
    RetrieveAllRoles,
    RoleAddActions,
    RoleListActions,
    RoleCheckActionsExists,
    RoleRemoveActions,
    RoleRemoveAllActions,
    RoleAddMembers,
    RoleListMembers,
    RoleCheckMembersExists,
    RoleRemoveMembers,
    RoleRemoveAllMembers,
}

impl fmt::Display for RoleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RoleOperation::AddRole => "add role",
            RoleOperation::RemoveRole => "remove role",
            RoleOperation::UpdateRoleName => "update role name",
            RoleOperation::RetrieveRole => "view role",
            RoleOperation::RetrieveAllRoles => "list roles",
            RoleOperation::RoleAddActions => "add role actions",
            RoleOperation::RoleListActions => "list role actions",
            RoleOperation::RoleCheckActionsExists => "check role actions",
            RoleOperation::RoleRemoveActions => "remove role actions",
            RoleOperation::RoleRemoveAllActions => "remove all role actions",
            RoleOperation::RoleAddMembers => "add role members",
            RoleOperation::RoleListMembers => "list role members",
            RoleOperation::RoleCheckMembersExists => "check role members",
            RoleOperation::RoleRemoveMembers => "remove role members",
            RoleOperation::RoleRemoveAllMembers => "remove all role members",
        };
        f.write_str(label)
    }
}

impl Operation for RoleOperation {
    const ALL: &'static [Self] = &[
        RoleOperation::AddRole,
        RoleOperation::RemoveRole,
        RoleOperation::UpdateRoleName,
        RoleOperation::RetrieveRole,
        RoleOperation::RetrieveAllRoles,
        RoleOperation::RoleAddActions,
        RoleOperation::RoleListActions,
        RoleOperation::RoleCheckActionsExists,
        RoleOperation::RoleRemoveActions,
        RoleOperation::RoleRemoveAllActions,
        RoleOperation::RoleAddMembers,
        RoleOperation::RoleListMembers,
        RoleOperation::RoleCheckMembersExists,
        RoleOperation::RoleRemoveMembers,
        RoleOperation::RoleRemoveAllMembers,
    ];

    fn pat_operation(&self) -> Option<PatOperation> {
        let op = match self {
            RoleOperation::RetrieveRole
            | RoleOperation::RetrieveAllRoles
            | RoleOperation::RoleListActions
            | RoleOperation::RoleCheckActionsExists
            | RoleOperation::RoleListMembers
            | RoleOperation::RoleCheckMembersExists => PatOperation::Read,
            _ => PatOperation::Update,
        };
        Some(op)
    }
}

/// Default role operation permissions.
pub fn role_operation_permissions() -> Result<OperationPerm<RoleOperation>, ServiceError> {
    use RoleOperation::*;

    let mut perms = OperationPerm::new();
    perms.add_operation_permission_map(
        [
            (AddRole, MANAGE_ROLE_PERMISSION),
            (RemoveRole, MANAGE_ROLE_PERMISSION),
            (UpdateRoleName, MANAGE_ROLE_PERMISSION),
            (RetrieveRole, MANAGE_ROLE_PERMISSION),
            (RetrieveAllRoles, MANAGE_ROLE_PERMISSION),
            (RoleAddActions, MANAGE_ROLE_PERMISSION),
            (RoleListActions, MANAGE_ROLE_PERMISSION),
            (RoleCheckActionsExists, MANAGE_ROLE_PERMISSION),
            (RoleRemoveActions, MANAGE_ROLE_PERMISSION),
            (RoleRemoveAllActions, MANAGE_ROLE_PERMISSION),
            (RoleAddMembers, ADD_ROLE_USERS_PERMISSION),
            (RoleListMembers, VIEW_ROLE_USERS_PERMISSION),
            (RoleCheckMembersExists, VIEW_ROLE_USERS_PERMISSION),
            (RoleRemoveMembers, REMOVE_ROLE_USERS_PERMISSION),
            (RoleRemoveAllMembers, REMOVE_ROLE_USERS_PERMISSION),
        ]
        .into_iter()
        .map(|(op, perm)| (op, Permission::from(perm))),
    )?;
    Ok(perms)
}

#[async_trait]
impl<S, Ext, R> RoleManager for AuthorizationMiddleware<S, RoleOperation, Ext, R>
where
    S: RoleManager,
    Ext: Operation,
    R: Send + Sync,
{
    async fn add_role(
        &self,
        session: &Session,
        entity_id: &str,
        new_role: NewRole,
    ) -> Result<RoleProvision, ServiceError> {
        self.authorize(session, RoleOperation::AddRole, entity_id).await?;
        self.inner().add_role(session, entity_id, new_role).await
    }

    async fn remove_role(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<(), ServiceError> {
        self.authorize(session, RoleOperation::RemoveRole, entity_id).await?;
        self.inner().remove_role(session, entity_id, role_id).await
    }

    async fn update_role_name(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        new_name: &str,
    ) -> Result<Role, ServiceError> {
        self.authorize(session, RoleOperation::UpdateRoleName, entity_id)
            .await?;
        self.inner()
            .update_role_name(session, entity_id, role_id, new_name)
            .await
    }

    async fn retrieve_role(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<Role, ServiceError> {
        self.authorize(session, RoleOperation::RetrieveRole, entity_id)
            .await?;
        self.inner().retrieve_role(session, entity_id, role_id).await
    }

    async fn retrieve_all_roles(
        &self,
        session: &Session,
        entity_id: &str,
        page: PageMeta,
    ) -> Result<RolePage, ServiceError> {
        self.authorize(session, RoleOperation::RetrieveAllRoles, entity_id)
            .await?;
        self.inner().retrieve_all_roles(session, entity_id, page).await
    }

    async fn list_available_actions(&self, session: &Session) -> Result<Vec<String>, ServiceError> {
        self.authorize_pat_only(session, PatOperation::Read, ANY_IDS)
            .await?;
        self.inner().list_available_actions(session).await
    }

    async fn role_add_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        actions: &[String],
    ) -> Result<Vec<String>, ServiceError> {
        self.authorize(session, RoleOperation::RoleAddActions, entity_id)
            .await?;
        self.inner()
            .role_add_actions(session, entity_id, role_id, actions)
            .await
    }

    async fn role_list_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<Vec<String>, ServiceError> {
        self.authorize(session, RoleOperation::RoleListActions, entity_id)
            .await?;
        self.inner()
            .role_list_actions(session, entity_id, role_id)
            .await
    }

    async fn role_check_actions_exists(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        actions: &[String],
    ) -> Result<bool, ServiceError> {
        self.authorize(session, RoleOperation::RoleCheckActionsExists, entity_id)
            .await?;
        self.inner()
            .role_check_actions_exists(session, entity_id, role_id, actions)
            .await
    }

    async fn role_remove_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        actions: &[String],
    ) -> Result<(), ServiceError> {
        self.authorize(session, RoleOperation::RoleRemoveActions, entity_id)
            .await?;
        self.inner()
            .role_remove_actions(session, entity_id, role_id, actions)
            .await
    }

    async fn role_remove_all_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<(), ServiceError> {
        self.authorize(session, RoleOperation::RoleRemoveAllActions, entity_id)
            .await?;
        self.inner()
            .role_remove_all_actions(session, entity_id, role_id)
            .await
    }

    async fn role_add_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        members: &[String],
    ) -> Result<Vec<String>, ServiceError> {
        self.authorize(session, RoleOperation::RoleAddMembers, entity_id)
            .await?;
        self.inner()
            .role_add_members(session, entity_id, role_id, members)
            .await
    }

    async fn role_list_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        page: PageMeta,
    ) -> Result<MembersPage, ServiceError> {
        self.authorize(session, RoleOperation::RoleListMembers, entity_id)
            .await?;
        self.inner()
            .role_list_members(session, entity_id, role_id, page)
            .await
    }

    async fn role_check_members_exists(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        members: &[String],
    ) -> Result<bool, ServiceError> {
        self.authorize(session, RoleOperation::RoleCheckMembersExists, entity_id)
            .await?;
        self.inner()
            .role_check_members_exists(session, entity_id, role_id, members)
            .await
    }

    async fn role_remove_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        members: &[String],
    ) -> Result<(), ServiceError> {
        self.authorize(session, RoleOperation::RoleRemoveMembers, entity_id)
            .await?;
        self.inner()
            .role_remove_members(session, entity_id, role_id, members)
            .await
    }

    async fn role_remove_all_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<(), ServiceError> {
        self.authorize(session, RoleOperation::RoleRemoveAllMembers, entity_id)
            .await?;
        self.inner()
            .role_remove_all_members(session, entity_id, role_id)
            .await
    }
}
