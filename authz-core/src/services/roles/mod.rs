//! Role provisioning and management for one entity type.

mod repository;

pub use repository::{InMemoryRoleRepository, RoleRepository};

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use super::catalog::ActionCatalog;
use super::error::ServiceError;
use super::policy::PolicyService;
use crate::models::policy::{MEMBER_RELATION, ROLE_TYPE, USER_TYPE};
use crate::models::role::dedup_ordered;
use crate::models::{
    EntityType, MembersPage, NewRole, PageMeta, PolicyReq, Role, RolePage, RoleProvision, Session,
};

/// Built-in role provisioning used by entity services.
#[async_trait]
pub trait RoleProvisioner: Send + Sync {
    /// Provision every built-in role for each new entity, then write
    /// `optional_policies`. `builtin_members` maps a built-in role name to
    /// its initial members.
    ///
    /// On failure everything written by this call is compensated before the
    /// error is returned, and the caller must roll back the entities.
    async fn add_new_entities_roles(
        &self,
        domain_id: &str,
        actor_id: &str,
        entity_ids: &[String],
        optional_policies: &[PolicyReq],
        builtin_members: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<RoleProvision>, ServiceError>;

    /// Delete every role of the given entities and their grants.
    async fn remove_entities_roles(&self, entity_ids: &[String]) -> Result<(), ServiceError>;

    /// Entities where `member` holds any role.
    async fn member_entities(&self, member: &str) -> Result<Vec<String>, ServiceError>;

    /// Entities where the user holds a role under any domain identity.
    async fn user_entities(&self, user_id: &str) -> Result<Vec<String>, ServiceError>;
}

#[async_trait]
pub trait RoleManager: Send + Sync {
    async fn add_role(
        &self,
        session: &Session,
        entity_id: &str,
        new_role: NewRole,
    ) -> Result<RoleProvision, ServiceError>;

    async fn remove_role(&self, session: &Session, entity_id: &str, role_id: &str)
        -> Result<(), ServiceError>;

    async fn update_role_name(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        new_name: &str,
    ) -> Result<Role, ServiceError>;

    async fn retrieve_role(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<Role, ServiceError>;

    async fn retrieve_all_roles(
        &self,
        session: &Session,
        entity_id: &str,
        page: PageMeta,
    ) -> Result<RolePage, ServiceError>;

    async fn list_available_actions(&self, session: &Session) -> Result<Vec<String>, ServiceError>;

    async fn role_add_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        actions: &[String],
    ) -> Result<Vec<String>, ServiceError>;

    async fn role_list_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<Vec<String>, ServiceError>;

    async fn role_check_actions_exists(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        actions: &[String],
    ) -> Result<bool, ServiceError>;

    async fn role_remove_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        actions: &[String],
    ) -> Result<(), ServiceError>;

    async fn role_remove_all_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<(), ServiceError>;

    async fn role_add_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        members: &[String],
    ) -> Result<Vec<String>, ServiceError>;

    async fn role_list_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        page: PageMeta,
    ) -> Result<MembersPage, ServiceError>;

    async fn role_check_members_exists(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        members: &[String],
    ) -> Result<bool, ServiceError>;

    async fn role_remove_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        members: &[String],
    ) -> Result<(), ServiceError>;

    async fn role_remove_all_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<(), ServiceError>;
}

/// Role engine for a single entity type.
///
/// Every action of a role is one `role#member -> action -> entity` tuple and
/// every member one `user -> member -> role` tuple.
#[derive(Clone)]
pub struct ProvisionManageService {
    entity_type: EntityType,
    repo: Arc<dyn RoleRepository>,
    policy: Arc<dyn PolicyService>,
    catalog: Arc<ActionCatalog>,
}

impl ProvisionManageService {
    pub fn new(
        repo: Arc<dyn RoleRepository>,
        policy: Arc<dyn PolicyService>,
        catalog: ActionCatalog,
    ) -> Self {
        Self {
            entity_type: catalog.entity_type(),
            repo,
            policy,
            catalog: Arc::new(catalog),
        }
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    fn action_policies(&self, role: &Role, actions: &[String]) -> Vec<PolicyReq> {
        actions
            .iter()
            .map(|action| {
                PolicyReq::permission(
                    ROLE_TYPE,
                    &role.id,
                    action,
                    self.entity_type.policy_type(),
                    &role.entity_id,
                )
                .with_subject_relation(MEMBER_RELATION)
            })
            .collect()
    }

    fn member_policies(&self, role: &Role, members: &[String]) -> Vec<PolicyReq> {
        members
            .iter()
            .map(|member| PolicyReq::relation(USER_TYPE, member, MEMBER_RELATION, ROLE_TYPE, &role.id))
            .collect()
    }

    fn role_policies(&self, role: &Role, actions: &[String], members: &[String]) -> Vec<PolicyReq> {
        let mut policies = self.action_policies(role, actions);
        policies.extend(self.member_policies(role, members));
        policies
    }

    async fn add_policies(&self, policies: &[PolicyReq]) -> Result<(), ServiceError> {
        if policies.is_empty() {
            return Ok(());
        }
        self.policy
            .add_policies(policies)
            .await
            .map_err(ServiceError::Policy)
    }

    async fn delete_policies(&self, policies: &[PolicyReq]) -> Result<(), ServiceError> {
        if policies.is_empty() {
            return Ok(());
        }
        self.policy
            .delete_policies(policies)
            .await
            .map_err(ServiceError::Policy)
    }

    /// Undo committed policy batches, newest first.
    async fn compensate(&self, committed: &[Vec<PolicyReq>], cause: ServiceError) -> ServiceError {
        for batch in committed.iter().rev() {
            if let Err(rollback) = self.delete_policies(batch).await {
                tracing::error!(
                    entity_type = %self.entity_type,
                    error = %rollback,
                    "Failed to compensate policy writes"
                );
                return ServiceError::RollbackFailed {
                    source: Box::new(cause),
                    rollback: Box::new(rollback),
                };
            }
        }
        cause
    }

    async fn entity_role(&self, entity_id: &str, role_id: &str) -> Result<Role, ServiceError> {
        let role = self.repo.retrieve_role(role_id).await?;
        if role.entity_id != entity_id {
            return Err(ServiceError::NotFound(format!("role {}", role_id)));
        }
        Ok(role)
    }

    async fn touch(&self, session: &Session, mut role: Role) -> Result<Role, ServiceError> {
        role.updated_by = Some(session.user_id().to_string());
        role.updated_at = Some(Utc::now());
        self.repo.update_role(role).await
    }
}

#[async_trait]
impl RoleProvisioner for ProvisionManageService {
    async fn add_new_entities_roles(
        &self,
        domain_id: &str,
        actor_id: &str,
        entity_ids: &[String],
        optional_policies: &[PolicyReq],
        builtin_members: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<RoleProvision>, ServiceError> {
        let mut provisions = Vec::new();
        let mut committed: Vec<Vec<PolicyReq>> = Vec::new();

        for entity_id in entity_ids {
            let mut batch = Vec::new();
            for (name, actions) in self.catalog.builtin_roles() {
                let role = Role::new(self.entity_type, entity_id, name, actor_id);
                let members = builtin_members
                    .get(name)
                    .map(|m| dedup_ordered(m))
                    .unwrap_or_default();
                batch.extend(self.role_policies(&role, actions, &members));
                provisions.push(RoleProvision {
                    role,
                    actions: actions.to_vec(),
                    members,
                });
            }

            if let Err(e) = self.add_policies(&batch).await {
                tracing::warn!(
                    entity_type = %self.entity_type,
                    entity_id = %entity_id,
                    domain_id = %domain_id,
                    error = %e,
                    "Built-in role provisioning failed"
                );
                return Err(self.compensate(&committed, e).await);
            }
            committed.push(batch);
        }

        if let Err(e) = self.add_policies(optional_policies).await {
            return Err(self.compensate(&committed, e).await);
        }
        committed.push(optional_policies.to_vec());

        if let Err(e) = self.repo.add_roles(&provisions).await {
            return Err(self.compensate(&committed, e).await);
        }

        tracing::info!(
            entity_type = %self.entity_type,
            domain_id = %domain_id,
            entities = entity_ids.len(),
            roles = provisions.len(),
            "Provisioned built-in roles"
        );
        Ok(provisions)
    }

    async fn remove_entities_roles(&self, entity_ids: &[String]) -> Result<(), ServiceError> {
        let roles = self.repo.retrieve_entities_roles(entity_ids).await?;
        let mut policies = Vec::new();
        for role in &roles {
            let actions = self.repo.role_list_actions(&role.id).await?;
            let members = self.repo.role_all_members(&role.id).await?;
            policies.extend(self.role_policies(role, &actions, &members));
        }

        self.delete_policies(&policies).await?;

        let role_ids: Vec<String> = roles.into_iter().map(|r| r.id).collect();
        self.repo.remove_roles(&role_ids).await
    }

    async fn member_entities(&self, member: &str) -> Result<Vec<String>, ServiceError> {
        self.repo.retrieve_entities_for_member(member).await
    }

    async fn user_entities(&self, user_id: &str) -> Result<Vec<String>, ServiceError> {
        self.repo.retrieve_entities_for_user(user_id).await
    }
}

#[async_trait]
impl RoleManager for ProvisionManageService {
    async fn add_role(
        &self,
        session: &Session,
        entity_id: &str,
        new_role: NewRole,
    ) -> Result<RoleProvision, ServiceError> {
        new_role.validate()?;
        let actions = dedup_ordered(&new_role.actions);
        let members = dedup_ordered(&new_role.members);
        self.catalog.validate_actions(&actions)?;

        if self
            .repo
            .retrieve_entity_role_by_name(entity_id, &new_role.name)
            .await?
            .is_some()
        {
            return Err(ServiceError::DuplicateRoleName(new_role.name));
        }

        let role = Role::new(self.entity_type, entity_id, new_role.name, session.user_id());
        let policies = self.role_policies(&role, &actions, &members);
        self.add_policies(&policies).await?;

        let provision = RoleProvision {
            role,
            actions,
            members,
        };
        if let Err(e) = self.repo.add_roles(std::slice::from_ref(&provision)).await {
            return Err(self.compensate(&[policies], e).await);
        }
        Ok(provision)
    }

    async fn remove_role(
        &self,
        _session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<(), ServiceError> {
        let role = self.entity_role(entity_id, role_id).await?;
        let actions = self.repo.role_list_actions(role_id).await?;
        let members = self.repo.role_all_members(role_id).await?;

        // Grants go first; a failure here leaves the role intact.
        self.delete_policies(&self.role_policies(&role, &actions, &members))
            .await?;
        self.repo.remove_roles(&[role.id]).await
    }

    async fn update_role_name(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        new_name: &str,
    ) -> Result<Role, ServiceError> {
        NewRole {
            name: new_name.to_string(),
            ..Default::default()
        }
        .validate()?;

        let mut role = self.entity_role(entity_id, role_id).await?;
        if let Some(existing) = self
            .repo
            .retrieve_entity_role_by_name(entity_id, new_name)
            .await?
        {
            if existing.id != role.id {
                return Err(ServiceError::DuplicateRoleName(new_name.to_string()));
            }
        }

        role.name = new_name.to_string();
        self.touch(session, role).await
    }

    async fn retrieve_role(
        &self,
        _session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<Role, ServiceError> {
        self.entity_role(entity_id, role_id).await
    }

    async fn retrieve_all_roles(
        &self,
        _session: &Session,
        entity_id: &str,
        page: PageMeta,
    ) -> Result<RolePage, ServiceError> {
        self.repo.retrieve_all_roles(entity_id, &page).await
    }

    async fn list_available_actions(&self, _session: &Session) -> Result<Vec<String>, ServiceError> {
        Ok(self.catalog.available_actions().to_vec())
    }

    async fn role_add_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        actions: &[String],
    ) -> Result<Vec<String>, ServiceError> {
        self.catalog.validate_actions(actions)?;
        let role = self.entity_role(entity_id, role_id).await?;

        let existing = self.repo.role_list_actions(role_id).await?;
        let new_actions: Vec<String> = dedup_ordered(actions)
            .into_iter()
            .filter(|a| !existing.contains(a))
            .collect();

        let policies = self.action_policies(&role, &new_actions);
        self.add_policies(&policies).await?;
        if let Err(e) = self.repo.role_add_actions(role_id, &new_actions).await {
            return Err(self.compensate(&[policies], e).await);
        }
        self.touch(session, role).await?;

        Ok(dedup_ordered(actions))
    }

    async fn role_list_actions(
        &self,
        _session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<Vec<String>, ServiceError> {
        self.entity_role(entity_id, role_id).await?;
        self.repo.role_list_actions(role_id).await
    }

    async fn role_check_actions_exists(
        &self,
        _session: &Session,
        entity_id: &str,
        role_id: &str,
        actions: &[String],
    ) -> Result<bool, ServiceError> {
        self.entity_role(entity_id, role_id).await?;
        self.repo.role_check_actions_exists(role_id, actions).await
    }

    async fn role_remove_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        actions: &[String],
    ) -> Result<(), ServiceError> {
        let role = self.entity_role(entity_id, role_id).await?;
        let existing = self.repo.role_list_actions(role_id).await?;
        let removed: Vec<String> = dedup_ordered(actions)
            .into_iter()
            .filter(|a| existing.contains(a))
            .collect();

        self.delete_policies(&self.action_policies(&role, &removed))
            .await?;
        self.repo.role_remove_actions(role_id, &removed).await?;
        self.touch(session, role).await?;
        Ok(())
    }

    async fn role_remove_all_actions(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<(), ServiceError> {
        let role = self.entity_role(entity_id, role_id).await?;
        let existing = self.repo.role_list_actions(role_id).await?;

        self.delete_policies(&self.action_policies(&role, &existing))
            .await?;
        self.repo.role_remove_all_actions(role_id).await?;
        self.touch(session, role).await?;
        Ok(())
    }

    async fn role_add_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        members: &[String],
    ) -> Result<Vec<String>, ServiceError> {
        let role = self.entity_role(entity_id, role_id).await?;
        let existing = self.repo.role_all_members(role_id).await?;
        let new_members: Vec<String> = dedup_ordered(members)
            .into_iter()
            .filter(|m| !existing.contains(m))
            .collect();

        if new_members.is_empty() {
            return Ok(dedup_ordered(members));
        }

        let policies = self.member_policies(&role, &new_members);
        self.add_policies(&policies).await?;
        if let Err(e) = self.repo.role_add_members(role_id, &new_members).await {
            return Err(self.compensate(&[policies], e).await);
        }
        self.touch(session, role).await?;

        Ok(dedup_ordered(members))
    }

    async fn role_list_members(
        &self,
        _session: &Session,
        entity_id: &str,
        role_id: &str,
        page: PageMeta,
    ) -> Result<MembersPage, ServiceError> {
        self.entity_role(entity_id, role_id).await?;
        self.repo.role_list_members(role_id, &page).await
    }

    async fn role_check_members_exists(
        &self,
        _session: &Session,
        entity_id: &str,
        role_id: &str,
        members: &[String],
    ) -> Result<bool, ServiceError> {
        self.entity_role(entity_id, role_id).await?;
        self.repo.role_check_members_exists(role_id, members).await
    }

    async fn role_remove_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
        members: &[String],
    ) -> Result<(), ServiceError> {
        let role = self.entity_role(entity_id, role_id).await?;
        let existing = self.repo.role_all_members(role_id).await?;
        let removed: Vec<String> = dedup_ordered(members)
            .into_iter()
            .filter(|m| existing.contains(m))
            .collect();

        self.delete_policies(&self.member_policies(&role, &removed))
            .await?;
        self.repo.role_remove_members(role_id, &removed).await?;
        self.touch(session, role).await?;
        Ok(())
    }

    async fn role_remove_all_members(
        &self,
        session: &Session,
        entity_id: &str,
        role_id: &str,
    ) -> Result<(), ServiceError> {
        let role = self.entity_role(entity_id, role_id).await?;
        let existing = self.repo.role_all_members(role_id).await?;

        self.delete_policies(&self.member_policies(&role, &existing))
            .await?;
        self.repo.role_remove_all_members(role_id).await?;
        self.touch(session, role).await?;
        Ok(())
    }
}
