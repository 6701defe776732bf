//! Role persistence contract and its in-memory implementation.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::role::dedup_ordered;
use crate::models::session::decode_domain_user_id;
use crate::models::{Direction, MembersPage, Order, PageMeta, Role, RolePage, RoleProvision};
use crate::services::ServiceError;

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn add_roles(&self, provisions: &[RoleProvision]) -> Result<(), ServiceError>;
    async fn remove_roles(&self, role_ids: &[String]) -> Result<(), ServiceError>;
    async fn update_role(&self, role: Role) -> Result<Role, ServiceError>;
    async fn retrieve_role(&self, role_id: &str) -> Result<Role, ServiceError>;
    async fn retrieve_entity_role_by_name(
        &self,
        entity_id: &str,
        name: &str,
    ) -> Result<Option<Role>, ServiceError>;
    async fn retrieve_all_roles(
        &self,
        entity_id: &str,
        page: &PageMeta,
    ) -> Result<RolePage, ServiceError>;
    async fn retrieve_entities_roles(&self, entity_ids: &[String]) -> Result<Vec<Role>, ServiceError>;

    /// Adds the actions not yet granted and returns only those.
    async fn role_add_actions(
        &self,
        role_id: &str,
        actions: &[String],
    ) -> Result<Vec<String>, ServiceError>;
    async fn role_list_actions(&self, role_id: &str) -> Result<Vec<String>, ServiceError>;
    async fn role_check_actions_exists(
        &self,
        role_id: &str,
        actions: &[String],
    ) -> Result<bool, ServiceError>;
    async fn role_remove_actions(&self, role_id: &str, actions: &[String]) -> Result<(), ServiceError>;
    async fn role_remove_all_actions(&self, role_id: &str) -> Result<(), ServiceError>;

    /// Adds the members not yet present and returns only those.
    async fn role_add_members(
        &self,
        role_id: &str,
        members: &[String],
    ) -> Result<Vec<String>, ServiceError>;
    async fn role_list_members(
        &self,
        role_id: &str,
        page: &PageMeta,
    ) -> Result<MembersPage, ServiceError>;
    async fn role_all_members(&self, role_id: &str) -> Result<Vec<String>, ServiceError>;
    async fn role_check_members_exists(
        &self,
        role_id: &str,
        members: &[String],
    ) -> Result<bool, ServiceError>;
    async fn role_remove_members(&self, role_id: &str, members: &[String]) -> Result<(), ServiceError>;
    async fn role_remove_all_members(&self, role_id: &str) -> Result<(), ServiceError>;

    /// Ids of entities where `member` belongs to at least one role.
    async fn retrieve_entities_for_member(&self, member: &str) -> Result<Vec<String>, ServiceError>;

    /// Ids of entities where any domain identity of `user_id` holds a role.
    async fn retrieve_entities_for_user(&self, user_id: &str) -> Result<Vec<String>, ServiceError>;
}

#[derive(Debug, Clone)]
struct StoredRole {
    seq: u64,
    role: Role,
    actions: Vec<String>,
    members: Vec<String>,
}

#[derive(Default)]
pub struct InMemoryRoleRepository {
    roles: DashMap<String, StoredRole>,
    seq: AtomicU64,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn entities_where(&self, matches: impl Fn(&str) -> bool) -> Vec<String> {
        let mut stored: Vec<(u64, String)> = self
            .roles
            .iter()
            .filter(|r| r.members.iter().any(|m| matches(m.as_str())))
            .map(|r| (r.seq, r.role.entity_id.clone()))
            .collect();
        stored.sort_by_key(|(seq, _)| *seq);

        let ids: Vec<String> = stored.into_iter().map(|(_, id)| id).collect();
        dedup_ordered(&ids)
    }

    fn not_found(role_id: &str) -> ServiceError {
        ServiceError::NotFound(format!("role {}", role_id))
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn add_roles(&self, provisions: &[RoleProvision]) -> Result<(), ServiceError> {
        for p in provisions {
            let taken = self
                .roles
                .iter()
                .any(|r| r.role.entity_id == p.role.entity_id && r.role.name == p.role.name);
            if taken {
                return Err(ServiceError::DuplicateRoleName(p.role.name.clone()));
            }
        }

        for p in provisions {
            let seq = self.seq.fetch_add(1, Ordering::SeqCst);
            self.roles.insert(
                p.role.id.clone(),
                StoredRole {
                    seq,
                    role: p.role.clone(),
                    actions: dedup_ordered(&p.actions),
                    members: dedup_ordered(&p.members),
                },
            );
        }
        Ok(())
    }

    async fn remove_roles(&self, role_ids: &[String]) -> Result<(), ServiceError> {
        for id in role_ids {
            self.roles.remove(id);
        }
        Ok(())
    }

    async fn update_role(&self, role: Role) -> Result<Role, ServiceError> {
        let mut stored = self
            .roles
            .get_mut(&role.id)
            .ok_or_else(|| Self::not_found(&role.id))?;
        stored.role = role.clone();
        Ok(role)
    }

    async fn retrieve_role(&self, role_id: &str) -> Result<Role, ServiceError> {
        self.roles
            .get(role_id)
            .map(|r| r.role.clone())
            .ok_or_else(|| Self::not_found(role_id))
    }

    async fn retrieve_entity_role_by_name(
        &self,
        entity_id: &str,
        name: &str,
    ) -> Result<Option<Role>, ServiceError> {
        Ok(self
            .roles
            .iter()
            .find(|r| r.role.entity_id == entity_id && r.role.name == name)
            .map(|r| r.role.clone()))
    }

    async fn retrieve_all_roles(
        &self,
        entity_id: &str,
        page: &PageMeta,
    ) -> Result<RolePage, ServiceError> {
        let mut stored: Vec<(u64, Role)> = self
            .roles
            .iter()
            .filter(|r| r.role.entity_id == entity_id)
            .map(|r| (r.seq, r.role.clone()))
            .collect();

        match page.order {
            Some(Order::Name) => stored.sort_by(|a, b| a.1.name.cmp(&b.1.name)),
            Some(Order::CreatedAt) => stored.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at)),
            None => stored.sort_by_key(|(seq, _)| *seq),
        }
        if page.order.is_some() && page.dir == Direction::Desc {
            stored.reverse();
        }

        let roles: Vec<Role> = stored.into_iter().map(|(_, role)| role).collect();
        let (total, roles) = page.paginate(&roles);
        Ok(RolePage {
            total,
            offset: page.offset,
            limit: page.limit,
            roles,
        })
    }

    async fn retrieve_entities_roles(&self, entity_ids: &[String]) -> Result<Vec<Role>, ServiceError> {
        let mut stored: Vec<(u64, Role)> = self
            .roles
            .iter()
            .filter(|r| entity_ids.contains(&r.role.entity_id))
            .map(|r| (r.seq, r.role.clone()))
            .collect();
        stored.sort_by_key(|(seq, _)| *seq);
        Ok(stored.into_iter().map(|(_, role)| role).collect())
    }

    async fn role_add_actions(
        &self,
        role_id: &str,
        actions: &[String],
    ) -> Result<Vec<String>, ServiceError> {
        let mut stored = self
            .roles
            .get_mut(role_id)
            .ok_or_else(|| Self::not_found(role_id))?;
        let added: Vec<String> = dedup_ordered(actions)
            .into_iter()
            .filter(|a| !stored.actions.contains(a))
            .collect();
        stored.actions.extend(added.iter().cloned());
        Ok(added)
    }

    async fn role_list_actions(&self, role_id: &str) -> Result<Vec<String>, ServiceError> {
        self.roles
            .get(role_id)
            .map(|r| r.actions.clone())
            .ok_or_else(|| Self::not_found(role_id))
    }

    async fn role_check_actions_exists(
        &self,
        role_id: &str,
        actions: &[String],
    ) -> Result<bool, ServiceError> {
        let stored = self.roles.get(role_id).ok_or_else(|| Self::not_found(role_id))?;
        Ok(actions.iter().all(|a| stored.actions.contains(a)))
    }

    async fn role_remove_actions(&self, role_id: &str, actions: &[String]) -> Result<(), ServiceError> {
        let mut stored = self
            .roles
            .get_mut(role_id)
            .ok_or_else(|| Self::not_found(role_id))?;
        stored.actions.retain(|a| !actions.contains(a));
        Ok(())
    }

    async fn role_remove_all_actions(&self, role_id: &str) -> Result<(), ServiceError> {
        let mut stored = self
            .roles
            .get_mut(role_id)
            .ok_or_else(|| Self::not_found(role_id))?;
        stored.actions.clear();
        Ok(())
    }

    async fn role_add_members(
        &self,
        role_id: &str,
        members: &[String],
    ) -> Result<Vec<String>, ServiceError> {
        let mut stored = self
            .roles
            .get_mut(role_id)
            .ok_or_else(|| Self::not_found(role_id))?;
        let added: Vec<String> = dedup_ordered(members)
            .into_iter()
            .filter(|m| !stored.members.contains(m))
            .collect();
        stored.members.extend(added.iter().cloned());
        Ok(added)
    }

    async fn role_list_members(
        &self,
        role_id: &str,
        page: &PageMeta,
    ) -> Result<MembersPage, ServiceError> {
        let stored = self.roles.get(role_id).ok_or_else(|| Self::not_found(role_id))?;
        let mut members = stored.members.clone();
        if page.order == Some(Order::Name) {
            members.sort();
            if page.dir == Direction::Desc {
                members.reverse();
            }
        }
        let (total, members) = page.paginate(&members);
        Ok(MembersPage {
            total,
            offset: page.offset,
            limit: page.limit,
            members,
        })
    }

    async fn role_all_members(&self, role_id: &str) -> Result<Vec<String>, ServiceError> {
        self.roles
            .get(role_id)
            .map(|r| r.members.clone())
            .ok_or_else(|| Self::not_found(role_id))
    }

    async fn role_check_members_exists(
        &self,
        role_id: &str,
        members: &[String],
    ) -> Result<bool, ServiceError> {
        let stored = self.roles.get(role_id).ok_or_else(|| Self::not_found(role_id))?;
        Ok(members.iter().all(|m| stored.members.contains(m)))
    }

    async fn role_remove_members(&self, role_id: &str, members: &[String]) -> Result<(), ServiceError> {
        let mut stored = self
            .roles
            .get_mut(role_id)
            .ok_or_else(|| Self::not_found(role_id))?;
        stored.members.retain(|m| !members.contains(m));
        Ok(())
    }

    async fn role_remove_all_members(&self, role_id: &str) -> Result<(), ServiceError> {
        let mut stored = self
            .roles
            .get_mut(role_id)
            .ok_or_else(|| Self::not_found(role_id))?;
        stored.members.clear();
        Ok(())
    }

    async fn retrieve_entities_for_member(&self, member: &str) -> Result<Vec<String>, ServiceError> {
        Ok(self.entities_where(|m| m == member))
    }

    async fn retrieve_entities_for_user(&self, user_id: &str) -> Result<Vec<String>, ServiceError> {
        Ok(self.entities_where(|m| {
            decode_domain_user_id(m).is_some_and(|(_, user)| user == user_id)
        }))
    }
}
