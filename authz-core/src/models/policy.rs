//! Relationship-policy request types shared by every entity service.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const USER_TYPE: &str = "user";
pub const ROLE_TYPE: &str = "role";
pub const USERS_KIND: &str = "users";
pub const PLATFORM_OBJECT: &str = "platform";

pub const ADMIN_PERMISSION: &str = "admin";
pub const MEMBERSHIP_PERMISSION: &str = "membership";

pub const MEMBER_RELATION: &str = "member";
pub const DOMAIN_RELATION: &str = "domain";
pub const PARENT_GROUP_RELATION: &str = "parent_group";

/// Wildcard entity id accepted by PAT scopes.
pub const ANY_IDS: &str = "*";

/// Entity kinds known to the policy evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Clients,
    Channels,
    Groups,
    Domains,
    Platform,
}

impl EntityType {
    /// Object type string used in policy tuples.
    pub fn policy_type(&self) -> &'static str {
        match self {
            EntityType::Clients => "client",
            EntityType::Channels => "channel",
            EntityType::Groups => "group",
            EntityType::Domains => "domain",
            EntityType::Platform => "platform",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Clients => "clients",
            EntityType::Channels => "channels",
            EntityType::Groups => "groups",
            EntityType::Domains => "domains",
            EntityType::Platform => "platform",
        };
        f.write_str(name)
    }
}

/// One relationship query or tuple.
///
/// Exactly one of `relation` and `permission` is non-empty. Build values with
/// [`PolicyReq::permission`] or [`PolicyReq::relation`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyReq {
    pub domain: String,
    pub subject: String,
    pub subject_type: String,
    pub subject_kind: String,
    pub subject_relation: String,
    pub object: String,
    pub object_type: String,
    pub object_kind: String,
    pub relation: String,
    pub permission: String,
}

impl PolicyReq {
    /// Capability check: does `subject` hold `permission` on `object`.
    pub fn permission(
        subject_type: &str,
        subject: impl Into<String>,
        permission: impl Into<String>,
        object_type: &str,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            subject_type: subject_type.to_string(),
            object: object.into(),
            object_type: object_type.to_string(),
            permission: permission.into(),
            ..Default::default()
        }
    }

    /// Structural edge between `subject` and `object`.
    pub fn relation(
        subject_type: &str,
        subject: impl Into<String>,
        relation: impl Into<String>,
        object_type: &str,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            subject_type: subject_type.to_string(),
            object: object.into(),
            object_type: object_type.to_string(),
            relation: relation.into(),
            ..Default::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_subject_kind(mut self, kind: impl Into<String>) -> Self {
        self.subject_kind = kind.into();
        self
    }

    pub fn with_subject_relation(mut self, relation: impl Into<String>) -> Self {
        self.subject_relation = relation.into();
        self
    }

    /// The relation or permission this request names.
    pub fn edge(&self) -> &str {
        if self.permission.is_empty() {
            &self.relation
        } else {
            &self.permission
        }
    }
}

/// CRUD class of an operation, as seen by PAT scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatOperation {
    Create,
    Read,
    List,
    Update,
    Delete,
}

impl fmt::Display for PatOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatOperation::Create => "create",
            PatOperation::Read => "read",
            PatOperation::List => "list",
            PatOperation::Update => "update",
            PatOperation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Scoped personal-access-token query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatReq {
    pub user_id: String,
    pub pat_id: String,
    pub entity_type: EntityType,
    pub optional_domain_id: String,
    pub operation: PatOperation,
    pub entity_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_request_leaves_relation_empty() {
        let req = PolicyReq::permission(USER_TYPE, "d1:u1", "view", "channel", "ch1")
            .with_domain("d1");
        assert_eq!(req.permission, "view");
        assert!(req.relation.is_empty());
        assert_eq!(req.edge(), "view");
        assert_eq!(req.domain, "d1");
    }

    #[test]
    fn test_relation_request_leaves_permission_empty() {
        let req = PolicyReq::relation("group", "g1", PARENT_GROUP_RELATION, "channel", "ch1");
        assert!(req.permission.is_empty());
        assert_eq!(req.edge(), PARENT_GROUP_RELATION);
    }

    #[test]
    fn test_policy_types() {
        assert_eq!(EntityType::Clients.policy_type(), "client");
        assert_eq!(EntityType::Groups.policy_type(), "group");
        assert_eq!(EntityType::Channels.to_string(), "channels");
    }
}
