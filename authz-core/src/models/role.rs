//! Role model - per-entity roles with action grants and members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::policy::EntityType;

/// Name of the role every entity gets at creation time.
pub const BUILTIN_ADMIN_ROLE: &str = "admin";

/// Role record owned by a single entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub entity_id: String,
    pub entity_type: EntityType,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Role {
    pub fn new(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        name: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            entity_id: entity_id.into(),
            entity_type,
            created_by: created_by.into(),
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        }
    }
}

/// A role together with the actions and members it is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleProvision {
    pub role: Role,
    pub actions: Vec<String>,
    pub members: Vec<String>,
}

/// Input for a user-defined role.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewRole {
    #[validate(length(min = 1, max = 256, message = "Role name must be 1-256 characters"))]
    pub name: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RolePage {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MembersPage {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub members: Vec<String>,
}

/// Drop repeated entries while keeping first-seen order.
pub fn dedup_ordered(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_role_gets_fresh_id() {
        let a = Role::new(EntityType::Channels, "ch1", "admin", "u1");
        let b = Role::new(EntityType::Channels, "ch1", "admin", "u1");
        assert_ne!(a.id, b.id);
        assert!(a.updated_at.is_none());
    }

    #[test]
    fn test_new_role_name_validation() {
        let role = NewRole {
            name: String::new(),
            ..Default::default()
        };
        assert!(role.validate().is_err());

        let role = NewRole {
            name: "operators".to_string(),
            ..Default::default()
        };
        assert!(role.validate().is_ok());
    }

    #[test]
    fn test_dedup_ordered_keeps_first_occurrence() {
        let items = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(dedup_ordered(&items), vec!["b", "a"]);
    }
}
