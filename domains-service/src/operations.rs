//! Domain operations and the permissions they require.
//!
//! Freeze and list-all are decided by the platform-admin check and have no
//! entry here.

use authz_core::middleware::ROLE_ACTIONS;
use authz_core::models::{EntityType, PatOperation};
use authz_core::services::{ActionCatalog, Operation, OperationPerm, Permission};
use authz_core::ServiceError;
use std::fmt;

pub const VIEW_PERMISSION: &str = "view";
pub const EDIT_PERMISSION: &str = "edit";
pub const ENABLE_PERMISSION: &str = "enable";
pub const DISABLE_PERMISSION: &str = "disable";
pub const MEMBERSHIP_PERMISSION: &str = "membership";
pub const CLIENT_CREATE_PERMISSION: &str = "client_create";
pub const CHANNEL_CREATE_PERMISSION: &str = "channel_create";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainOperation {
    Retrieve,
    Update,
    Enable,
    Disable,
}

impl fmt::Display for DomainOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DomainOperation::Retrieve => "retrieve domain",
            DomainOperation::Update => "update domain",
            DomainOperation::Enable => "enable domain",
            DomainOperation::Disable => "disable domain",
        };
        f.write_str(label)
    }
}

impl Operation for DomainOperation {
    const ALL: &'static [Self] = &[
        DomainOperation::Retrieve,
        DomainOperation::Update,
        DomainOperation::Enable,
        DomainOperation::Disable,
    ];

    fn pat_operation(&self) -> Option<PatOperation> {
        match self {
            DomainOperation::Retrieve => Some(PatOperation::Read),
            _ => Some(PatOperation::Update),
        }
    }
}

pub fn domain_operation_permissions() -> Result<OperationPerm<DomainOperation>, ServiceError> {
    let mut perms = OperationPerm::new();
    perms.add_operation_permission_map([
        (DomainOperation::Retrieve, Permission::from(VIEW_PERMISSION)),
        (DomainOperation::Update, Permission::from(EDIT_PERMISSION)),
        (DomainOperation::Enable, Permission::from(ENABLE_PERMISSION)),
        (DomainOperation::Disable, Permission::from(DISABLE_PERMISSION)),
    ])?;
    Ok(perms)
}

/// Domain actions also cover what members may do with the domain's
/// clients and channels.
pub fn default_catalog() -> ActionCatalog {
    let mut actions = vec![
        VIEW_PERMISSION,
        EDIT_PERMISSION,
        ENABLE_PERMISSION,
        DISABLE_PERMISSION,
        MEMBERSHIP_PERMISSION,
        CLIENT_CREATE_PERMISSION,
        CHANNEL_CREATE_PERMISSION,
    ];
    actions.extend_from_slice(ROLE_ACTIONS);
    ActionCatalog::new(EntityType::Domains, &actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_validates() {
        assert!(domain_operation_permissions().unwrap().validate().is_ok());
    }

    #[test]
    fn test_duplicate_mapping_rejected() {
        let mut perms = domain_operation_permissions().unwrap();
        let result = perms.add_operation_permission_map([(
            DomainOperation::Enable,
            Permission::from(EDIT_PERMISSION),
        )]);
        assert!(matches!(result, Err(ServiceError::DuplicateOperation(_))));
        assert_eq!(
            perms.get_permission(DomainOperation::Enable).unwrap().as_str(),
            ENABLE_PERMISSION
        );
    }
}
