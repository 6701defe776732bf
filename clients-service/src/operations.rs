//! Client operations and the permissions they require.

use authz_core::middleware::ROLE_ACTIONS;
use authz_core::models::{EntityType, PatOperation};
use authz_core::services::{ActionCatalog, Operation, OperationPerm, Permission};
use authz_core::ServiceError;
use std::fmt;

pub const VIEW_PERMISSION: &str = "view";
pub const EDIT_PERMISSION: &str = "edit";
pub const DELETE_PERMISSION: &str = "delete";
pub const SET_PARENT_GROUP_PERMISSION: &str = "set_parent_group";
pub const CONNECT_CHANNEL_PERMISSION: &str = "connect_channel";

pub const CLIENT_CREATE_PERMISSION: &str = "client_create";
pub const MEMBERSHIP_PERMISSION: &str = "membership";
pub const SET_CHILD_PERMISSION: &str = "set_child";

/// Operations checked against the client itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientOperation {
    View,
    Update,
    UpdateTags,
    UpdateSecret,
    Enable,
    Disable,
    Delete,
    SetParentGroup,
    RemoveParentGroup,
}

impl fmt::Display for ClientOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClientOperation::View => "view client",
            ClientOperation::Update => "update client",
            ClientOperation::UpdateTags => "update client tags",
            ClientOperation::UpdateSecret => "update client secret",
            ClientOperation::Enable => "enable client",
            ClientOperation::Disable => "disable client",
            ClientOperation::Delete => "delete client",
            ClientOperation::SetParentGroup => "set parent group of client",
            ClientOperation::RemoveParentGroup => "remove parent group of client",
        };
        f.write_str(label)
    }
}

impl Operation for ClientOperation {
    const ALL: &'static [Self] = &[
        ClientOperation::View,
        ClientOperation::Update,
        ClientOperation::UpdateTags,
        ClientOperation::UpdateSecret,
        ClientOperation::Enable,
        ClientOperation::Disable,
        ClientOperation::Delete,
        ClientOperation::SetParentGroup,
        ClientOperation::RemoveParentGroup,
    ];

    fn pat_operation(&self) -> Option<PatOperation> {
        let op = match self {
            ClientOperation::View => PatOperation::Read,
            ClientOperation::Delete => PatOperation::Delete,
            _ => PatOperation::Update,
        };
        Some(op)
    }
}

/// Operations checked against objects owned by other services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientExternalOperation {
    DomainCreateClient,
    DomainListClients,
    GroupSetChildClient,
    GroupRemoveChildClient,
}

impl fmt::Display for ClientExternalOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClientExternalOperation::DomainCreateClient => "create client in domain",
            ClientExternalOperation::DomainListClients => "list clients in domain",
            ClientExternalOperation::GroupSetChildClient => "add client to group",
            ClientExternalOperation::GroupRemoveChildClient => "remove client from group",
        };
        f.write_str(label)
    }
}

impl Operation for ClientExternalOperation {
    const ALL: &'static [Self] = &[
        ClientExternalOperation::DomainCreateClient,
        ClientExternalOperation::DomainListClients,
        ClientExternalOperation::GroupSetChildClient,
        ClientExternalOperation::GroupRemoveChildClient,
    ];

    fn pat_operation(&self) -> Option<PatOperation> {
        match self {
            ClientExternalOperation::DomainCreateClient => Some(PatOperation::Create),
            ClientExternalOperation::DomainListClients => Some(PatOperation::List),
            // The paired check on the client already ran the PAT check.
            ClientExternalOperation::GroupSetChildClient
            | ClientExternalOperation::GroupRemoveChildClient => None,
        }
    }
}

pub fn client_operation_permissions() -> Result<OperationPerm<ClientOperation>, ServiceError> {
    use ClientOperation::*;

    let mut perms = OperationPerm::new();
    perms.add_operation_permission_map(
        [
            (View, VIEW_PERMISSION),
            (Update, EDIT_PERMISSION),
            (UpdateTags, EDIT_PERMISSION),
            (UpdateSecret, EDIT_PERMISSION),
            (Enable, EDIT_PERMISSION),
            (Disable, EDIT_PERMISSION),
            (Delete, DELETE_PERMISSION),
            (SetParentGroup, SET_PARENT_GROUP_PERMISSION),
            (RemoveParentGroup, SET_PARENT_GROUP_PERMISSION),
        ]
        .into_iter()
        .map(|(op, perm)| (op, Permission::from(perm))),
    )?;
    Ok(perms)
}

pub fn client_external_permissions(
) -> Result<OperationPerm<ClientExternalOperation>, ServiceError> {
    use ClientExternalOperation::*;

    let mut perms = OperationPerm::new();
    perms.add_operation_permission_map(
        [
            (DomainCreateClient, CLIENT_CREATE_PERMISSION),
            (DomainListClients, MEMBERSHIP_PERMISSION),
            (GroupSetChildClient, SET_CHILD_PERMISSION),
            (GroupRemoveChildClient, SET_CHILD_PERMISSION),
        ]
        .into_iter()
        .map(|(op, perm)| (op, Permission::from(perm))),
    )?;
    Ok(perms)
}

/// Built-in catalog used when no actions file is configured.
pub fn default_catalog() -> ActionCatalog {
    let mut actions = vec![
        VIEW_PERMISSION,
        EDIT_PERMISSION,
        DELETE_PERMISSION,
        SET_PARENT_GROUP_PERMISSION,
        CONNECT_CHANNEL_PERMISSION,
    ];
    actions.extend_from_slice(ROLE_ACTIONS);
    ActionCatalog::new(EntityType::Clients, &actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registries_validate() {
        assert!(client_operation_permissions().unwrap().validate().is_ok());
        assert!(client_external_permissions().unwrap().validate().is_ok());
    }

    #[test]
    fn test_missing_mapping_fails_validation() {
        let mut perms = OperationPerm::new();
        perms
            .add_operation_permission_map(
                ClientOperation::ALL
                    .iter()
                    .filter(|op| **op != ClientOperation::UpdateSecret)
                    .map(|op| (*op, Permission::from(EDIT_PERMISSION))),
            )
            .unwrap();
        match perms.validate() {
            Err(ServiceError::UnmappedOperation(op)) => assert_eq!(op, "update client secret"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_catalog_grants_role_actions() {
        let catalog = default_catalog();
        for action in ROLE_ACTIONS {
            assert!(catalog.contains(action));
        }
        assert!(catalog.contains(CONNECT_CHANNEL_PERMISSION));
    }
}
