//! Channel operations and the permissions they require.

use authz_core::middleware::ROLE_ACTIONS;
use authz_core::models::{EntityType, PatOperation};
use authz_core::services::{ActionCatalog, Operation, OperationPerm, Permission};
use authz_core::ServiceError;
use std::fmt;

pub const VIEW_PERMISSION: &str = "view";
pub const EDIT_PERMISSION: &str = "edit";
pub const DELETE_PERMISSION: &str = "delete";
pub const SET_PARENT_GROUP_PERMISSION: &str = "set_parent_group";
pub const CONNECT_CLIENT_PERMISSION: &str = "connect_client";
pub const PUBLISH_PERMISSION: &str = "publish";
pub const SUBSCRIBE_PERMISSION: &str = "subscribe";

pub const CHANNEL_CREATE_PERMISSION: &str = "channel_create";
pub const MEMBERSHIP_PERMISSION: &str = "membership";
pub const SET_CHILD_PERMISSION: &str = "set_child";
pub const CONNECT_CHANNEL_PERMISSION: &str = "connect_channel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelOperation {
    View,
    Update,
    UpdateTags,
    Enable,
    Disable,
    Delete,
    SetParentGroup,
    RemoveParentGroup,
    Connect,
    Disconnect,
}

impl fmt::Display for ChannelOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChannelOperation::View => "view channel",
            ChannelOperation::Update => "update channel",
            ChannelOperation::UpdateTags => "update channel tags",
            ChannelOperation::Enable => "enable channel",
            ChannelOperation::Disable => "disable channel",
            ChannelOperation::Delete => "delete channel",
            ChannelOperation::SetParentGroup => "set parent group of channel",
            ChannelOperation::RemoveParentGroup => "remove parent group of channel",
            ChannelOperation::Connect => "connect client to channel",
            ChannelOperation::Disconnect => "disconnect client from channel",
        };
        f.write_str(label)
    }
}

impl Operation for ChannelOperation {
    const ALL: &'static [Self] = &[
        ChannelOperation::View,
        ChannelOperation::Update,
        ChannelOperation::UpdateTags,
        ChannelOperation::Enable,
        ChannelOperation::Disable,
        ChannelOperation::Delete,
        ChannelOperation::SetParentGroup,
        ChannelOperation::RemoveParentGroup,
        ChannelOperation::Connect,
        ChannelOperation::Disconnect,
    ];

    fn pat_operation(&self) -> Option<PatOperation> {
        let op = match self {
            ChannelOperation::View => PatOperation::Read,
            ChannelOperation::Delete => PatOperation::Delete,
            _ => PatOperation::Update,
        };
        Some(op)
    }
}

/// Checks a channel request makes against domains, groups and clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelExternalOperation {
    DomainCreateChannel,
    DomainListChannels,
    GroupSetChildChannel,
    GroupRemoveChildChannel,
    ClientConnectChannel,
    ClientDisconnectChannel,
}

impl fmt::Display for ChannelExternalOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChannelExternalOperation::DomainCreateChannel => "create channel in domain",
            ChannelExternalOperation::DomainListChannels => "list channels in domain",
            ChannelExternalOperation::GroupSetChildChannel => "add channel to group",
            ChannelExternalOperation::GroupRemoveChildChannel => "remove channel from group",
            ChannelExternalOperation::ClientConnectChannel => "connect channel to client",
            ChannelExternalOperation::ClientDisconnectChannel => "disconnect channel from client",
        };
        f.write_str(label)
    }
}

impl Operation for ChannelExternalOperation {
    const ALL: &'static [Self] = &[
        ChannelExternalOperation::DomainCreateChannel,
        ChannelExternalOperation::DomainListChannels,
        ChannelExternalOperation::GroupSetChildChannel,
        ChannelExternalOperation::GroupRemoveChildChannel,
        ChannelExternalOperation::ClientConnectChannel,
        ChannelExternalOperation::ClientDisconnectChannel,
    ];

    fn pat_operation(&self) -> Option<PatOperation> {
        match self {
            ChannelExternalOperation::DomainCreateChannel => Some(PatOperation::Create),
            ChannelExternalOperation::DomainListChannels => Some(PatOperation::List),
            _ => None,
        }
    }
}

pub fn channel_operation_permissions() -> Result<OperationPerm<ChannelOperation>, ServiceError> {
    use ChannelOperation::*;

    let mut perms = OperationPerm::new();
    perms.add_operation_permission_map(
        [
            (View, VIEW_PERMISSION),
            (Update, EDIT_PERMISSION),
            (UpdateTags, EDIT_PERMISSION),
            (Enable, EDIT_PERMISSION),
            (Disable, EDIT_PERMISSION),
            (Delete, DELETE_PERMISSION),
            (SetParentGroup, SET_PARENT_GROUP_PERMISSION),
            (RemoveParentGroup, SET_PARENT_GROUP_PERMISSION),
            (Connect, CONNECT_CLIENT_PERMISSION),
            (Disconnect, CONNECT_CLIENT_PERMISSION),
        ]
        .into_iter()
        .map(|(op, perm)| (op, Permission::from(perm))),
    )?;
    Ok(perms)
}

pub fn channel_external_permissions(
) -> Result<OperationPerm<ChannelExternalOperation>, ServiceError> {
    use ChannelExternalOperation::*;

    let mut perms = OperationPerm::new();
    perms.add_operation_permission_map(
        [
            (DomainCreateChannel, CHANNEL_CREATE_PERMISSION),
            (DomainListChannels, MEMBERSHIP_PERMISSION),
            (GroupSetChildChannel, SET_CHILD_PERMISSION),
            (GroupRemoveChildChannel, SET_CHILD_PERMISSION),
            (ClientConnectChannel, CONNECT_CHANNEL_PERMISSION),
            (ClientDisconnectChannel, CONNECT_CHANNEL_PERMISSION),
        ]
        .into_iter()
        .map(|(op, perm)| (op, Permission::from(perm))),
    )?;
    Ok(perms)
}

pub fn default_catalog() -> ActionCatalog {
    let mut actions = vec![
        VIEW_PERMISSION,
        EDIT_PERMISSION,
        DELETE_PERMISSION,
        SET_PARENT_GROUP_PERMISSION,
        CONNECT_CLIENT_PERMISSION,
        PUBLISH_PERMISSION,
        SUBSCRIBE_PERMISSION,
    ];
    actions.extend_from_slice(ROLE_ACTIONS);
    ActionCatalog::new(EntityType::Channels, &actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registries_validate() {
        assert!(channel_operation_permissions().unwrap().validate().is_ok());
        assert!(channel_external_permissions().unwrap().validate().is_ok());
    }

    #[test]
    fn test_connect_maps_to_both_sides() {
        let local = channel_operation_permissions().unwrap();
        let external = channel_external_permissions().unwrap();
        assert_eq!(
            local.get_permission(ChannelOperation::Connect).unwrap().as_str(),
            "connect_client"
        );
        assert_eq!(
            external
                .get_permission(ChannelExternalOperation::ClientConnectChannel)
                .unwrap()
                .as_str(),
            "connect_channel"
        );
    }

    #[test]
    fn test_external_relationship_checks_skip_pat() {
        assert_eq!(
            ChannelExternalOperation::ClientConnectChannel.pat_operation(),
            None
        );
        assert_eq!(
            ChannelExternalOperation::DomainListChannels.pat_operation(),
            Some(PatOperation::List)
        );
    }
}
