use async_trait::async_trait;
use authz_core::models::policy::{DOMAIN_RELATION, PARENT_GROUP_RELATION};
use authz_core::models::{EntityType, PageMeta, PolicyReq, Session, BUILTIN_ADMIN_ROLE};
use authz_core::services::{PolicyService, RoleProvisioner};
use authz_core::ServiceError;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::repository::ChannelRepository;
use crate::models::{
    Channel, ChannelStatus, ChannelsPage, Connection, ConnectionType, NewChannel, UpdateChannel,
};

#[async_trait]
pub trait ChannelService: Send + Sync {
    async fn create_channels(
        &self,
        session: &Session,
        channels: Vec<NewChannel>,
    ) -> Result<Vec<Channel>, ServiceError>;
    async fn view_channel(&self, session: &Session, id: &str) -> Result<Channel, ServiceError>;
    async fn list_channels(
        &self,
        session: &Session,
        page: PageMeta,
    ) -> Result<ChannelsPage, ServiceError>;
    async fn update_channel(
        &self,
        session: &Session,
        id: &str,
        update: UpdateChannel,
    ) -> Result<Channel, ServiceError>;
    async fn update_channel_tags(
        &self,
        session: &Session,
        id: &str,
        tags: Vec<String>,
    ) -> Result<Channel, ServiceError>;
    async fn enable_channel(&self, session: &Session, id: &str) -> Result<Channel, ServiceError>;
    async fn disable_channel(&self, session: &Session, id: &str) -> Result<Channel, ServiceError>;
    async fn delete_channel(&self, session: &Session, id: &str) -> Result<(), ServiceError>;
    async fn set_parent_group(
        &self,
        session: &Session,
        parent_group_id: &str,
        id: &str,
    ) -> Result<(), ServiceError>;
    async fn remove_parent_group(&self, session: &Session, id: &str) -> Result<(), ServiceError>;
    /// Connect every client to every channel for each connection type.
    async fn connect(
        &self,
        session: &Session,
        channel_ids: &[String],
        client_ids: &[String],
        conn_types: &[ConnectionType],
    ) -> Result<(), ServiceError>;
    async fn disconnect(
        &self,
        session: &Session,
        channel_ids: &[String],
        client_ids: &[String],
        conn_types: &[ConnectionType],
    ) -> Result<(), ServiceError>;
}

pub struct ChannelsService {
    repo: Arc<dyn ChannelRepository>,
    policy: Arc<dyn PolicyService>,
    roles: Arc<dyn RoleProvisioner>,
}

impl ChannelsService {
    pub fn new(
        repo: Arc<dyn ChannelRepository>,
        policy: Arc<dyn PolicyService>,
        roles: Arc<dyn RoleProvisioner>,
    ) -> Self {
        Self { repo, policy, roles }
    }

    fn domain_policy(channel: &Channel) -> PolicyReq {
        PolicyReq::relation(
            EntityType::Domains.policy_type(),
            &channel.domain_id,
            DOMAIN_RELATION,
            EntityType::Channels.policy_type(),
            &channel.id,
        )
        .with_domain(&channel.domain_id)
    }

    fn parent_policy(channel: &Channel, group_id: &str) -> PolicyReq {
        PolicyReq::relation(
            EntityType::Groups.policy_type(),
            group_id,
            PARENT_GROUP_RELATION,
            EntityType::Channels.policy_type(),
            &channel.id,
        )
        .with_domain(&channel.domain_id)
    }

    fn connection_policy(conn: &Connection) -> PolicyReq {
        PolicyReq::relation(
            EntityType::Clients.policy_type(),
            &conn.client_id,
            conn.conn_type.relation(),
            EntityType::Channels.policy_type(),
            &conn.channel_id,
        )
        .with_domain(&conn.domain_id)
    }

    fn build_channel(session: &Session, new: NewChannel) -> Channel {
        Channel {
            id: new.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: new.name,
            domain_id: session.domain_id().to_string(),
            tags: new.tags,
            parent_group: None,
            route: new.route,
            metadata: new.metadata,
            status: ChannelStatus::Enabled,
            created_by: session.user_id().to_string(),
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        }
    }

    async fn save_update(
        &self,
        session: &Session,
        mut channel: Channel,
    ) -> Result<Channel, ServiceError> {
        channel.updated_by = Some(session.user_id().to_string());
        channel.updated_at = Some(Utc::now());
        self.repo.update(channel).await
    }

    async fn change_status(
        &self,
        session: &Session,
        id: &str,
        status: ChannelStatus,
    ) -> Result<Channel, ServiceError> {
        let mut channel = self.repo.retrieve_by_id(id).await?;
        if channel.status == status {
            return Err(ServiceError::Conflict(format!("channel already {}", status)));
        }
        channel.status = status;
        self.save_update(session, channel).await
    }

    /// Channels in the session's domain. Foreign channels read as missing.
    async fn domain_channel(&self, session: &Session, id: &str) -> Result<Channel, ServiceError> {
        let channel = self.repo.retrieve_by_id(id).await?;
        if channel.domain_id != session.domain_id() {
            return Err(ServiceError::NotFound(format!("channel {}", id)));
        }
        Ok(channel)
    }

    fn connections(
        session: &Session,
        channel_ids: &[String],
        client_ids: &[String],
        conn_types: &[ConnectionType],
    ) -> Result<Vec<Connection>, ServiceError> {
        if channel_ids.is_empty() || client_ids.is_empty() || conn_types.is_empty() {
            return Err(ServiceError::Validation(
                "channels, clients and connection types must not be empty".to_string(),
            ));
        }

        let mut conns = Vec::new();
        for channel_id in channel_ids {
            for client_id in client_ids {
                for conn_type in conn_types {
                    let conn = Connection {
                        client_id: client_id.clone(),
                        channel_id: channel_id.clone(),
                        domain_id: session.domain_id().to_string(),
                        conn_type: *conn_type,
                    };
                    if !conns.contains(&conn) {
                        conns.push(conn);
                    }
                }
            }
        }
        Ok(conns)
    }
}

#[async_trait]
impl ChannelService for ChannelsService {
    async fn create_channels(
        &self,
        session: &Session,
        channels: Vec<NewChannel>,
    ) -> Result<Vec<Channel>, ServiceError> {
        for channel in &channels {
            channel.validate()?;
        }

        let channels: Vec<Channel> = channels
            .into_iter()
            .map(|new| Self::build_channel(session, new))
            .collect();
        let saved = self.repo.save(&channels).await?;

        let ids: Vec<String> = saved.iter().map(|c| c.id.clone()).collect();
        let optional_policies: Vec<PolicyReq> = saved.iter().map(Self::domain_policy).collect();
        let members = HashMap::from([(
            BUILTIN_ADMIN_ROLE.to_string(),
            vec![session.domain_user_id().to_string()],
        )]);

        if let Err(e) = self
            .roles
            .add_new_entities_roles(
                session.domain_id(),
                session.user_id(),
                &ids,
                &optional_policies,
                &members,
            )
            .await
        {
            let rollback = self.repo.delete(&ids).await;
            tracing::error!(
                domain_id = %session.domain_id(),
                channels = ids.len(),
                error = %e,
                rollback_ok = rollback.is_ok(),
                "Channel role provisioning failed, rolling back"
            );
            return Err(ServiceError::rolled_back(e, rollback));
        }

        Ok(saved)
    }

    async fn view_channel(&self, _session: &Session, id: &str) -> Result<Channel, ServiceError> {
        self.repo.retrieve_by_id(id).await
    }

    async fn list_channels(
        &self,
        session: &Session,
        page: PageMeta,
    ) -> Result<ChannelsPage, ServiceError> {
        if session.is_super_admin() {
            return self.repo.retrieve_all(session.domain_id(), None, &page).await;
        }

        let ids = self.roles.member_entities(session.domain_user_id()).await?;
        self.repo
            .retrieve_all(session.domain_id(), Some(&ids), &page)
            .await
    }

    async fn update_channel(
        &self,
        session: &Session,
        id: &str,
        update: UpdateChannel,
    ) -> Result<Channel, ServiceError> {
        update.validate()?;
        let mut channel = self.repo.retrieve_by_id(id).await?;
        if let Some(name) = update.name {
            channel.name = name;
        }
        if let Some(metadata) = update.metadata {
            channel.metadata = metadata;
        }
        self.save_update(session, channel).await
    }

    async fn update_channel_tags(
        &self,
        session: &Session,
        id: &str,
        tags: Vec<String>,
    ) -> Result<Channel, ServiceError> {
        let mut channel = self.repo.retrieve_by_id(id).await?;
        channel.tags = tags;
        self.save_update(session, channel).await
    }

    async fn enable_channel(&self, session: &Session, id: &str) -> Result<Channel, ServiceError> {
        self.change_status(session, id, ChannelStatus::Enabled).await
    }

    async fn disable_channel(&self, session: &Session, id: &str) -> Result<Channel, ServiceError> {
        self.change_status(session, id, ChannelStatus::Disabled).await
    }

    async fn delete_channel(&self, _session: &Session, id: &str) -> Result<(), ServiceError> {
        let channel = self.repo.retrieve_by_id(id).await?;

        let mut policies = vec![Self::domain_policy(&channel)];
        if let Some(parent) = &channel.parent_group {
            policies.push(Self::parent_policy(&channel, parent));
        }
        let conns = self.repo.channel_connections(id).await?;
        policies.extend(conns.iter().map(Self::connection_policy));
        self.policy
            .delete_policies(&policies)
            .await
            .map_err(ServiceError::Policy)?;

        let ids = vec![channel.id];
        self.roles.remove_entities_roles(&ids).await?;
        self.repo.delete(&ids).await
    }

    async fn set_parent_group(
        &self,
        session: &Session,
        parent_group_id: &str,
        id: &str,
    ) -> Result<(), ServiceError> {
        let mut channel = self.repo.retrieve_by_id(id).await?;
        match channel.parent_group.as_deref() {
            Some(current) if current == parent_group_id => return Ok(()),
            Some(current) => {
                return Err(ServiceError::Conflict(format!(
                    "channel {} already has parent group {}",
                    id, current
                )))
            }
            None => {}
        }

        let policy = Self::parent_policy(&channel, parent_group_id);
        self.policy
            .add_policies(std::slice::from_ref(&policy))
            .await
            .map_err(ServiceError::Policy)?;

        channel.parent_group = Some(parent_group_id.to_string());
        if let Err(e) = self.save_update(session, channel).await {
            if let Err(rollback) = self.policy.delete_policies(&[policy]).await {
                return Err(ServiceError::RollbackFailed {
                    source: Box::new(e),
                    rollback: Box::new(ServiceError::Policy(rollback)),
                });
            }
            return Err(e);
        }
        Ok(())
    }

    async fn remove_parent_group(&self, session: &Session, id: &str) -> Result<(), ServiceError> {
        let mut channel = self.repo.retrieve_by_id(id).await?;
        let Some(parent) = channel.parent_group.take() else {
            return Ok(());
        };

        self.policy
            .delete_policies(&[Self::parent_policy(&channel, &parent)])
            .await
            .map_err(ServiceError::Policy)?;
        self.save_update(session, channel).await?;
        Ok(())
    }

    async fn connect(
        &self,
        session: &Session,
        channel_ids: &[String],
        client_ids: &[String],
        conn_types: &[ConnectionType],
    ) -> Result<(), ServiceError> {
        let requested = Self::connections(session, channel_ids, client_ids, conn_types)?;

        for channel_id in channel_ids {
            let channel = self.domain_channel(session, channel_id).await?;
            if channel.status != ChannelStatus::Enabled {
                return Err(ServiceError::Conflict(format!(
                    "channel {} is disabled",
                    channel_id
                )));
            }
        }

        let mut conns = Vec::with_capacity(requested.len());
        for conn in requested {
            if !self.repo.check_connection(&conn).await? {
                conns.push(conn);
            }
        }
        if conns.is_empty() {
            return Ok(());
        }

        let policies: Vec<PolicyReq> = conns.iter().map(Self::connection_policy).collect();
        self.policy
            .add_policies(&policies)
            .await
            .map_err(ServiceError::Policy)?;

        if let Err(e) = self.repo.add_connections(&conns).await {
            tracing::warn!(
                domain_id = %session.domain_id(),
                connections = conns.len(),
                error = %e,
                "Saving connections failed, removing their policies"
            );
            if let Err(rollback) = self.policy.delete_policies(&policies).await {
                return Err(ServiceError::RollbackFailed {
                    source: Box::new(e),
                    rollback: Box::new(ServiceError::Policy(rollback)),
                });
            }
            return Err(e);
        }
        Ok(())
    }

    async fn disconnect(
        &self,
        session: &Session,
        channel_ids: &[String],
        client_ids: &[String],
        conn_types: &[ConnectionType],
    ) -> Result<(), ServiceError> {
        let conns = Self::connections(session, channel_ids, client_ids, conn_types)?;
        for channel_id in channel_ids {
            self.domain_channel(session, channel_id).await?;
        }

        let policies: Vec<PolicyReq> = conns.iter().map(Self::connection_policy).collect();
        self.policy
            .delete_policies(&policies)
            .await
            .map_err(ServiceError::Policy)?;
        self.repo.remove_connections(&conns).await
    }
}
