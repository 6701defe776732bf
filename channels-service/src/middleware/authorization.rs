use async_trait::async_trait;
use authz_core::middleware::AuthorizationMiddleware;
use authz_core::models::{EntityType, PageMeta, Session};
use authz_core::ServiceError;
use std::sync::Arc;

use crate::models::{Channel, ChannelsPage, ConnectionType, NewChannel, UpdateChannel};
use crate::operations::{ChannelExternalOperation, ChannelOperation};
use crate::services::{ChannelRepository, ChannelService};

pub type ChannelsAuthorization<S> = AuthorizationMiddleware<
    S,
    ChannelOperation,
    ChannelExternalOperation,
    Arc<dyn ChannelRepository>,
>;

/// Channel-side check on every channel, then client-side check on every
/// client. Any denial stops before the wrapped service runs.
async fn authorize_connections<S>(
    authz: &ChannelsAuthorization<S>,
    session: &Session,
    local: ChannelOperation,
    external: ChannelExternalOperation,
    channel_ids: &[String],
    client_ids: &[String],
) -> Result<(), ServiceError> {
    for channel_id in channel_ids {
        authz.authorize(session, local, channel_id).await?;
    }
    for client_id in client_ids {
        authz
            .authorize_external(session, external, EntityType::Clients, client_id)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl<S: ChannelService> ChannelService for ChannelsAuthorization<S> {
    async fn create_channels(
        &self,
        session: &Session,
        channels: Vec<NewChannel>,
    ) -> Result<Vec<Channel>, ServiceError> {
        self.authorize_external(
            session,
            ChannelExternalOperation::DomainCreateChannel,
            EntityType::Domains,
            session.domain_id(),
        )
        .await?;
        self.inner().create_channels(session, channels).await
    }

    async fn view_channel(&self, session: &Session, id: &str) -> Result<Channel, ServiceError> {
        self.authorize(session, ChannelOperation::View, id).await?;
        self.inner().view_channel(session, id).await
    }

    async fn list_channels(
        &self,
        session: &Session,
        page: PageMeta,
    ) -> Result<ChannelsPage, ServiceError> {
        if !session.is_pat() {
            match self.check_super_admin(session).await {
                Ok(admin) => return self.inner().list_channels(&admin, page).await,
                Err(ServiceError::Timeout) => return Err(ServiceError::Timeout),
                Err(_) => {}
            }
        }

        self.authorize_external(
            session,
            ChannelExternalOperation::DomainListChannels,
            EntityType::Domains,
            session.domain_id(),
        )
        .await?;
        self.inner().list_channels(session, page).await
    }

    async fn update_channel(
        &self,
        session: &Session,
        id: &str,
        update: UpdateChannel,
    ) -> Result<Channel, ServiceError> {
        self.authorize(session, ChannelOperation::Update, id).await?;
        self.inner().update_channel(session, id, update).await
    }

    async fn update_channel_tags(
        &self,
        session: &Session,
        id: &str,
        tags: Vec<String>,
    ) -> Result<Channel, ServiceError> {
        self.authorize(session, ChannelOperation::UpdateTags, id)
            .await?;
        self.inner().update_channel_tags(session, id, tags).await
    }

    async fn enable_channel(&self, session: &Session, id: &str) -> Result<Channel, ServiceError> {
        self.authorize(session, ChannelOperation::Enable, id).await?;
        self.inner().enable_channel(session, id).await
    }

    async fn disable_channel(&self, session: &Session, id: &str) -> Result<Channel, ServiceError> {
        self.authorize(session, ChannelOperation::Disable, id).await?;
        self.inner().disable_channel(session, id).await
    }

    async fn delete_channel(&self, session: &Session, id: &str) -> Result<(), ServiceError> {
        self.authorize(session, ChannelOperation::Delete, id).await?;
        self.inner().delete_channel(session, id).await
    }

    async fn set_parent_group(
        &self,
        session: &Session,
        parent_group_id: &str,
        id: &str,
    ) -> Result<(), ServiceError> {
        self.authorize(session, ChannelOperation::SetParentGroup, id)
            .await?;
        self.authorize_external(
            session,
            ChannelExternalOperation::GroupSetChildChannel,
            EntityType::Groups,
            parent_group_id,
        )
        .await?;
        self.inner()
            .set_parent_group(session, parent_group_id, id)
            .await
    }

    async fn remove_parent_group(&self, session: &Session, id: &str) -> Result<(), ServiceError> {
        self.authorize(session, ChannelOperation::RemoveParentGroup, id)
            .await?;
        // The parent is checked as stored before the removal.
        let channel = self.repository().retrieve_by_id(id).await?;
        if let Some(parent) = channel.parent_group.as_deref() {
            self.authorize_external(
                session,
                ChannelExternalOperation::GroupRemoveChildChannel,
                EntityType::Groups,
                parent,
            )
            .await?;
        }
        self.inner().remove_parent_group(session, id).await
    }

    async fn connect(
        &self,
        session: &Session,
        channel_ids: &[String],
        client_ids: &[String],
        conn_types: &[ConnectionType],
    ) -> Result<(), ServiceError> {
        authorize_connections(
            self,
            session,
            ChannelOperation::Connect,
            ChannelExternalOperation::ClientConnectChannel,
            channel_ids,
            client_ids,
        )
        .await?;
        self.inner()
            .connect(session, channel_ids, client_ids, conn_types)
            .await
    }

    async fn disconnect(
        &self,
        session: &Session,
        channel_ids: &[String],
        client_ids: &[String],
        conn_types: &[ConnectionType],
    ) -> Result<(), ServiceError> {
        authorize_connections(
            self,
            session,
            ChannelOperation::Disconnect,
            ChannelExternalOperation::ClientDisconnectChannel,
            channel_ids,
            client_ids,
        )
        .await?;
        self.inner()
            .disconnect(session, channel_ids, client_ids, conn_types)
            .await
    }
}
