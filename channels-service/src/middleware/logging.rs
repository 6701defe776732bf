use async_trait::async_trait;
use authz_core::middleware::LoggingMiddleware;
use authz_core::models::{PageMeta, Session};
use authz_core::ServiceError;

use crate::models::{Channel, ChannelsPage, ConnectionType, NewChannel, UpdateChannel};
use crate::services::ChannelService;

#[async_trait]
impl<S: ChannelService> ChannelService for LoggingMiddleware<S> {
    async fn create_channels(
        &self,
        session: &Session,
        channels: Vec<NewChannel>,
    ) -> Result<Vec<Channel>, ServiceError> {
        let count = channels.len().to_string();
        self.logged(
            "create_channels",
            session,
            &count,
            self.inner().create_channels(session, channels),
        )
        .await
    }

    async fn view_channel(&self, session: &Session, id: &str) -> Result<Channel, ServiceError> {
        self.logged("view_channel", session, id, self.inner().view_channel(session, id))
            .await
    }

    async fn list_channels(
        &self,
        session: &Session,
        page: PageMeta,
    ) -> Result<ChannelsPage, ServiceError> {
        self.logged(
            "list_channels",
            session,
            session.domain_id(),
            self.inner().list_channels(session, page),
        )
        .await
    }

    async fn update_channel(
        &self,
        session: &Session,
        id: &str,
        update: UpdateChannel,
    ) -> Result<Channel, ServiceError> {
        self.logged(
            "update_channel",
            session,
            id,
            self.inner().update_channel(session, id, update),
        )
        .await
    }

    async fn update_channel_tags(
        &self,
        session: &Session,
        id: &str,
        tags: Vec<String>,
    ) -> Result<Channel, ServiceError> {
        self.logged(
            "update_channel_tags",
            session,
            id,
            self.inner().update_channel_tags(session, id, tags),
        )
        .await
    }

    async fn enable_channel(&self, session: &Session, id: &str) -> Result<Channel, ServiceError> {
        self.logged("enable_channel", session, id, self.inner().enable_channel(session, id))
            .await
    }

    async fn disable_channel(&self, session: &Session, id: &str) -> Result<Channel, ServiceError> {
        self.logged("disable_channel", session, id, self.inner().disable_channel(session, id))
            .await
    }

    async fn delete_channel(&self, session: &Session, id: &str) -> Result<(), ServiceError> {
        self.logged("delete_channel", session, id, self.inner().delete_channel(session, id))
            .await
    }

    async fn set_parent_group(
        &self,
        session: &Session,
        parent_group_id: &str,
        id: &str,
    ) -> Result<(), ServiceError> {
        self.logged(
            "set_parent_group",
            session,
            id,
            self.inner().set_parent_group(session, parent_group_id, id),
        )
        .await
    }

    async fn remove_parent_group(&self, session: &Session, id: &str) -> Result<(), ServiceError> {
        self.logged(
            "remove_parent_group",
            session,
            id,
            self.inner().remove_parent_group(session, id),
        )
        .await
    }

    async fn connect(
        &self,
        session: &Session,
        channel_ids: &[String],
        client_ids: &[String],
        conn_types: &[ConnectionType],
    ) -> Result<(), ServiceError> {
        let channels = channel_ids.join(",");
        self.logged(
            "connect",
            session,
            &channels,
            self.inner().connect(session, channel_ids, client_ids, conn_types),
        )
        .await
    }

    async fn disconnect(
        &self,
        session: &Session,
        channel_ids: &[String],
        client_ids: &[String],
        conn_types: &[ConnectionType],
    ) -> Result<(), ServiceError> {
        let channels = channel_ids.join(",");
        self.logged(
            "disconnect",
            session,
            &channels,
            self.inner().disconnect(session, channel_ids, client_ids, conn_types),
        )
        .await
    }
}
