use async_trait::async_trait;
use authz_core::middleware::AuthorizationMiddleware;
use authz_core::models::{EntityType, PageMeta, Session};
use authz_core::ServiceError;
use std::sync::Arc;

use crate::models::{Client, ClientsPage, NewClient, UpdateClient};
use crate::operations::{ClientExternalOperation, ClientOperation};
use crate::services::{ClientRepository, ClientService};

pub type ClientsAuthorization<S> =
    AuthorizationMiddleware<S, ClientOperation, ClientExternalOperation, Arc<dyn ClientRepository>>;

#[async_trait]
impl<S: ClientService> ClientService for ClientsAuthorization<S> {
    async fn create_clients(
        &self,
        session: &Session,
        clients: Vec<NewClient>,
    ) -> Result<Vec<Client>, ServiceError> {
        self.authorize_external(
            session,
            ClientExternalOperation::DomainCreateClient,
            EntityType::Domains,
            session.domain_id(),
        )
        .await?;
        self.inner().create_clients(session, clients).await
    }

    async fn view_client(&self, session: &Session, id: &str) -> Result<Client, ServiceError> {
        self.authorize(session, ClientOperation::View, id).await?;
        self.inner().view_client(session, id).await
    }

    async fn list_clients(
        &self,
        session: &Session,
        page: PageMeta,
    ) -> Result<ClientsPage, ServiceError> {
        if !session.is_pat() {
            match self.check_super_admin(session).await {
                Ok(admin) => return self.inner().list_clients(&admin, page).await,
                Err(ServiceError::Timeout) => return Err(ServiceError::Timeout),
                Err(_) => {}
            }
        }

        self.authorize_external(
            session,
            ClientExternalOperation::DomainListClients,
            EntityType::Domains,
            session.domain_id(),
        )
        .await?;
        self.inner().list_clients(session, page).await
    }

    async fn update_client(
        &self,
        session: &Session,
        id: &str,
        update: UpdateClient,
    ) -> Result<Client, ServiceError> {
        self.authorize(session, ClientOperation::Update, id).await?;
        self.inner().update_client(session, id, update).await
    }

    async fn update_client_tags(
        &self,
        session: &Session,
        id: &str,
        tags: Vec<String>,
    ) -> Result<Client, ServiceError> {
        self.authorize(session, ClientOperation::UpdateTags, id).await?;
        self.inner().update_client_tags(session, id, tags).await
    }

    async fn update_client_secret(
        &self,
        session: &Session,
        id: &str,
        secret: Option<String>,
    ) -> Result<Client, ServiceError> {
        self.authorize(session, ClientOperation::UpdateSecret, id)
            .await?;
        self.inner().update_client_secret(session, id, secret).await
    }

    async fn enable_client(&self, session: &Session, id: &str) -> Result<Client, ServiceError> {
        self.authorize(session, ClientOperation::Enable, id).await?;
        self.inner().enable_client(session, id).await
    }

    async fn disable_client(&self, session: &Session, id: &str) -> Result<Client, ServiceError> {
        self.authorize(session, ClientOperation::Disable, id).await?;
        self.inner().disable_client(session, id).await
    }

    async fn delete_client(&self, session: &Session, id: &str) -> Result<(), ServiceError> {
        self.authorize(session, ClientOperation::Delete, id).await?;
        self.inner().delete_client(session, id).await
    }

    async fn set_parent_group(
        &self,
        session: &Session,
        parent_group_id: &str,
        id: &str,
    ) -> Result<(), ServiceError> {
        self.authorize(session, ClientOperation::SetParentGroup, id)
            .await?;
        self.authorize_external(
            session,
            ClientExternalOperation::GroupSetChildClient,
            EntityType::Groups,
            parent_group_id,
        )
        .await?;
        self.inner()
            .set_parent_group(session, parent_group_id, id)
            .await
    }

    async fn remove_parent_group(&self, session: &Session, id: &str) -> Result<(), ServiceError> {
        // The removal is checked against the parent the client has now.
        self.authorize(session, ClientOperation::RemoveParentGroup, id)
            .await?;
        // The parent is checked as stored before the removal.
        let client = self.repository().retrieve_by_id(id).await?;
        if let Some(parent) = client.parent_group.as_deref() {
            self.authorize_external(
                session,
                ClientExternalOperation::GroupRemoveChildClient,
                EntityType::Groups,
                parent,
            )
            .await?;
        }
        self.inner().remove_parent_group(session, id).await
    }
}
