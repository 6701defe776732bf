use async_trait::async_trait;
use authz_core::middleware::LoggingMiddleware;
use authz_core::models::{PageMeta, Session};
use authz_core::ServiceError;

use crate::models::{Client, ClientsPage, NewClient, UpdateClient};
use crate::services::ClientService;

#[async_trait]
impl<S: ClientService> ClientService for LoggingMiddleware<S> {
    async fn create_clients(
        &self,
        session: &Session,
        clients: Vec<NewClient>,
    ) -> Result<Vec<Client>, ServiceError> {
        let count = clients.len().to_string();
        self.logged(
            "create_clients",
            session,
            &count,
            self.inner().create_clients(session, clients),
        )
        .await
    }

    async fn view_client(&self, session: &Session, id: &str) -> Result<Client, ServiceError> {
        self.logged("view_client", session, id, self.inner().view_client(session, id))
            .await
    }

    async fn list_clients(
        &self,
        session: &Session,
        page: PageMeta,
    ) -> Result<ClientsPage, ServiceError> {
        self.logged(
            "list_clients",
            session,
            session.domain_id(),
            self.inner().list_clients(session, page),
        )
        .await
    }

    async fn update_client(
        &self,
        session: &Session,
        id: &str,
        update: UpdateClient,
    ) -> Result<Client, ServiceError> {
        self.logged(
            "update_client",
            session,
            id,
            self.inner().update_client(session, id, update),
        )
        .await
    }

    async fn update_client_tags(
        &self,
        session: &Session,
        id: &str,
        tags: Vec<String>,
    ) -> Result<Client, ServiceError> {
        self.logged(
            "update_client_tags",
            session,
            id,
            self.inner().update_client_tags(session, id, tags),
        )
        .await
    }

    async fn update_client_secret(
        &self,
        session: &Session,
        id: &str,
        secret: Option<String>,
    ) -> Result<Client, ServiceError> {
        self.logged(
            "update_client_secret",
            session,
            id,
            self.inner().update_client_secret(session, id, secret),
        )
        .await
    }

    async fn enable_client(&self, session: &Session, id: &str) -> Result<Client, ServiceError> {
        self.logged("enable_client", session, id, self.inner().enable_client(session, id))
            .await
    }

    async fn disable_client(&self, session: &Session, id: &str) -> Result<Client, ServiceError> {
        self.logged("disable_client", session, id, self.inner().disable_client(session, id))
            .await
    }

    async fn delete_client(&self, session: &Session, id: &str) -> Result<(), ServiceError> {
        self.logged("delete_client", session, id, self.inner().delete_client(session, id))
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
}
