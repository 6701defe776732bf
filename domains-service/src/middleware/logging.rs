use async_trait::async_trait;
use authz_core::middleware::LoggingMiddleware;
use authz_core::models::{PageMeta, Session};
use authz_core::ServiceError;

use crate::models::{Domain, DomainsPage, NewDomain, UpdateDomain};
use crate::services::DomainService;

#[async_trait]
impl<S: DomainService> DomainService for LoggingMiddleware<S> {
    async fn create_domain(
        &self,
        session: &Session,
        domain: NewDomain,
    ) -> Result<Domain, ServiceError> {
        let name = domain.name.clone();
        self.logged(
            "create_domain",
            session,
            &name,
            self.inner().create_domain(session, domain),
        )
        .await
    }

    async fn retrieve_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError> {
        self.logged("retrieve_domain", session, id, self.inner().retrieve_domain(session, id))
            .await
    }

    async fn update_domain(
        &self,
        session: &Session,
        id: &str,
        update: UpdateDomain,
    ) -> Result<Domain, ServiceError> {
        self.logged(
            "update_domain",
            session,
            id,
            self.inner().update_domain(session, id, update),
        )
        .await
    }

    async fn enable_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError> {
        self.logged("enable_domain", session, id, self.inner().enable_domain(session, id))
            .await
    }

    async fn disable_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError> {
        self.logged("disable_domain", session, id, self.inner().disable_domain(session, id))
            .await
    }

    async fn freeze_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError> {
        self.logged("freeze_domain", session, id, self.inner().freeze_domain(session, id))
            .await
    }

    async fn list_domains(
        &self,
        session: &Session,
        page: PageMeta,
    ) -> Result<DomainsPage, ServiceError> {
        self.logged(
            "list_domains",
            session,
            "*",
            self.inner().list_domains(session, page),
        )
        .await
    }
}
