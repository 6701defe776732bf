use async_trait::async_trait;
use authz_core::middleware::AuthorizationMiddleware;
use authz_core::models::policy::ANY_IDS;
use authz_core::models::{PageMeta, PatOperation, Session};
use authz_core::ServiceError;

use crate::models::{Domain, DomainsPage, NewDomain, UpdateDomain};
use crate::operations::DomainOperation;
use crate::services::DomainService;

pub type DomainsAuthorization<S> = AuthorizationMiddleware<S, DomainOperation>;

#[async_trait]
impl<S: DomainService> DomainService for DomainsAuthorization<S> {
    /// Any authenticated user may open a new domain and becomes its admin.
    /// A PAT still needs a create scope.
    async fn create_domain(
        &self,
        session: &Session,
        domain: NewDomain,
    ) -> Result<Domain, ServiceError> {
        self.authorize_pat_only(session, PatOperation::Create, ANY_IDS)
            .await?;
        self.inner().create_domain(session, domain).await
    }

    async fn retrieve_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError> {
        self.authorize(session, DomainOperation::Retrieve, id).await?;
        self.inner().retrieve_domain(session, id).await
    }

    async fn update_domain(
        &self,
        session: &Session,
        id: &str,
        update: UpdateDomain,
    ) -> Result<Domain, ServiceError> {
        self.authorize(session, DomainOperation::Update, id).await?;
        self.inner().update_domain(session, id, update).await
    }

    async fn enable_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError> {
        self.authorize(session, DomainOperation::Enable, id).await?;

        // A platform admin's session is elevated so a frozen domain can be lifted.
        let elevated = if session.is_pat() {
            None
        } else {
            match self.check_super_admin(session).await {
                Ok(admin) => Some(admin),
                Err(ServiceError::Timeout) => return Err(ServiceError::Timeout),
                Err(_) => None,
            }
        };
        self.inner()
            .enable_domain(elevated.as_ref().unwrap_or(session), id)
            .await
    }

    async fn disable_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError> {
        self.authorize(session, DomainOperation::Disable, id).await?;
        self.inner().disable_domain(session, id).await
    }

    async fn freeze_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError> {
        let admin = self.check_super_admin(session).await?;
        self.inner().freeze_domain(&admin, id).await
    }

    async fn list_domains(
        &self,
        session: &Session,
        page: PageMeta,
    ) -> Result<DomainsPage, ServiceError> {
        if session.is_pat() {
            self.authorize_pat_only(session, PatOperation::List, ANY_IDS)
                .await?;
            return self.inner().list_domains(session, page).await;
        }

        match self.check_super_admin(session).await {
            Ok(admin) => self.inner().list_domains(&admin, page).await,
            Err(ServiceError::Timeout) => Err(ServiceError::Timeout),
            Err(_) => self.inner().list_domains(session, page).await,
        }
    }
}
