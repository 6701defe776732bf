use async_trait::async_trait;
use authz_core::models::policy::PLATFORM_OBJECT;
use authz_core::models::{
    encode_domain_user_id, EntityType, PageMeta, PolicyReq, Session, BUILTIN_ADMIN_ROLE,
};
use authz_core::services::RoleProvisioner;
use authz_core::ServiceError;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::repository::DomainRepository;
use crate::models::{Domain, DomainStatus, DomainsPage, NewDomain, UpdateDomain};

const PLATFORM_RELATION: &str = "platform";

#[async_trait]
pub trait DomainService: Send + Sync {
    async fn create_domain(&self, session: &Session, domain: NewDomain)
        -> Result<Domain, ServiceError>;
    async fn retrieve_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError>;
    async fn update_domain(
        &self,
        session: &Session,
        id: &str,
        update: UpdateDomain,
    ) -> Result<Domain, ServiceError>;
    async fn enable_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError>;
    async fn disable_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError>;
    /// Platform administrators only.
    async fn freeze_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError>;
    async fn list_domains(&self, session: &Session, page: PageMeta)
        -> Result<DomainsPage, ServiceError>;
}

pub struct DomainsService {
    repo: Arc<dyn DomainRepository>,
    roles: Arc<dyn RoleProvisioner>,
}

impl DomainsService {
    pub fn new(repo: Arc<dyn DomainRepository>, roles: Arc<dyn RoleProvisioner>) -> Self {
        Self { repo, roles }
    }

    fn platform_policy(domain_id: &str) -> PolicyReq {
        PolicyReq::relation(
            EntityType::Platform.policy_type(),
            PLATFORM_OBJECT,
            PLATFORM_RELATION,
            EntityType::Domains.policy_type(),
            domain_id,
        )
        .with_domain(domain_id)
    }

    async fn save_update(&self, session: &Session, mut domain: Domain) -> Result<Domain, ServiceError> {
        domain.updated_by = Some(session.user_id().to_string());
        domain.updated_at = Some(Utc::now());
        self.repo.update(domain).await
    }

    async fn change_status(
        &self,
        session: &Session,
        id: &str,
        status: DomainStatus,
    ) -> Result<Domain, ServiceError> {
        let mut domain = self.repo.retrieve_by_id(id).await?;
        if domain.status == status {
            return Err(ServiceError::Conflict(format!("domain already {}", status)));
        }
        if domain.status == DomainStatus::Frozen && !session.is_super_admin() {
            return Err(ServiceError::Conflict(format!("domain {} is frozen", id)));
        }
        domain.status = status;
        self.save_update(session, domain).await
    }
}

#[async_trait]
impl DomainService for DomainsService {
    async fn create_domain(
        &self,
        session: &Session,
        new: NewDomain,
    ) -> Result<Domain, ServiceError> {
        new.validate()?;

        let domain = Domain {
            id: new.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: new.name,
            route: new.route,
            tags: new.tags,
            metadata: new.metadata,
            status: DomainStatus::Enabled,
            created_by: session.user_id().to_string(),
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        };
        let domain = self.repo.save(domain).await?;

        // The creator's identity inside the new domain.
        let admin = encode_domain_user_id(&domain.id, session.user_id());
        let members = HashMap::from([(BUILTIN_ADMIN_ROLE.to_string(), vec![admin])]);
        let ids = vec![domain.id.clone()];

        if let Err(e) = self
            .roles
            .add_new_entities_roles(
                &domain.id,
                session.user_id(),
                &ids,
                &[Self::platform_policy(&domain.id)],
                &members,
            )
            .await
        {
            let rollback = self.repo.delete(&domain.id).await;
            tracing::error!(
                domain_id = %domain.id,
                error = %e,
                rollback_ok = rollback.is_ok(),
                "Domain role provisioning failed, rolling back"
            );
            return Err(ServiceError::rolled_back(e, rollback));
        }

        Ok(domain)
    }

    async fn retrieve_domain(&self, _session: &Session, id: &str) -> Result<Domain, ServiceError> {
        self.repo.retrieve_by_id(id).await
    }

    async fn update_domain(
        &self,
        session: &Session,
        id: &str,
        update: UpdateDomain,
    ) -> Result<Domain, ServiceError> {
        update.validate()?;
        let mut domain = self.repo.retrieve_by_id(id).await?;
        if let Some(name) = update.name {
            domain.name = name;
        }
        if let Some(tags) = update.tags {
            domain.tags = tags;
        }
        if let Some(metadata) = update.metadata {
            domain.metadata = metadata;
        }
        self.save_update(session, domain).await
    }

    async fn enable_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError> {
        self.change_status(session, id, DomainStatus::Enabled).await
    }

    async fn disable_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError> {
        self.change_status(session, id, DomainStatus::Disabled).await
    }

    async fn freeze_domain(&self, session: &Session, id: &str) -> Result<Domain, ServiceError> {
        self.change_status(session, id, DomainStatus::Frozen).await
    }

    async fn list_domains(
        &self,
        session: &Session,
        page: PageMeta,
    ) -> Result<DomainsPage, ServiceError> {
        if session.is_super_admin() {
            return self.repo.retrieve_all(None, &page).await;
        }

        let ids = self.roles.user_entities(session.user_id()).await?;
        self.repo.retrieve_all(Some(&ids), &page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_policy_links_domain() {
        let policy = DomainsService::platform_policy("d1");
        assert_eq!(policy.subject_type, "platform");
        assert_eq!(policy.object_type, "domain");
        assert_eq!(policy.object, "d1");
        assert_eq!(policy.relation, "platform");
    }
}
