use async_trait::async_trait;
use authz_core::models::PageMeta;
use authz_core::ServiceError;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::models::{Domain, DomainsPage};

#[async_trait]
pub trait DomainRepository: Send + Sync {
    async fn save(&self, domain: Domain) -> Result<Domain, ServiceError>;
    async fn retrieve_by_id(&self, id: &str) -> Result<Domain, ServiceError>;
    /// All domains, restricted to `ids` when given.
    async fn retrieve_all(
        &self,
        ids: Option<&[String]>,
        page: &PageMeta,
    ) -> Result<DomainsPage, ServiceError>;
    async fn update(&self, domain: Domain) -> Result<Domain, ServiceError>;
    async fn delete(&self, id: &str) -> Result<(), ServiceError>;
}

#[derive(Default)]
pub struct InMemoryDomainRepository {
    domains: DashMap<String, (u64, Domain)>,
    seq: AtomicU64,
    fail_deletes: AtomicBool,
}

impl InMemoryDomainRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.domains.contains_key(id)
    }
}

#[async_trait]
impl DomainRepository for InMemoryDomainRepository {
    async fn save(&self, domain: Domain) -> Result<Domain, ServiceError> {
        if self.domains.contains_key(&domain.id) {
            return Err(ServiceError::Conflict(format!("domain {} already exists", domain.id)));
        }
        if self.domains.iter().any(|entry| entry.1.route == domain.route) {
            return Err(ServiceError::Conflict(format!(
                "route {} already in use",
                domain.route
            )));
        }

        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.domains.insert(domain.id.clone(), (seq, domain.clone()));
        Ok(domain)
    }

    async fn retrieve_by_id(&self, id: &str) -> Result<Domain, ServiceError> {
        self.domains
            .get(id)
            .map(|entry| entry.1.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("domain {}", id)))
    }

    async fn retrieve_all(
        &self,
        ids: Option<&[String]>,
        page: &PageMeta,
    ) -> Result<DomainsPage, ServiceError> {
        let mut matched: Vec<(u64, Domain)> = self
            .domains
            .iter()
            .filter(|entry| ids.map_or(true, |ids| ids.contains(&entry.1.id)))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by_key(|(seq, _)| *seq);

        let domains: Vec<Domain> = matched.into_iter().map(|(_, d)| d).collect();
        let (total, domains) = page.paginate(&domains);
        Ok(DomainsPage {
            total,
            offset: page.offset,
            limit: page.limit,
            domains,
        })
    }

    async fn update(&self, domain: Domain) -> Result<Domain, ServiceError> {
        let mut entry = self
            .domains
            .get_mut(&domain.id)
            .ok_or_else(|| ServiceError::NotFound(format!("domain {}", domain.id)))?;
        entry.1 = domain.clone();
        Ok(domain)
    }

    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ServiceError::Repository(anyhow::anyhow!(
                "failed to delete domain"
            )));
        }
        self.domains.remove(id);
        Ok(())
    }
}
