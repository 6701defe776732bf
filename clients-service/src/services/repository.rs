use async_trait::async_trait;
use authz_core::models::PageMeta;
use authz_core::ServiceError;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::models::{Client, ClientsPage};

/// Client persistence. The authorization layer only reads through it.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn save(&self, clients: &[Client]) -> Result<Vec<Client>, ServiceError>;
    async fn retrieve_by_id(&self, id: &str) -> Result<Client, ServiceError>;
    /// Clients of `domain_id`, restricted to `ids` when given.
    async fn retrieve_all(
        &self,
        domain_id: &str,
        ids: Option<&[String]>,
        page: &PageMeta,
    ) -> Result<ClientsPage, ServiceError>;
    async fn update(&self, client: Client) -> Result<Client, ServiceError>;
    async fn delete(&self, ids: &[String]) -> Result<(), ServiceError>;
}

#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: DashMap<String, (u64, Client)>,
    seq: AtomicU64,
    fail_deletes: AtomicBool,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent delete fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.clients.contains_key(id)
    }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn save(&self, clients: &[Client]) -> Result<Vec<Client>, ServiceError> {
        if let Some(dup) = clients.iter().find(|c| self.clients.contains_key(&c.id)) {
            return Err(ServiceError::Conflict(format!("client {} already exists", dup.id)));
        }

        for client in clients {
            let seq = self.seq.fetch_add(1, Ordering::SeqCst);
            self.clients.insert(client.id.clone(), (seq, client.clone()));
        }
        Ok(clients.to_vec())
    }

    async fn retrieve_by_id(&self, id: &str) -> Result<Client, ServiceError> {
        self.clients
            .get(id)
            .map(|entry| entry.1.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("client {}", id)))
    }

    async fn retrieve_all(
        &self,
        domain_id: &str,
        ids: Option<&[String]>,
        page: &PageMeta,
    ) -> Result<ClientsPage, ServiceError> {
        let mut matched: Vec<(u64, Client)> = self
            .clients
            .iter()
            .filter(|entry| domain_id.is_empty() || entry.1.domain_id == domain_id)
            .filter(|entry| ids.map_or(true, |ids| ids.contains(&entry.1.id)))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by_key(|(seq, _)| *seq);

        let clients: Vec<Client> = matched.into_iter().map(|(_, c)| c).collect();
        let (total, clients) = page.paginate(&clients);
        Ok(ClientsPage {
            total,
            offset: page.offset,
            limit: page.limit,
            clients,
        })
    }

    async fn update(&self, client: Client) -> Result<Client, ServiceError> {
        let mut entry = self
            .clients
            .get_mut(&client.id)
            .ok_or_else(|| ServiceError::NotFound(format!("client {}", client.id)))?;
        entry.1 = client.clone();
        Ok(client)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), ServiceError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ServiceError::Repository(anyhow::anyhow!(
                "failed to delete clients"
            )));
        }
        for id in ids {
            self.clients.remove(id);
        }
        Ok(())
    }
}
