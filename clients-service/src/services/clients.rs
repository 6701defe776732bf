use async_trait::async_trait;
use authz_core::models::policy::{DOMAIN_RELATION, PARENT_GROUP_RELATION};
use authz_core::models::{EntityType, PageMeta, PolicyReq, Session, BUILTIN_ADMIN_ROLE};
use authz_core::services::{PolicyService, RoleProvisioner};
use authz_core::ServiceError;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::repository::ClientRepository;
use crate::models::{Client, ClientStatus, ClientsPage, NewClient, UpdateClient};

const SECRET_LENGTH: usize = 32;

/// Client operations, identical with or without decorators.
#[async_trait]
pub trait ClientService: Send + Sync {
    async fn create_clients(
        &self,
        session: &Session,
        clients: Vec<NewClient>,
    ) -> Result<Vec<Client>, ServiceError>;
    async fn view_client(&self, session: &Session, id: &str) -> Result<Client, ServiceError>;
    async fn list_clients(&self, session: &Session, page: PageMeta)
        -> Result<ClientsPage, ServiceError>;
    async fn update_client(
        &self,
        session: &Session,
        id: &str,
        update: UpdateClient,
    ) -> Result<Client, ServiceError>;
    async fn update_client_tags(
        &self,
        session: &Session,
        id: &str,
        tags: Vec<String>,
    ) -> Result<Client, ServiceError>;
    /// Replace the secret. `None` generates a fresh one.
    async fn update_client_secret(
        &self,
        session: &Session,
        id: &str,
        secret: Option<String>,
    ) -> Result<Client, ServiceError>;
    async fn enable_client(&self, session: &Session, id: &str) -> Result<Client, ServiceError>;
    async fn disable_client(&self, session: &Session, id: &str) -> Result<Client, ServiceError>;
    async fn delete_client(&self, session: &Session, id: &str) -> Result<(), ServiceError>;
    async fn set_parent_group(
        &self,
        session: &Session,
        parent_group_id: &str,
        id: &str,
    ) -> Result<(), ServiceError>;
    async fn remove_parent_group(&self, session: &Session, id: &str) -> Result<(), ServiceError>;
}

pub struct ClientsService {
    repo: Arc<dyn ClientRepository>,
    policy: Arc<dyn PolicyService>,
    roles: Arc<dyn RoleProvisioner>,
}

impl ClientsService {
    pub fn new(
        repo: Arc<dyn ClientRepository>,
        policy: Arc<dyn PolicyService>,
        roles: Arc<dyn RoleProvisioner>,
    ) -> Self {
        Self { repo, policy, roles }
    }

    fn domain_policy(client: &Client) -> PolicyReq {
        PolicyReq::relation(
            EntityType::Domains.policy_type(),
            &client.domain_id,
            DOMAIN_RELATION,
            EntityType::Clients.policy_type(),
            &client.id,
        )
        .with_domain(&client.domain_id)
    }

    fn parent_policy(client: &Client, group_id: &str) -> PolicyReq {
        PolicyReq::relation(
            EntityType::Groups.policy_type(),
            group_id,
            PARENT_GROUP_RELATION,
            EntityType::Clients.policy_type(),
            &client.id,
        )
        .with_domain(&client.domain_id)
    }

    fn build_client(session: &Session, new: NewClient) -> Client {
        let secret = new.secret.unwrap_or_else(generate_secret);
        Client {
            id: new.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: new.name,
            domain_id: session.domain_id().to_string(),
            tags: new.tags,
            secret,
            parent_group: None,
            metadata: new.metadata,
            status: ClientStatus::Enabled,
            created_by: session.user_id().to_string(),
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        }
    }

    async fn save_update(&self, session: &Session, mut client: Client) -> Result<Client, ServiceError> {
        client.updated_by = Some(session.user_id().to_string());
        client.updated_at = Some(Utc::now());
        self.repo.update(client).await
    }

    async fn change_status(
        &self,
        session: &Session,
        id: &str,
        status: ClientStatus,
    ) -> Result<Client, ServiceError> {
        let mut client = self.repo.retrieve_by_id(id).await?;
        if client.status == status {
            return Err(ServiceError::Conflict(format!("client already {}", status)));
        }
        client.status = status;
        self.save_update(session, client).await
    }
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect()
}

#[async_trait]
impl ClientService for ClientsService {
    async fn create_clients(
        &self,
        session: &Session,
        clients: Vec<NewClient>,
    ) -> Result<Vec<Client>, ServiceError> {
        for client in &clients {
            client.validate()?;
        }

        let clients: Vec<Client> = clients
            .into_iter()
            .map(|new| Self::build_client(session, new))
            .collect();
        let saved = self.repo.save(&clients).await?;

        let ids: Vec<String> = saved.iter().map(|c| c.id.clone()).collect();
        let optional_policies: Vec<PolicyReq> = saved.iter().map(Self::domain_policy).collect();
        let mut members = HashMap::new();
        members.insert(
            BUILTIN_ADMIN_ROLE.to_string(),
            vec![session.domain_user_id().to_string()],
        );

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
                clients = ids.len(),
                error = %e,
                rollback_ok = rollback.is_ok(),
                "Client role provisioning failed, rolling back"
            );
            return Err(ServiceError::rolled_back(e, rollback));
        }

        Ok(saved)
    }

    async fn view_client(&self, _session: &Session, id: &str) -> Result<Client, ServiceError> {
        self.repo.retrieve_by_id(id).await
    }

    async fn list_clients(
        &self,
        session: &Session,
        page: PageMeta,
    ) -> Result<ClientsPage, ServiceError> {
        if session.is_super_admin() {
            return self.repo.retrieve_all(session.domain_id(), None, &page).await;
        }

        let ids = self.roles.member_entities(session.domain_user_id()).await?;
        self.repo
            .retrieve_all(session.domain_id(), Some(&ids), &page)
            .await
    }

    async fn update_client(
        &self,
        session: &Session,
        id: &str,
        update: UpdateClient,
    ) -> Result<Client, ServiceError> {
        update.validate()?;
        let mut client = self.repo.retrieve_by_id(id).await?;
        if let Some(name) = update.name {
            client.name = name;
        }
        if let Some(metadata) = update.metadata {
            client.metadata = metadata;
        }
        self.save_update(session, client).await
    }

    async fn update_client_tags(
        &self,
        session: &Session,
        id: &str,
        tags: Vec<String>,
    ) -> Result<Client, ServiceError> {
        let mut client = self.repo.retrieve_by_id(id).await?;
        client.tags = tags;
        self.save_update(session, client).await
    }

    async fn update_client_secret(
        &self,
        session: &Session,
        id: &str,
        secret: Option<String>,
    ) -> Result<Client, ServiceError> {
        let secret = match secret {
            Some(s) if s.len() < 8 => {
                return Err(ServiceError::Validation(
                    "Client secret must be at least 8 characters".to_string(),
                ))
            }
            Some(s) => s,
            None => generate_secret(),
        };

        let mut client = self.repo.retrieve_by_id(id).await?;
        client.secret = secret;
        self.save_update(session, client).await
    }

    async fn enable_client(&self, session: &Session, id: &str) -> Result<Client, ServiceError> {
        self.change_status(session, id, ClientStatus::Enabled).await
    }

    async fn disable_client(&self, session: &Session, id: &str) -> Result<Client, ServiceError> {
        self.change_status(session, id, ClientStatus::Disabled).await
    }

    async fn delete_client(&self, _session: &Session, id: &str) -> Result<(), ServiceError> {
        let client = self.repo.retrieve_by_id(id).await?;

        let mut policies = vec![Self::domain_policy(&client)];
        if let Some(parent) = &client.parent_group {
            policies.push(Self::parent_policy(&client, parent));
        }
        self.policy
            .delete_policies(&policies)
            .await
            .map_err(ServiceError::Policy)?;

        let ids = vec![client.id];
        self.roles.remove_entities_roles(&ids).await?;
        self.repo.delete(&ids).await
    }

    async fn set_parent_group(
        &self,
        session: &Session,
        parent_group_id: &str,
        id: &str,
    ) -> Result<(), ServiceError> {
        let mut client = self.repo.retrieve_by_id(id).await?;
        match client.parent_group.as_deref() {
            Some(current) if current == parent_group_id => return Ok(()),
            Some(current) => {
                return Err(ServiceError::Conflict(format!(
                    "client {} already has parent group {}",
                    id, current
                )))
            }
            None => {}
        }

        let policy = Self::parent_policy(&client, parent_group_id);
        self.policy
            .add_policies(std::slice::from_ref(&policy))
            .await
            .map_err(ServiceError::Policy)?;

        client.parent_group = Some(parent_group_id.to_string());
        if let Err(e) = self.save_update(session, client).await {
            let rollback = self
                .policy
                .delete_policies(&[policy])
                .await
                .map_err(ServiceError::Policy);
            if let Err(rollback) = rollback {
                return Err(ServiceError::RollbackFailed {
                    source: Box::new(e),
                    rollback: Box::new(rollback),
                });
            }
            return Err(e);
        }
        Ok(())
    }

    async fn remove_parent_group(&self, session: &Session, id: &str) -> Result<(), ServiceError> {
        let mut client = self.repo.retrieve_by_id(id).await?;
        let Some(parent) = client.parent_group.take() else {
            return Ok(());
        };

        self.policy
            .delete_policies(&[Self::parent_policy(&client, &parent)])
            .await
            .map_err(ServiceError::Policy)?;
        self.save_update(session, client).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_secret_is_alphanumeric() {
        let secret = generate_secret();
        assert_eq!(secret.len(), SECRET_LENGTH);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(secret, generate_secret());
    }

    #[test]
    fn test_build_client_scopes_to_session_domain() {
        let session = Session::scoped_to("u1", "d1");
        let client = ClientsService::build_client(
            &session,
            NewClient {
                name: "sensor".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(client.domain_id, "d1");
        assert_eq!(client.created_by, "u1");
        assert_eq!(client.status, ClientStatus::Enabled);
        assert!(!client.id.is_empty());
        assert_eq!(client.secret.len(), SECRET_LENGTH);
    }
}
