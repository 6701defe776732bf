use async_trait::async_trait;
use authz_core::models::{Direction, Order, PageMeta};
use authz_core::ServiceError;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::models::{Channel, ChannelsPage, Connection};

#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn save(&self, channels: &[Channel]) -> Result<Vec<Channel>, ServiceError>;
    async fn retrieve_by_id(&self, id: &str) -> Result<Channel, ServiceError>;
    /// Channels of `domain_id`, restricted to `ids` when given.
    async fn retrieve_all(
        &self,
        domain_id: &str,
        ids: Option<&[String]>,
        page: &PageMeta,
    ) -> Result<ChannelsPage, ServiceError>;
    async fn update(&self, channel: Channel) -> Result<Channel, ServiceError>;
    async fn delete(&self, ids: &[String]) -> Result<(), ServiceError>;

    async fn add_connections(&self, conns: &[Connection]) -> Result<(), ServiceError>;
    async fn remove_connections(&self, conns: &[Connection]) -> Result<(), ServiceError>;
    async fn check_connection(&self, conn: &Connection) -> Result<bool, ServiceError>;
    async fn channel_connections(&self, channel_id: &str) -> Result<Vec<Connection>, ServiceError>;
}

#[derive(Default)]
pub struct InMemoryChannelRepository {
    channels: DashMap<String, (u64, Channel)>,
    connections: DashSet<Connection>,
    seq: AtomicU64,
    fail_deletes: AtomicBool,
    fail_connections: AtomicBool,
}

impl InMemoryChannelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `add_connections` fail.
    pub fn fail_connections(&self, fail: bool) {
        self.fail_connections.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.channels.contains_key(id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[async_trait]
impl ChannelRepository for InMemoryChannelRepository {
    async fn save(&self, channels: &[Channel]) -> Result<Vec<Channel>, ServiceError> {
        if let Some(dup) = channels.iter().find(|c| self.channels.contains_key(&c.id)) {
            return Err(ServiceError::Conflict(format!("channel {} already exists", dup.id)));
        }
        if let Some(route) = channels.iter().filter_map(|c| c.route.as_deref()).find(|route| {
            self.channels
                .iter()
                .any(|entry| entry.1.route.as_deref() == Some(*route))
        }) {
            return Err(ServiceError::Conflict(format!("route {} already in use", route)));
        }

        for channel in channels {
            let seq = self.seq.fetch_add(1, Ordering::SeqCst);
            self.channels
                .insert(channel.id.clone(), (seq, channel.clone()));
        }
        Ok(channels.to_vec())
    }

    async fn retrieve_by_id(&self, id: &str) -> Result<Channel, ServiceError> {
        self.channels
            .get(id)
            .map(|entry| entry.1.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("channel {}", id)))
    }

    async fn retrieve_all(
        &self,
        domain_id: &str,
        ids: Option<&[String]>,
        page: &PageMeta,
    ) -> Result<ChannelsPage, ServiceError> {
        let mut matched: Vec<(u64, Channel)> = self
            .channels
            .iter()
            .filter(|entry| domain_id.is_empty() || entry.1.domain_id == domain_id)
            .filter(|entry| ids.map_or(true, |ids| ids.contains(&entry.1.id)))
            .map(|entry| entry.value().clone())
            .collect();

        match page.order {
            Some(Order::Name) => matched.sort_by(|a, b| a.1.name.cmp(&b.1.name)),
            Some(Order::CreatedAt) => matched.sort_by_key(|(_, c)| c.created_at),
            None => matched.sort_by_key(|(seq, _)| *seq),
        }
        if page.order.is_some() && page.dir == Direction::Desc {
            matched.reverse();
        }

        let channels: Vec<Channel> = matched.into_iter().map(|(_, c)| c).collect();
        let (total, channels) = page.paginate(&channels);
        Ok(ChannelsPage {
            total,
            offset: page.offset,
            limit: page.limit,
            channels,
        })
    }

    async fn update(&self, channel: Channel) -> Result<Channel, ServiceError> {
        let mut entry = self
            .channels
            .get_mut(&channel.id)
            .ok_or_else(|| ServiceError::NotFound(format!("channel {}", channel.id)))?;
        entry.1 = channel.clone();
        Ok(channel)
    }

    async fn delete(&self, ids: &[String]) -> Result<(), ServiceError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ServiceError::Repository(anyhow::anyhow!(
                "failed to delete channels"
            )));
        }
        for id in ids {
            self.channels.remove(id);
            self.connections.retain(|conn| &conn.channel_id != id);
        }
        Ok(())
    }

    async fn add_connections(&self, conns: &[Connection]) -> Result<(), ServiceError> {
        if self.fail_connections.load(Ordering::SeqCst) {
            return Err(ServiceError::Repository(anyhow::anyhow!(
                "failed to save connections"
            )));
        }
        for conn in conns {
            self.connections.insert(conn.clone());
        }
        Ok(())
    }

    async fn remove_connections(&self, conns: &[Connection]) -> Result<(), ServiceError> {
        for conn in conns {
            self.connections.remove(conn);
        }
        Ok(())
    }

    async fn check_connection(&self, conn: &Connection) -> Result<bool, ServiceError> {
        Ok(self.connections.contains(conn))
    }

    async fn channel_connections(&self, channel_id: &str) -> Result<Vec<Connection>, ServiceError> {
        Ok(self
            .connections
            .iter()
            .filter(|conn| conn.channel_id == channel_id)
            .map(|conn| conn.key().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelStatus, ConnectionType};
    use chrono::Utc;

    fn channel(id: &str, name: &str, domain: &str) -> Channel {
        Channel {
            id: id.to_string(),
            name: name.to_string(),
            domain_id: domain.to_string(),
            tags: vec![],
            parent_group: None,
            route: None,
            metadata: serde_json::Value::Null,
            status: ChannelStatus::Enabled,
            created_by: "u1".to_string(),
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_retrieve_all_filters_domain_and_ids() {
        let repo = InMemoryChannelRepository::new();
        repo.save(&[
            channel("ch1", "b", "d1"),
            channel("ch2", "a", "d1"),
            channel("ch3", "c", "d2"),
        ])
        .await
        .unwrap();

        let page = repo.retrieve_all("d1", None, &PageMeta::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.channels[0].id, "ch1");

        let ids = vec!["ch2".to_string(), "ch3".to_string()];
        let page = repo
            .retrieve_all("d1", Some(&ids), &PageMeta::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.channels[0].id, "ch2");
    }

    #[tokio::test]
    async fn test_retrieve_all_orders_by_name() {
        let repo = InMemoryChannelRepository::new();
        repo.save(&[channel("ch1", "b", "d1"), channel("ch2", "a", "d1")])
            .await
            .unwrap();

        let page = PageMeta::default().ordered_by(Order::Name, Direction::Desc);
        let page = repo.retrieve_all("d1", None, &page).await.unwrap();
        let names: Vec<&str> = page.channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_duplicate_route_conflicts() {
        let repo = InMemoryChannelRepository::new();
        let mut first = channel("ch1", "a", "d1");
        first.route = Some("temp".to_string());
        repo.save(&[first]).await.unwrap();

        let mut second = channel("ch2", "b", "d1");
        second.route = Some("temp".to_string());
        let err = repo.save(&[second]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_drops_connections() {
        let repo = InMemoryChannelRepository::new();
        repo.save(&[channel("ch1", "a", "d1")]).await.unwrap();
        let conn = Connection {
            client_id: "c1".to_string(),
            channel_id: "ch1".to_string(),
            domain_id: "d1".to_string(),
            conn_type: ConnectionType::Publish,
        };
        repo.add_connections(std::slice::from_ref(&conn)).await.unwrap();
        assert!(repo.check_connection(&conn).await.unwrap());

        repo.delete(&["ch1".to_string()]).await.unwrap();
        assert!(!repo.check_connection(&conn).await.unwrap());
    }
}
