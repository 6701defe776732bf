use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Enabled,
    Disabled,
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientStatus::Enabled => write!(f, "enabled"),
            ClientStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// A device or application identity inside a domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub domain_id: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing)]
    pub secret: String,
    pub parent_group: Option<String>,
    pub metadata: serde_json::Value,
    pub status: ClientStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewClient {
    /// Caller-chosen id; a UUID is generated when absent.
    #[validate(length(min = 1, max = 36, message = "Client id must be 1-36 characters"))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 1024, message = "Client name must be 1-1024 characters"))]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(length(min = 8, message = "Client secret must be at least 8 characters"))]
    pub secret: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateClient {
    #[validate(length(min = 1, max = 1024, message = "Client name must be 1-1024 characters"))]
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientsPage {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub clients: Vec<Client>,
}
