use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    Enabled,
    Disabled,
    /// Locked by a platform administrator. Only they can lift it.
    Frozen,
}

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainStatus::Enabled => write!(f, "enabled"),
            DomainStatus::Disabled => write!(f, "disabled"),
            DomainStatus::Frozen => write!(f, "frozen"),
        }
    }
}

/// A tenant. Every client, channel and group lives in exactly one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Domain {
    pub id: String,
    pub name: String,
    pub route: String,
    pub tags: Vec<String>,
    pub metadata: serde_json::Value,
    pub status: DomainStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewDomain {
    #[validate(length(min = 1, max = 36, message = "Domain id must be 1-36 characters"))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 1024, message = "Domain name must be 1-1024 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 64, message = "Domain route must be 1-64 characters"))]
    pub route: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDomain {
    #[validate(length(min = 1, max = 1024, message = "Domain name must be 1-1024 characters"))]
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainsPage {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub domains: Vec<Domain>,
}
