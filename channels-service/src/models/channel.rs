use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Enabled,
    Disabled,
}

impl std::fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelStatus::Enabled => write!(f, "enabled"),
            ChannelStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// A message topic clients publish to or subscribe on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub domain_id: String,
    pub tags: Vec<String>,
    pub parent_group: Option<String>,
    pub route: Option<String>,
    pub metadata: serde_json::Value,
    pub status: ChannelStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewChannel {
    #[validate(length(min = 1, max = 36, message = "Channel id must be 1-36 characters"))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 1024, message = "Channel name must be 1-1024 characters"))]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(length(min = 1, max = 64, message = "Channel route must be 1-64 characters"))]
    pub route: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateChannel {
    #[validate(length(min = 1, max = 1024, message = "Channel name must be 1-1024 characters"))]
    pub name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelsPage {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub channels: Vec<Channel>,
}
