use serde::{Deserialize, Serialize};

/// Direction of message flow a connection allows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Publish,
    Subscribe,
}

impl ConnectionType {
    /// Relation written between the client and the channel.
    pub fn relation(&self) -> &'static str {
        match self {
            ConnectionType::Publish => "publish",
            ConnectionType::Subscribe => "subscribe",
        }
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.relation())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Connection {
    pub client_id: String,
    pub channel_id: String,
    pub domain_id: String,
    pub conn_type: ConnectionType,
}
