mod channel;
mod connection;

pub use channel::{Channel, ChannelStatus, ChannelsPage, NewChannel, UpdateChannel};
pub use connection::{Connection, ConnectionType};
