mod channels;
mod repository;

pub use channels::{ChannelService, ChannelsService};
pub use repository::{ChannelRepository, InMemoryChannelRepository};
