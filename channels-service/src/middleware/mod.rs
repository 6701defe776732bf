mod authorization;
mod logging;

pub use authorization::ChannelsAuthorization;
