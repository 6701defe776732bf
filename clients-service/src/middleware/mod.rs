mod authorization;
mod logging;

pub use authorization::ClientsAuthorization;
