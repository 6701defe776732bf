mod clients;
mod repository;

pub use clients::{ClientService, ClientsService};
pub use repository::{ClientRepository, InMemoryClientRepository};
