mod domains;
mod repository;

pub use domains::{DomainService, DomainsService};
pub use repository::{DomainRepository, InMemoryDomainRepository};
