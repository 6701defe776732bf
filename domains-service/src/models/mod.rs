mod domain;

pub use domain::{Domain, DomainStatus, DomainsPage, NewDomain, UpdateDomain};
