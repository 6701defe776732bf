mod client;

pub use client::{Client, ClientStatus, ClientsPage, NewClient, UpdateClient};
