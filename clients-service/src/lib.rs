pub mod config;
pub mod middleware;
pub mod models;
pub mod operations;
pub mod services;
pub mod startup;

pub use startup::Application;
