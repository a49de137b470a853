// Scrape Dashboard - API Core
//
// This crate provides the backend for the scrape dashboard: batch scrape jobs over
// a set of websites, per-site execution, and progress aggregation for polling clients.
// Architecture follows domain-driven design with dependencies passed explicitly
// through `ServerDeps`.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
