//! Websites domain - the reference list of sites a job can scrape

pub mod actions;
pub mod models;

pub use actions::{seed_websites, SeedEntry, SeedReport};
pub use models::{display_name_from_url, NewWebsite, Website};
