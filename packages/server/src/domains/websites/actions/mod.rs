mod seed;

pub use seed::{seed_websites, SeedEntry, SeedReport};
