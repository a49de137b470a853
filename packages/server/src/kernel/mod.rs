//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod simple_scraper;
pub mod store;
pub mod stream_hub;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use simple_scraper::SimpleScraper;
pub use store::{MemoryStore, PostgresStore, RestStore, StoreError, StoreResult};
pub use stream_hub::StreamHub;
pub use test_dependencies::{FaultyStore, MockScraper, StoreOp, TestDependencies};
pub use traits::*;
