//! Server dependencies (using traits for testability)
//!
//! The single handle threaded through job actions, the poller and the HTTP
//! layer. Nothing reaches for a global store client.

use std::sync::Arc;

use crate::config::ScrapeSettings;
use crate::kernel::{stream_hub::StreamHub, BaseScrapeStore, BaseScraper};

#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseScrapeStore>,
    /// Per-site task executor
    pub scraper: Arc<dyn BaseScraper>,
    /// In-process pub/sub hub for live progress
    pub stream_hub: StreamHub,
    pub settings: ScrapeSettings,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn BaseScrapeStore>,
        scraper: Arc<dyn BaseScraper>,
        stream_hub: StreamHub,
        settings: ScrapeSettings,
    ) -> Self {
        Self {
            store,
            scraper,
            stream_hub,
            settings,
        }
    }
}
