//! Test harness around the in-memory record store.
//!
//! Each test gets its own store, mock scraper and `ServerDeps`.

use std::sync::Arc;
use std::time::Duration;

use scrape_core::common::ScrapeJobId;
use scrape_core::domains::scraping::ScrapeJob;
use scrape_core::domains::websites::Website;
use scrape_core::kernel::{
    BaseScrapeStore, FaultyStore, MemoryStore, MockScraper, ServerDeps, TestDependencies,
};
use scrape_core::ScrapeSettings;

pub struct TestHarness {
    /// Backing rows; bypasses any injected faults
    pub memory: Arc<MemoryStore>,
    pub deps: ServerDeps,
    pub scraper: Arc<MockScraper>,
    /// Seeded websites, ordered by name
    pub websites: Vec<Website>,
}

fn init_tracing() {
    // Run tests with: RUST_LOG=debug cargo test -- --nocapture
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl TestHarness {
    /// Memory store seeded with `sites` as `(name, url)` pairs.
    pub async fn new(sites: &[(&str, &str)], scraper: MockScraper) -> Self {
        Self::build(sites, scraper, None, |memory| memory as Arc<dyn BaseScrapeStore>).await
    }

    /// Same as [`TestHarness::new`] with the given settings.
    pub async fn with_settings(
        sites: &[(&str, &str)],
        scraper: MockScraper,
        settings: ScrapeSettings,
    ) -> Self {
        Self::build(sites, scraper, Some(settings), |memory| memory as Arc<dyn BaseScrapeStore>).await
    }

    /// Store wrapped in a [`FaultyStore`] configured by `faults`.
    pub async fn with_faults(
        sites: &[(&str, &str)],
        scraper: MockScraper,
        faults: impl FnOnce(FaultyStore) -> FaultyStore,
    ) -> Self {
        Self::build(sites, scraper, None, |memory| {
            Arc::new(faults(FaultyStore::new(memory))) as Arc<dyn BaseScrapeStore>
        })
        .await
    }

    async fn build(
        sites: &[(&str, &str)],
        scraper: MockScraper,
        settings: Option<ScrapeSettings>,
        wrap: impl FnOnce(Arc<MemoryStore>) -> Arc<dyn BaseScrapeStore>,
    ) -> Self {
        init_tracing();

        let memory = Arc::new(MemoryStore::with_websites(sites.iter().copied()));
        let websites = memory.list_websites().await.expect("list websites");
        let store = wrap(memory.clone());

        let mut test_deps = TestDependencies::new(store).mock_scraper(scraper);
        if let Some(settings) = settings {
            test_deps = test_deps.settings(settings);
        }
        let scraper = test_deps.scraper.clone();

        Self {
            memory,
            deps: test_deps.into_server_deps(),
            scraper,
            websites,
        }
    }

    pub fn website(&self, name: &str) -> &Website {
        self.websites
            .iter()
            .find(|w| w.name == name)
            .unwrap_or_else(|| panic!("no seeded website named {}", name))
    }

    /// Wait (tokio time) until the job reaches a terminal status.
    pub async fn wait_for_terminal(&self, job_id: ScrapeJobId) -> ScrapeJob {
        for _ in 0..500 {
            let job = self
                .memory
                .find_job(job_id)
                .await
                .expect("find job")
                .expect("job exists");
            if job.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish", job_id);
    }
}
