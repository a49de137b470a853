// TestDependencies - mock implementations for testing
//
// Provides a scripted scraper and a fault-injecting store that can be
// injected into ServerDeps for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::store::{MemoryStore, StoreError, StoreResult};
use super::{BaseScrapeStore, BaseScraper, ServerDeps, StreamHub};
use crate::common::{ScrapeJobId, WebsiteId};
use crate::config::ScrapeSettings;
use crate::domains::scraping::error::SiteScrapeError;
use crate::domains::scraping::models::{
    JobPatch, JobStatus, ResultPatch, ResultStatus, ScrapeJob, ScrapeOutcome, ScrapeResult,
};
use crate::domains::websites::models::{NewWebsite, Website};

// =============================================================================
// Mock Scraper
// =============================================================================

/// Scraper with canned per-URL outcomes.
///
/// URLs without a scripted outcome succeed with the title "Mock Page".
#[derive(Clone, Default)]
pub struct MockScraper {
    outcomes: Arc<Mutex<HashMap<String, Result<ScrapeOutcome, SiteScrapeError>>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockScraper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed for `url` with the given title
    pub fn with_outcome(self, url: &str, title: &str) -> Self {
        let outcome = ScrapeOutcome::builder()
            .url(url)
            .title(title)
            .snippet(format!("Snippet for {}", title))
            .build();
        self.outcomes
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(outcome));
        self
    }

    /// Fail for `url` with the given error
    pub fn with_failure(self, url: &str, error: SiteScrapeError) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(error));
        self
    }

    /// Sleep before answering for `url` (tokio time, so paused clocks apply)
    pub fn with_delay(self, url: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(url.to_string(), delay);
        self
    }

    /// All URLs scraped, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn was_scraped(&self, url: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|u| u == url)
    }
}

#[async_trait]
impl BaseScraper for MockScraper {
    async fn scrape(&self, website: &Website) -> Result<ScrapeOutcome, SiteScrapeError> {
        self.calls.lock().unwrap().push(website.url.clone());

        let delay = self.delays.lock().unwrap().get(&website.url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.outcomes.lock().unwrap().get(&website.url).cloned();
        scripted.unwrap_or_else(|| {
            Ok(ScrapeOutcome::builder()
                .url(website.url.clone())
                .title("Mock Page")
                .build())
        })
    }
}

// =============================================================================
// Faulty Store
// =============================================================================

/// A store operation that [`FaultyStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListWebsites,
    FindWebsites,
    InsertJob,
    FindJob,
    RecentJobs,
    /// Job transition towards the given status
    TransitionJob(JobStatus),
    InsertResults,
    ResultsForJob,
    /// Result transition towards the given status
    TransitionResult(ResultStatus),
    Ping,
}

/// Wraps a [`MemoryStore`] and fails the selected operations.
pub struct FaultyStore {
    inner: Arc<MemoryStore>,
    failing: Mutex<HashSet<StoreOp>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn failing(self, op: StoreOp) -> Self {
        self.failing.lock().unwrap().insert(op);
        self
    }

    pub fn heal(&self, op: StoreOp) {
        self.failing.lock().unwrap().remove(&op);
    }

    fn check(&self, op: StoreOp) -> StoreResult<()> {
        if self.failing.lock().unwrap().contains(&op) {
            return Err(StoreError::Unavailable(format!("injected failure: {:?}", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl BaseScrapeStore for FaultyStore {
    async fn list_websites(&self) -> StoreResult<Vec<Website>> {
        self.check(StoreOp::ListWebsites)?;
        self.inner.list_websites().await
    }

    async fn find_websites(&self, ids: &[WebsiteId]) -> StoreResult<Vec<Website>> {
        self.check(StoreOp::FindWebsites)?;
        self.inner.find_websites(ids).await
    }

    async fn find_website_by_url(&self, url: &str) -> StoreResult<Option<Website>> {
        self.inner.find_website_by_url(url).await
    }

    async fn insert_website(&self, website: NewWebsite) -> StoreResult<Website> {
        self.inner.insert_website(website).await
    }

    async fn insert_job(&self, job: &ScrapeJob) -> StoreResult<ScrapeJob> {
        self.check(StoreOp::InsertJob)?;
        self.inner.insert_job(job).await
    }

    async fn find_job(&self, id: ScrapeJobId) -> StoreResult<Option<ScrapeJob>> {
        self.check(StoreOp::FindJob)?;
        self.inner.find_job(id).await
    }

    async fn recent_jobs(&self, limit: usize) -> StoreResult<Vec<ScrapeJob>> {
        self.check(StoreOp::RecentJobs)?;
        self.inner.recent_jobs(limit).await
    }

    async fn jobs_with_status(&self, status: JobStatus) -> StoreResult<Vec<ScrapeJob>> {
        self.inner.jobs_with_status(status).await
    }

    async fn transition_job(
        &self,
        id: ScrapeJobId,
        from: JobStatus,
        patch: &JobPatch,
    ) -> StoreResult<Option<ScrapeJob>> {
        self.check(StoreOp::TransitionJob(patch.status))?;
        self.inner.transition_job(id, from, patch).await
    }

    async fn insert_results(&self, rows: &[ScrapeResult]) -> StoreResult<Vec<ScrapeResult>> {
        self.check(StoreOp::InsertResults)?;
        self.inner.insert_results(rows).await
    }

    async fn results_for_job(&self, job_id: ScrapeJobId) -> StoreResult<Vec<ScrapeResult>> {
        self.check(StoreOp::ResultsForJob)?;
        self.inner.results_for_job(job_id).await
    }

    async fn transition_result(
        &self,
        job_id: ScrapeJobId,
        website_id: WebsiteId,
        from: ResultStatus,
        patch: &ResultPatch,
    ) -> StoreResult<Option<ScrapeResult>> {
        self.check(StoreOp::TransitionResult(patch.status))?;
        self.inner
            .transition_result(job_id, website_id, from, patch)
            .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check(StoreOp::Ping)?;
        self.inner.ping().await
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub store: Arc<dyn BaseScrapeStore>,
    pub scraper: Arc<MockScraper>,
    pub stream_hub: StreamHub,
    pub settings: ScrapeSettings,
}

impl TestDependencies {
    /// Default mock scraper and short timeouts around `store`
    pub fn new(store: Arc<dyn BaseScrapeStore>) -> Self {
        Self {
            store,
            scraper: Arc::new(MockScraper::new()),
            stream_hub: StreamHub::new(),
            settings: ScrapeSettings {
                scrape_timeout: Duration::from_secs(2),
                max_concurrent_scrapes: 5,
                poll_interval: Duration::from_millis(50),
            },
        }
    }

    /// Set a mock scraper
    pub fn mock_scraper(mut self, scraper: MockScraper) -> Self {
        self.scraper = Arc::new(scraper);
        self
    }

    pub fn settings(mut self, settings: ScrapeSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn into_server_deps(self) -> ServerDeps {
        ServerDeps::new(self.store, self.scraper, self.stream_hub, self.settings)
    }
}
